//! Shared fixtures for integration tests

use chrono::{TimeZone, Utc};
use tessera::classify::{resolve_functions, LexicalClassifier};
use tessera::{Fragment, Grade, NarrativeFunction, ResearchPipeline, ResearchResult};

pub fn grade(overall: u8, necessity: f64, function: NarrativeFunction, inflection: u8) -> Grade {
    Grade {
        overall,
        necessity,
        function,
        inflection,
    }
}

/// A small story corpus with three vocabulary clusters and a full
/// setup→development→payoff grade progression.
///
/// - g1..g3: spring garden material (setup, graded 4, key passages)
/// - m1..m2: summer letters (characterization, graded 3)
/// - h1..h2: orchard harvest (payoff, graded 5, key passages)
pub fn story_corpus() -> Vec<Fragment> {
    let at = |day| Utc.with_ymd_and_hms(2023, 4, day, 12, 0, 0).unwrap();
    vec![
        Fragment::new(
            "g1",
            "In spring the garden was planted with seedling rows beside the cold frame.",
        )
        .with_created_at(at(1))
        .with_grade(grade(4, 0.8, NarrativeFunction::Setup, 2)),
        Fragment::new(
            "g2",
            "The garden seedling beds needed water every spring morning.",
        )
        .with_created_at(at(2))
        .with_grade(grade(4, 0.8, NarrativeFunction::Setup, 2)),
        Fragment::new(
            "g3",
            "A garden seedling catalogue arrived, promising spring colour.",
        )
        .with_created_at(at(3))
        .with_grade(grade(4, 0.7, NarrativeFunction::Setup, 1)),
        Fragment::new(
            "m1",
            "Meanwhile the letters arrived weekly through the summer heat.",
        )
        .with_created_at(at(10))
        .with_grade(grade(3, 0.4, NarrativeFunction::Characterization, 1)),
        Fragment::new(
            "m2",
            "Letters in summer told of slow progress and small doubts.",
        )
        .with_created_at(at(12))
        .with_grade(grade(3, 0.4, NarrativeFunction::Characterization, 1)),
        Fragment::new(
            "h1",
            "At last the harvest filled the orchard baskets with ripe apples.",
        )
        .with_created_at(at(20))
        .with_grade(grade(5, 0.9, NarrativeFunction::Payoff, 4)),
        Fragment::new(
            "h2",
            "The orchard harvest was finally weighed, baskets of apples stacked high.",
        )
        .with_created_at(at(21))
        .with_grade(grade(5, 0.9, NarrativeFunction::Payoff, 4)),
    ]
}

/// Run research over a corpus with the local classifier fallback
pub async fn run_research(fragments: &[Fragment]) -> ResearchResult {
    let resolved = resolve_functions(&LexicalClassifier::new(), fragments).await;
    ResearchPipeline::new()
        .research(fragments, &[], &resolved)
        .expect("research should succeed")
}
