//! End-to-end research over a realistic corpus: themes, arcs, mappings,
//! coverage, and suggested sections all derived in one pass.

mod common;

use common::{run_research, story_corpus};
use tessera::classify::{resolve_functions, LexicalClassifier};
use tessera::research::GapSeverity;
use tessera::{Fragment, NarrativeFunction, ResearchPipeline};

#[tokio::test]
async fn test_themes_follow_vocabulary_clusters() {
    let fragments = story_corpus();
    let research = run_research(&fragments).await;

    // three vocabulary clusters, three themes
    assert_eq!(research.themes.len(), 3);
    for theme in &research.themes {
        assert!(theme.fragment_ids.len() >= 2);
        assert!(theme.strength > 0.0 && theme.strength <= 1.0);
        assert!(!theme.keywords.is_empty());
    }

    // strongest first: the garden cluster has three supporters
    let garden = &research.themes[0];
    assert!(garden.keywords.contains(&"garden".to_string()));
    assert_eq!(garden.fragment_ids.len(), 3);
    assert!((garden.strength - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn test_theme_dominant_functions_come_from_grades() {
    let fragments = story_corpus();
    let research = run_research(&fragments).await;

    let theme_of = |id: &str| {
        research
            .themes
            .iter()
            .find(|t| t.fragment_ids.contains(&id.into()))
            .expect("fragment should belong to a theme")
    };
    assert_eq!(theme_of("g1").dominant_function, Some(NarrativeFunction::Setup));
    assert_eq!(theme_of("h1").dominant_function, Some(NarrativeFunction::Payoff));
    assert!(theme_of("g1").is_setup_flavored());
    assert!(theme_of("h1").is_payoff_flavored());
}

#[tokio::test]
async fn test_main_arc_detected_with_all_three_phases() {
    let fragments = story_corpus();
    let research = run_research(&fragments).await;

    let arc = research.main_arc().expect("graded corpus should have an arc");
    assert_eq!(arc.phases.len(), 3);
    // setup 3/3, development 2/5, resolution 2/2
    assert!((arc.phases[0].strength - 1.0).abs() < 1e-9);
    assert!((arc.phases[1].strength - 0.4).abs() < 1e-9);
    assert!((arc.phases[2].strength - 1.0).abs() < 1e-9);
    assert!((arc.completeness - 0.6).abs() < 1e-9);
    assert_eq!(arc.fragment_ids.len(), 7);
}

#[tokio::test]
async fn test_mappings_cover_every_fragment() {
    let fragments = story_corpus();
    let research = run_research(&fragments).await;

    assert_eq!(research.mappings.len(), fragments.len());
    for fragment in &fragments {
        let mapping = &research.mappings[&fragment.id];
        assert!(!mapping.theme_ids.is_empty(), "{} unmapped", fragment.id);
        assert!(mapping.position.is_some(), "{} is dated", fragment.id);
        for relevance in mapping.relevance.values() {
            assert!(*relevance > 0.2);
        }
    }

    // graded 4+ fragments are key passages, the middle grade-3 ones are not
    assert!(research.is_key_passage(&"g1".into()));
    assert!(research.is_key_passage(&"h2".into()));
    assert!(!research.is_key_passage(&"m1".into()));
}

#[tokio::test]
async fn test_coverage_notes_key_passage_strength() {
    let fragments = story_corpus();
    let research = run_research(&fragments).await;

    // five key passages is worth a strength note
    assert!(!research.strengths.is_empty());
    // no orphans and no missing phases, so nothing major
    assert!(research.gaps.iter().all(|g| g.severity != GapSeverity::Major));
}

#[tokio::test]
async fn test_sections_follow_the_arc() {
    let fragments = story_corpus();
    let research = run_research(&fragments).await;

    let titles: Vec<&str> = research
        .suggested_sections
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Introduction", "Development", "Conclusion"]);
    for (index, section) in research.suggested_sections.iter().enumerate() {
        assert_eq!(section.order, index);
        assert!(section.estimated_words > 0);
        assert!(!section.theme_ids.is_empty());
    }

    assert!(research.confidence > 0.4 && research.confidence <= 1.0);
}

#[tokio::test]
async fn test_research_is_reproducible() {
    let fragments = story_corpus();
    let a = run_research(&fragments).await;
    let b = run_research(&fragments).await;
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[tokio::test]
async fn test_blank_fragments_are_rejected_not_fatal() {
    let mut fragments = story_corpus();
    fragments.push(Fragment::new("blank", "   "));

    let resolved = resolve_functions(&LexicalClassifier::new(), &fragments).await;
    let research = ResearchPipeline::new()
        .research(&fragments, &[], &resolved)
        .unwrap();

    assert_eq!(research.fragment_count, 7);
    assert_eq!(research.rejections.len(), 1);
    assert_eq!(research.rejections[0].fragment_id, "blank".into());
}
