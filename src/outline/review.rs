//! Outline review
//!
//! Scores a user-proposed outline against the research output: which
//! fragments back each item, how well each item is covered, and whether the
//! outline as a whole looks draftable from the harvested material.

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::fragment::{Fragment, FragmentId};
use crate::outline::types::{
    walk_items, CoverageLevel, OutlineItemReview, OutlineReview, OutlineStructure,
};
use crate::research::{ResearchResult, Theme, ThemeId};
use crate::text;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Bonus for a fragment belonging to an item-relevant theme
const THEME_BONUS: f64 = 0.2;
/// Weight of title relevance in the match score
const TITLE_WEIGHT: f64 = 0.3;
/// Matches needed (with mean relevance >= 0.5) for strong coverage
const STRONG_MATCHES: usize = 3;
const STRONG_RELEVANCE: f64 = 0.5;
const PARTIAL_RELEVANCE: f64 = 0.3;
/// Theme strength floor for suggested additions
const ADDITION_STRENGTH: f64 = 0.4;
/// Suggested fragments listed per item
const SUGGESTED_PER_ITEM: usize = 3;

/// Reviews proposed outlines against research output
#[derive(Debug, Clone, Default)]
pub struct OutlineReviewer {
    config: PipelineConfig,
}

impl OutlineReviewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Review a proposed outline
    ///
    /// Validates the tree first; a malformed outline is an error. The review
    /// itself is a pure function of its inputs — identical inputs always
    /// produce identical classifications.
    pub fn review(
        &self,
        outline: &OutlineStructure,
        fragments: &[Fragment],
        research: &ResearchResult,
    ) -> PipelineResult<OutlineReview> {
        outline.validate(&self.config)?;

        let items = walk_items(&outline.items);
        let mut reviews = Vec::with_capacity(items.len());
        for (path, item) in items {
            reviews.push(self.review_item(path, &item.text, fragments, research));
        }
        debug!(items = reviews.len(), "outline review scored");

        let overall_coverage = mean(reviews.iter().map(|r| r.coverage.weight()));
        let mean_relevance = mean(reviews.iter().map(|r| r.relevance));
        let feasibility = 0.6 * overall_coverage + 0.4 * mean_relevance;

        let uncovered: Vec<String> = reviews
            .iter()
            .filter(|r| r.coverage == CoverageLevel::None)
            .map(|r| r.text.clone())
            .collect();
        let partially_covered: Vec<String> = reviews
            .iter()
            .filter(|r| matches!(r.coverage, CoverageLevel::Partial | CoverageLevel::Weak))
            .map(|r| r.text.clone())
            .collect();

        let referenced: BTreeSet<ThemeId> = reviews
            .iter()
            .flat_map(|r| r.theme_ids.iter().copied())
            .collect();
        let suggested_additions: Vec<ThemeId> = research
            .themes
            .iter()
            .filter(|t| {
                t.strength >= ADDITION_STRENGTH
                    && t.fragment_ids.len() >= 2
                    && !referenced.contains(&t.id)
            })
            .map(|t| t.id)
            .collect();

        let assignments: BTreeMap<String, Vec<FragmentId>> = reviews
            .iter()
            .filter(|r| !r.fragment_ids.is_empty())
            .map(|r| (r.path.clone(), r.fragment_ids.clone()))
            .collect();

        let covered = reviews.len() - uncovered.len();
        let summary = format!(
            "{} of {} outline items have supporting material; feasibility {:.2}",
            covered,
            reviews.len(),
            feasibility
        );

        Ok(OutlineReview {
            items: reviews,
            overall_coverage,
            feasibility,
            uncovered,
            partially_covered,
            suggested_additions,
            assignments,
            summary,
        })
    }

    /// Score one outline item against every fragment
    fn review_item(
        &self,
        path: String,
        item_text: &str,
        fragments: &[Fragment],
        research: &ResearchResult,
    ) -> OutlineItemReview {
        let item_words =
            text::significant_words(item_text, self.config.outline_keyword_min_len);

        // Themes relevant to this item in their own right
        let relevant_themes: Vec<&Theme> = research
            .themes
            .iter()
            .filter(|t| {
                theme_item_relevance(t, &item_words) > self.config.item_theme_relevance_floor
            })
            .collect();
        let relevant_theme_ids: BTreeSet<ThemeId> =
            relevant_themes.iter().map(|t| t.id).collect();

        let mut matches: Vec<(FragmentId, f64)> = Vec::new();
        for fragment in fragments {
            let score = self.match_score(fragment, &item_words, &relevant_theme_ids, research);
            if score >= self.config.match_score_floor {
                matches.push((fragment.id.clone(), score));
            }
        }
        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let relevance = mean(matches.iter().map(|(_, s)| *s));
        let coverage = if matches.is_empty() {
            CoverageLevel::None
        } else if matches.len() >= STRONG_MATCHES && relevance >= STRONG_RELEVANCE {
            CoverageLevel::Strong
        } else if relevance >= PARTIAL_RELEVANCE {
            CoverageLevel::Partial
        } else {
            CoverageLevel::Weak
        };

        let matched: BTreeSet<&FragmentId> = matches.iter().map(|(id, _)| id).collect();
        // Themes this item actually draws on
        let theme_ids: BTreeSet<ThemeId> = relevant_theme_ids
            .iter()
            .filter(|id| {
                research
                    .theme(id)
                    .map(|t| t.fragment_ids.iter().any(|f| matched.contains(f)))
                    .unwrap_or(false)
            })
            .copied()
            .collect();

        let suggested_fragments: Vec<FragmentId> = relevant_themes
            .iter()
            .flat_map(|t| t.fragment_ids.iter())
            .filter(|id| !matched.contains(*id))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(SUGGESTED_PER_ITEM)
            .collect();

        let note = match coverage {
            CoverageLevel::None => "no supporting fragments found".to_string(),
            _ => format!(
                "{} supporting fragments, mean relevance {:.2}",
                matches.len(),
                relevance
            ),
        };

        OutlineItemReview {
            path,
            text: item_text.to_string(),
            coverage,
            fragment_ids: matches.into_iter().map(|(id, _)| id).collect(),
            relevance,
            theme_ids,
            suggested_fragments,
            note,
        }
    }

    /// Match score between a fragment and an outline item
    ///
    /// Direct keyword overlap, plus a flat bonus when the fragment belongs
    /// to an item-relevant theme, plus weighted title overlap. Clamped so
    /// stacked bonuses cannot exceed 1.
    fn match_score(
        &self,
        fragment: &Fragment,
        item_words: &BTreeSet<String>,
        relevant_theme_ids: &BTreeSet<ThemeId>,
        research: &ResearchResult,
    ) -> f64 {
        if item_words.is_empty() {
            return 0.0;
        }
        let fragment_words =
            text::significant_words(&fragment.text, self.config.outline_keyword_min_len);
        let shared = fragment_words.intersection(item_words).count();
        let mut score = shared as f64 / item_words.len() as f64;

        if let Some(mapping) = research.mappings.get(&fragment.id) {
            if mapping.theme_ids.iter().any(|id| relevant_theme_ids.contains(id)) {
                score += THEME_BONUS;
            }
        }

        if let Some(title) = &fragment.title {
            let title_words =
                text::significant_words(title, self.config.outline_keyword_min_len);
            let title_shared = title_words.intersection(item_words).count();
            score += TITLE_WEIGHT * (title_shared as f64 / item_words.len() as f64);
        }

        score.clamp(0.0, 1.0)
    }
}

/// Relevance of a theme to an outline item's keyword set
fn theme_item_relevance(theme: &Theme, item_words: &BTreeSet<String>) -> f64 {
    if item_words.is_empty() {
        return 0.0;
    }
    let shared = theme
        .keywords
        .iter()
        .filter(|k| item_words.contains(*k))
        .count();
    shared as f64 / item_words.len() as f64
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        0.0
    } else {
        collected.iter().sum::<f64>() / collected.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ResolvedFunctions;
    use crate::outline::types::{OutlineItem, OutlineKind};
    use crate::research::ResearchPipeline;

    fn garden_research(fragments: &[Fragment]) -> ResearchResult {
        ResearchPipeline::new()
            .research(fragments, &[], &ResolvedFunctions::default())
            .unwrap()
    }

    fn garden_fragments() -> Vec<Fragment> {
        vec![
            Fragment::new(
                "f1",
                "garden rose bloom garden rose bloom garden rose bloom",
            ),
            Fragment::new(
                "f2",
                "garden rose bloom garden rose bloom garden rose bloom",
            ),
            Fragment::new("f3", "rocket launch countdown ignition thrust"),
        ]
    }

    #[test]
    fn test_garden_item_is_at_least_partial() {
        let fragments = garden_fragments();
        let research = garden_research(&fragments);
        let outline = OutlineStructure::new(
            OutlineKind::Chapters,
            vec![OutlineItem::new("Garden of roses")],
        );
        let review = OutlineReviewer::new()
            .review(&outline, &fragments, &research)
            .unwrap();

        let item = &review.items[0];
        assert!(
            matches!(item.coverage, CoverageLevel::Partial | CoverageLevel::Strong),
            "got {:?}",
            item.coverage
        );
        assert!(item.fragment_ids.contains(&"f1".into()));
        assert!(item.fragment_ids.contains(&"f2".into()));
        assert!(!item.fragment_ids.contains(&"f3".into()));
    }

    #[test]
    fn test_review_is_idempotent() {
        let fragments = garden_fragments();
        let research = garden_research(&fragments);
        let outline = OutlineStructure::new(
            OutlineKind::Chapters,
            vec![
                OutlineItem::new("Garden of roses"),
                OutlineItem::new("The rocket launch"),
            ],
        );
        let reviewer = OutlineReviewer::new();
        let a = reviewer.review(&outline, &fragments, &research).unwrap();
        let b = reviewer.review(&outline, &fragments, &research).unwrap();
        let coverages = |r: &OutlineReview| -> Vec<CoverageLevel> {
            r.items.iter().map(|i| i.coverage).collect()
        };
        assert_eq!(coverages(&a), coverages(&b));
        assert_eq!(a.feasibility, b.feasibility);
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn test_unrelated_item_is_uncovered() {
        let fragments = garden_fragments();
        let research = garden_research(&fragments);
        let outline = OutlineStructure::new(
            OutlineKind::Chapters,
            vec![OutlineItem::new("Quantum banking regulations")],
        );
        let review = OutlineReviewer::new()
            .review(&outline, &fragments, &research)
            .unwrap();
        assert_eq!(review.items[0].coverage, CoverageLevel::None);
        assert_eq!(review.uncovered, vec!["Quantum banking regulations"]);
        assert_eq!(review.overall_coverage, 0.0);
    }

    #[test]
    fn test_title_bonus_lifts_score() {
        let fragments = vec![
            Fragment::new("titled", "some unrelated body text entirely")
                .with_title("harvest moon festival"),
            Fragment::new("untitled", "some unrelated body text entirely"),
        ];
        let research = garden_research(&fragments);
        let outline = OutlineStructure::new(
            OutlineKind::Sections,
            vec![OutlineItem::new("The harvest moon festival")],
        );
        let review = OutlineReviewer::new()
            .review(&outline, &fragments, &research)
            .unwrap();
        let item = &review.items[0];
        assert!(item.fragment_ids.contains(&"titled".into()));
        assert!(!item.fragment_ids.contains(&"untitled".into()));
    }

    #[test]
    fn test_suggested_additions_for_untouched_strong_theme() {
        let fragments = garden_fragments();
        let research = garden_research(&fragments);
        // garden theme has 2 fragments and strength 0.4 but no item mentions it
        let outline = OutlineStructure::new(
            OutlineKind::Chapters,
            vec![OutlineItem::new("Rocket engineering")],
        );
        let review = OutlineReviewer::new()
            .review(&outline, &fragments, &research)
            .unwrap();
        assert!(!review.suggested_additions.is_empty());
    }

    #[test]
    fn test_malformed_outline_rejected() {
        let fragments = garden_fragments();
        let research = garden_research(&fragments);
        let outline = OutlineStructure::new(OutlineKind::Chapters, vec![]);
        let result = OutlineReviewer::new().review(&outline, &fragments, &research);
        assert!(result.is_err());
    }
}
