//! Outline generation
//!
//! Merges a reviewed user outline (when feasible) with research-suggested
//! sections into one bounded, narratively-ordered outline. Fragments are
//! consumed from a shared pool as sections claim them, so no fragment lands
//! in two sections of the same generation pass.

use crate::abort::AbortHandle;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fragment::{Fragment, FragmentId};
use crate::outline::types::{
    CoverageLevel, GeneratedItem, GeneratedOutline, ItemSource, OutlineItem, OutlineKind,
    OutlineReview, OutlineStructure,
};
use crate::research::{ResearchResult, ThemeId};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Offset that forces setup sections first and payoff sections last,
/// dominating any timestamp difference (epoch seconds are ~1e9).
const FLAVOR_OFFSET: f64 = 1e12;

/// Candidate section accumulated during generation
struct Candidate {
    text: String,
    fragment_ids: Vec<FragmentId>,
    confidence: f64,
    source: ItemSource,
    theme_ids: BTreeSet<ThemeId>,
}

/// Generates outlines by merging proposed and research-suggested sections
#[derive(Debug, Clone, Default)]
pub struct OutlineGenerator {
    config: PipelineConfig,
    abort: Option<AbortHandle>,
}

impl OutlineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an abort handle checked before the overlap pass
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Generate an outline
    ///
    /// Fails explicitly with [`PipelineError::EmptyOutline`] when every
    /// candidate is filtered away; the caller decides whether to retry with
    /// relaxed filtering.
    pub fn generate(
        &self,
        proposed: Option<(&OutlineStructure, &OutlineReview)>,
        research: &ResearchResult,
        fragments: &[Fragment],
    ) -> PipelineResult<GeneratedOutline> {
        let known_ids: BTreeSet<&FragmentId> = fragments.iter().map(|f| &f.id).collect();
        let mut used: BTreeSet<FragmentId> = BTreeSet::new();
        let mut candidates: Vec<Candidate> = Vec::new();

        // Seed from the proposed outline when the review says it is workable
        let mut from_proposed = false;
        if let Some((_, review)) = proposed {
            if review.feasibility >= self.config.feasibility_floor {
                for item in &review.items {
                    if !self.config.keep_proposed && item.coverage == CoverageLevel::None {
                        continue;
                    }
                    for id in &item.fragment_ids {
                        if !known_ids.contains(id) {
                            return Err(PipelineError::UnknownFragment { id: id.clone() });
                        }
                    }
                    let claimed: Vec<FragmentId> = item
                        .fragment_ids
                        .iter()
                        .filter(|id| !used.contains(*id))
                        .cloned()
                        .collect();
                    used.extend(claimed.iter().cloned());
                    candidates.push(Candidate {
                        text: item.text.clone(),
                        fragment_ids: claimed,
                        confidence: proposed_confidence(item.coverage, item.relevance),
                        source: ItemSource::Proposed,
                        theme_ids: item.theme_ids.clone(),
                    });
                    from_proposed = true;
                }
            }
        }

        if let Some(handle) = &self.abort {
            if handle.is_aborted() {
                return Err(PipelineError::Aborted);
            }
        }

        // Merge research-suggested sections that bring new material
        let mut from_research = false;
        let mut research_added = 0usize;
        for section in &research.suggested_sections {
            let strength = section
                .theme_ids
                .iter()
                .filter_map(|id| research.theme(id))
                .map(|t| t.strength)
                .fold(f64::NAN, f64::max);
            let strength = if strength.is_nan() { 0.5 } else { strength };

            // O(S^2) overlap pass against everything accepted so far
            let overlap = candidates
                .iter()
                .enumerate()
                .map(|(index, c)| {
                    let shared = c
                        .fragment_ids
                        .iter()
                        .filter(|id| section.fragment_ids.contains(*id))
                        .count();
                    (index, shared as f64 / section.fragment_ids.len().max(1) as f64)
                })
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            let unused: Vec<FragmentId> = section
                .fragment_ids
                .iter()
                .filter(|id| !used.contains(*id))
                .cloned()
                .collect();

            if let Some((index, ratio)) = overlap {
                if ratio >= self.config.overlap_cap {
                    // Near-duplicate of an existing section: fold the new
                    // material into it instead of emitting a twin.
                    let target = &mut candidates[index];
                    used.extend(unused.iter().cloned());
                    target.fragment_ids.extend(unused);
                    target.theme_ids.extend(section.theme_ids.iter().copied());
                    if target.source == ItemSource::Proposed {
                        target.source = ItemSource::Merged;
                    }
                    continue;
                }
            }

            let admit = strength > self.config.min_merge_strength || research_added == 0;
            if !admit || unused.is_empty() {
                continue;
            }
            used.extend(unused.iter().cloned());
            candidates.push(Candidate {
                text: section.title.clone(),
                fragment_ids: unused,
                confidence: research_confidence(strength),
                source: ItemSource::Research,
                theme_ids: section.theme_ids.clone(),
            });
            from_research = true;
            research_added += 1;
        }

        // Leftover strong themes the outline never touched
        if let Some((_, review)) = proposed {
            for theme_id in &review.suggested_additions {
                let Some(theme) = research.theme(theme_id) else {
                    continue;
                };
                let unused: Vec<FragmentId> = theme
                    .fragment_ids
                    .iter()
                    .filter(|id| !used.contains(*id))
                    .cloned()
                    .collect();
                if unused.len() < 2 {
                    continue;
                }
                used.extend(unused.iter().cloned());
                candidates.push(Candidate {
                    text: theme.name.clone(),
                    fragment_ids: unused,
                    confidence: research_confidence(theme.strength),
                    source: ItemSource::Research,
                    theme_ids: [theme.id].into_iter().collect(),
                });
                from_research = true;
            }
        }

        if candidates.is_empty() {
            return Err(PipelineError::EmptyOutline);
        }

        // No fabricated references: everything assigned must exist in the
        // input fragment set.
        for candidate in &candidates {
            if let Some(id) = candidate
                .fragment_ids
                .iter()
                .find(|id| !known_ids.contains(*id))
            {
                return Err(PipelineError::UnknownFragment { id: id.clone() });
            }
        }

        // Cap: keep the highest-confidence candidates, preserving their
        // relative order.
        if candidates.len() > self.config.max_sections {
            let mut ranked: Vec<usize> = (0..candidates.len()).collect();
            ranked.sort_by(|&a, &b| {
                candidates[b]
                    .confidence
                    .partial_cmp(&candidates[a].confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.cmp(&b))
            });
            let keep: BTreeSet<usize> =
                ranked.into_iter().take(self.config.max_sections).collect();
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(index, _)| keep.contains(index))
                .map(|(_, c)| c)
                .collect();
        }

        if self.config.narrative_reorder {
            self.reorder(&mut candidates, research, fragments);
        }

        let confidence = candidates.iter().map(|c| c.confidence).sum::<f64>()
            / candidates.len() as f64;
        debug!(
            sections = candidates.len(),
            from_proposed, from_research, confidence, "outline generated"
        );

        let items: Vec<GeneratedItem> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, c)| GeneratedItem {
                path: index.to_string(),
                text: c.text,
                fragment_ids: c.fragment_ids,
                confidence: c.confidence,
                source: c.source,
                theme_ids: c.theme_ids,
            })
            .collect();
        let assignments: BTreeMap<String, Vec<FragmentId>> = items
            .iter()
            .map(|item| (item.path.clone(), item.fragment_ids.clone()))
            .collect();
        let structure = OutlineStructure::new(
            OutlineKind::Sections,
            items.iter().map(|item| OutlineItem::new(item.text.clone())).collect(),
        )
        .with_confidence(confidence);

        Ok(GeneratedOutline {
            structure,
            items,
            assignments,
            confidence,
            from_proposed,
            from_research,
        })
    }

    /// Narrative-flow reorder
    ///
    /// Base score is the mean fragment timestamp (sections without dated
    /// fragments score "now"); a setup-flavored supporting theme forces the
    /// section to the front, a payoff-flavored one to the back. Stable sort,
    /// so equally-scored sections keep their merge order.
    fn reorder(
        &self,
        candidates: &mut [Candidate],
        research: &ResearchResult,
        fragments: &[Fragment],
    ) {
        let by_id: BTreeMap<&FragmentId, &Fragment> =
            fragments.iter().map(|f| (&f.id, f)).collect();
        let now = Utc::now().timestamp() as f64;

        let score = |candidate: &Candidate| -> f64 {
            let stamps: Vec<f64> = candidate
                .fragment_ids
                .iter()
                .filter_map(|id| by_id.get(id))
                .filter_map(|f| f.created_at)
                .map(|at| at.timestamp() as f64)
                .collect();
            let mut score = if stamps.is_empty() {
                now
            } else {
                stamps.iter().sum::<f64>() / stamps.len() as f64
            };
            let themes: Vec<_> = candidate
                .theme_ids
                .iter()
                .filter_map(|id| research.theme(id))
                .collect();
            if themes.iter().any(|t| t.is_setup_flavored()) {
                score -= FLAVOR_OFFSET;
            }
            if themes.iter().any(|t| t.is_payoff_flavored()) {
                score += FLAVOR_OFFSET;
            }
            score
        };

        candidates.sort_by(|a, b| {
            score(a)
                .partial_cmp(&score(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Confidence of a section seeded from the proposed outline
fn proposed_confidence(coverage: CoverageLevel, relevance: f64) -> f64 {
    (0.3 + 0.7 * (coverage.weight() + relevance) / 2.0).clamp(0.0, 1.0)
}

/// Confidence of a section taken from research
fn research_confidence(strength: f64) -> f64 {
    (0.4 + 0.5 * strength).clamp(0.0, 1.0)
}
