//! Research stage: theme discovery, arc detection, mapping, and coverage
//!
//! [`ResearchPipeline`] runs the synchronous analysis chain over an
//! immutable fragment set:
//!
//! 1. **ThemeExtractor** — semantic clusters and keyword co-occurrence
//! 2. **ArcDetector** — setup/development/resolution and temporal arcs
//! 3. **SourceMapper** — fragment-to-theme relevance and key passages
//! 4. **CoverageAnalyzer** — gap and strength rules
//! 5. **SectionSuggester** — ordered section proposals
//!
//! Narrative functions must be resolved (see [`crate::classify`]) before
//! the pipeline runs; nothing in here suspends.

mod arcs;
mod coverage;
mod mapping;
mod sections;
mod themes;
mod types;

pub use types::{
    ArcId, ArcPhase, ArcPhaseKind, CoverageGap, GapSeverity, NarrativeArc, NarrativePosition,
    ResearchResult, SourceMapping, SuggestedSection, Theme, ThemeId,
};

use crate::abort::AbortHandle;
use crate::classify::ResolvedFunctions;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::fragment::{Fragment, FragmentRejection, SemanticCluster};
use crate::research::types::clamp_score;
use tracing::{debug, info};

/// Runs the research stage over a fragment set
#[derive(Debug, Clone, Default)]
pub struct ResearchPipeline {
    config: PipelineConfig,
    abort: Option<AbortHandle>,
}

impl ResearchPipeline {
    /// Create a pipeline with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an abort handle checked before the quadratic passes
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full research chain
    ///
    /// Fragments with empty text are skipped and recorded as rejections,
    /// never a whole-pipeline failure. An empty (or fully rejected) input
    /// yields confidence 0 and a single major coverage gap.
    pub fn research(
        &self,
        fragments: &[Fragment],
        clusters: &[SemanticCluster],
        resolved: &ResolvedFunctions,
    ) -> PipelineResult<ResearchResult> {
        let mut rejections: Vec<FragmentRejection> = resolved.failures.clone();
        let valid: Vec<Fragment> = fragments
            .iter()
            .filter(|f| {
                if f.text.trim().is_empty() {
                    rejections.push(FragmentRejection {
                        fragment_id: f.id.clone(),
                        reason: "fragment has no text content".to_string(),
                    });
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        debug!(
            total = fragments.len(),
            valid = valid.len(),
            clusters = clusters.len(),
            "research starting"
        );

        let themes = themes::extract_themes(
            &valid,
            clusters,
            resolved,
            &self.config,
            self.abort.as_ref(),
        )?;
        let arcs = arcs::detect_arcs(&valid, resolved, &self.config);
        let mappings = mapping::map_sources(&valid, &themes, resolved, &self.config);
        let report = coverage::analyze_coverage(valid.len(), &themes, &arcs, &mappings);

        let main_arc = arcs.iter().find(|a| a.name == "main");
        let suggested_sections =
            sections::suggest_sections(&valid, &themes, main_arc, &self.config);

        let confidence = confidence(&valid, &themes, main_arc, &mappings);
        info!(
            themes = themes.len(),
            arcs = arcs.len(),
            gaps = report.gaps.len(),
            confidence,
            "research complete"
        );

        Ok(ResearchResult {
            themes,
            arcs,
            mappings,
            gaps: report.gaps,
            strengths: report.strengths,
            suggested_sections,
            fragment_count: valid.len(),
            confidence,
            rejections,
        })
    }
}

/// Composite research confidence
///
/// Weighted blend of theme coverage, theme strength, main-arc completeness,
/// and the fraction of fragments mapped to at least one theme. Empty input
/// is always 0.
fn confidence(
    fragments: &[Fragment],
    themes: &[Theme],
    main_arc: Option<&NarrativeArc>,
    mappings: &std::collections::BTreeMap<crate::fragment::FragmentId, SourceMapping>,
) -> f64 {
    if fragments.is_empty() {
        return 0.0;
    }
    let theme_count = clamp_score(themes.len() as f64 / 3.0);
    let theme_strength = if themes.is_empty() {
        0.0
    } else {
        themes.iter().map(|t| t.strength).sum::<f64>() / themes.len() as f64
    };
    let arc_completeness = main_arc.map(|a| a.completeness).unwrap_or(0.0);
    let mapped = mappings.values().filter(|m| !m.theme_ids.is_empty()).count() as f64
        / fragments.len() as f64;
    clamp_score(0.3 * theme_count + 0.3 * theme_strength + 0.2 * arc_completeness + 0.2 * mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[Fragment]) -> ResearchResult {
        ResearchPipeline::new()
            .research(fragments, &[], &ResolvedFunctions::default())
            .unwrap()
    }

    #[test]
    fn test_empty_input() {
        let result = run(&[]);
        assert_eq!(result.confidence, 0.0);
        assert!(result.themes.is_empty());
        assert!(result.arcs.is_empty());
        assert_eq!(result.gaps.len(), 1);
        assert_eq!(result.gaps[0].severity, GapSeverity::Major);
    }

    #[test]
    fn test_blank_fragment_rejected_not_fatal() {
        let fragments = vec![
            Fragment::new("blank", "   "),
            Fragment::new("f1", "garden rose bloom garden rose bloom"),
            Fragment::new("f2", "garden rose bloom garden rose bloom"),
        ];
        let result = run(&fragments);
        assert_eq!(result.fragment_count, 2);
        assert_eq!(result.rejections.len(), 1);
        assert_eq!(result.rejections[0].fragment_id, "blank".into());
    }

    #[test]
    fn test_theme_invariants() {
        let fragments = vec![
            Fragment::new("f1", "garden rose bloom garden rose bloom"),
            Fragment::new("f2", "garden rose bloom garden rose bloom"),
            Fragment::new("f3", "rocket launch countdown ignition"),
        ];
        let result = run(&fragments);
        for theme in &result.themes {
            assert!(theme.strength >= 0.0 && theme.strength <= 1.0);
            assert!(!theme.fragment_ids.is_empty());
        }
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }
}
