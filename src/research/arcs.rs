//! Narrative arc detection
//!
//! Two detectors run independently: a function-based main arc built from
//! the setup/development/resolution partition, and a temporal-evolution arc
//! built from vocabulary drift between the earliest and latest thirds of
//! dated fragments.

use crate::classify::ResolvedFunctions;
use crate::config::PipelineConfig;
use crate::fragment::{Fragment, FragmentId, NarrativeFunction};
use crate::research::types::{clamp_score, ArcId, ArcPhase, ArcPhaseKind, NarrativeArc};
use crate::text;
use std::collections::BTreeSet;
use tracing::debug;

/// Fragment-count targets at which a phase reaches full strength
const PHASE_TARGETS: &[(ArcPhaseKind, f64)] = &[
    (ArcPhaseKind::Setup, 3.0),
    (ArcPhaseKind::Development, 5.0),
    (ArcPhaseKind::Resolution, 2.0),
];

/// Minimum dated fragments before temporal detection runs
const TEMPORAL_MIN_FRAGMENTS: usize = 4;
/// Keywords compared between the first and last chronological thirds
const TEMPORAL_KEYWORDS: usize = 10;
/// Shared keywords required to call it an evolving thread
const TEMPORAL_MIN_OVERLAP: usize = 3;
/// Fixed confidence values for the temporal arc
const TEMPORAL_PHASE_STRENGTH: f64 = 0.8;
const TEMPORAL_COMPLETENESS: f64 = 0.7;

/// Detect narrative arcs across the fragment set
pub(crate) fn detect_arcs(
    fragments: &[Fragment],
    resolved: &ResolvedFunctions,
    config: &PipelineConfig,
) -> Vec<NarrativeArc> {
    let mut arcs = Vec::new();
    if let Some(arc) = main_arc(fragments, resolved) {
        arcs.push(arc);
    }
    if let Some(arc) = temporal_arc(fragments, config) {
        arcs.push(arc);
    }
    debug!(arcs = arcs.len(), "arc detection complete");
    arcs
}

/// Build the function-based main arc
///
/// Requires at least one setup or resolution fragment; an all-middle corpus
/// has no detectable shape. Discarded below two total fragments.
fn main_arc(fragments: &[Fragment], resolved: &ResolvedFunctions) -> Option<NarrativeArc> {
    let mut setup: BTreeSet<FragmentId> = BTreeSet::new();
    let mut development: BTreeSet<FragmentId> = BTreeSet::new();
    let mut resolution: BTreeSet<FragmentId> = BTreeSet::new();

    for fragment in fragments {
        match resolved.function_of(&fragment.id) {
            NarrativeFunction::Setup => {
                setup.insert(fragment.id.clone());
            }
            NarrativeFunction::Characterization
            | NarrativeFunction::Worldbuilding
            | NarrativeFunction::Transition => {
                development.insert(fragment.id.clone());
            }
            NarrativeFunction::Payoff => {
                resolution.insert(fragment.id.clone());
            }
            _ => {}
        }
    }

    if setup.is_empty() && resolution.is_empty() {
        return None;
    }

    let mut phases = Vec::new();
    for (kind, target) in PHASE_TARGETS {
        let ids = match kind {
            ArcPhaseKind::Setup => &setup,
            ArcPhaseKind::Development => &development,
            ArcPhaseKind::Resolution => &resolution,
            ArcPhaseKind::Climax => unreachable!("no climax target"),
        };
        if ids.is_empty() {
            continue;
        }
        phases.push(ArcPhase {
            kind: *kind,
            strength: clamp_score(ids.len() as f64 / target),
            fragment_ids: ids.clone(),
        });
    }

    let fragment_ids: BTreeSet<FragmentId> = phases
        .iter()
        .flat_map(|p| p.fragment_ids.iter().cloned())
        .collect();
    if fragment_ids.len() < 2 {
        return None;
    }

    let mean_strength =
        phases.iter().map(|p| p.strength).sum::<f64>() / phases.len() as f64;
    let completeness = clamp_score(phases.len() as f64 / 4.0 * mean_strength);

    Some(NarrativeArc {
        id: ArcId::from_name("main"),
        name: "main".to_string(),
        phases,
        fragment_ids,
        completeness,
    })
}

/// Build the temporal-evolution arc
///
/// Sorts dated fragments chronologically, splits them into thirds, and
/// emits a fixed-confidence arc when the first and last thirds share enough
/// of their top keywords to look like one evolving thread.
fn temporal_arc(fragments: &[Fragment], config: &PipelineConfig) -> Option<NarrativeArc> {
    let mut dated: Vec<&Fragment> = fragments.iter().filter(|f| f.created_at.is_some()).collect();
    if dated.len() < TEMPORAL_MIN_FRAGMENTS {
        return None;
    }
    dated.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let third = dated.len() / 3;
    let first = &dated[..third.max(1)];
    let last = &dated[dated.len() - third.max(1)..];
    let middle = &dated[first.len()..dated.len() - last.len()];

    let first_keywords: BTreeSet<String> = text::top_keywords(
        first.iter().map(|f| f.text.as_str()),
        config.theme_keyword_min_len,
        TEMPORAL_KEYWORDS,
    )
    .into_iter()
    .collect();
    let last_keywords: BTreeSet<String> = text::top_keywords(
        last.iter().map(|f| f.text.as_str()),
        config.theme_keyword_min_len,
        TEMPORAL_KEYWORDS,
    )
    .into_iter()
    .collect();

    let overlap = first_keywords.intersection(&last_keywords).count();
    if overlap < TEMPORAL_MIN_OVERLAP {
        return None;
    }

    let phase = |kind: ArcPhaseKind, group: &[&Fragment]| ArcPhase {
        kind,
        fragment_ids: group.iter().map(|f| f.id.clone()).collect(),
        strength: TEMPORAL_PHASE_STRENGTH,
    };

    Some(NarrativeArc {
        id: ArcId::from_name("temporal evolution"),
        name: "temporal evolution".to_string(),
        phases: vec![
            phase(ArcPhaseKind::Setup, first),
            phase(ArcPhaseKind::Development, middle),
            phase(ArcPhaseKind::Resolution, last),
        ],
        fragment_ids: dated.iter().map(|f| f.id.clone()).collect(),
        completeness: TEMPORAL_COMPLETENESS,
    })
}
