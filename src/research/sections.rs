//! Section suggestion
//!
//! Proposes an ordered section list for the outline generator. An arc with
//! enough shape drives the structure directly; otherwise the strongest
//! themes do, with setup-flavored themes pulled to the front and
//! payoff-flavored ones pushed to the end.

use crate::config::PipelineConfig;
use crate::fragment::{Fragment, FragmentId};
use crate::research::types::{ArcPhaseKind, NarrativeArc, SuggestedSection, Theme};
use crate::text;
use std::collections::{BTreeMap, BTreeSet};

/// Arc completeness at which phase-driven sections are trusted
const ARC_COMPLETENESS_FLOOR: f64 = 0.5;

/// Fixed phase titles for arc-driven sections
fn phase_title(kind: ArcPhaseKind) -> &'static str {
    match kind {
        ArcPhaseKind::Setup => "Introduction",
        ArcPhaseKind::Development => "Development",
        ArcPhaseKind::Climax => "Turning Point",
        ArcPhaseKind::Resolution => "Conclusion",
    }
}

/// Suggest sections from the main arc or from themes
pub(crate) fn suggest_sections(
    fragments: &[Fragment],
    themes: &[Theme],
    main_arc: Option<&NarrativeArc>,
    config: &PipelineConfig,
) -> Vec<SuggestedSection> {
    let words_by_id: BTreeMap<&FragmentId, usize> = fragments
        .iter()
        .map(|f| (&f.id, text::word_count(&f.text)))
        .collect();
    let estimate = |ids: &BTreeSet<FragmentId>| -> usize {
        let source: usize = ids
            .iter()
            .map(|id| words_by_id.get(id).copied().unwrap_or(0))
            .sum();
        (source as f64 * config.word_expansion).round() as usize
    };

    if let Some(arc) = main_arc {
        if arc.completeness >= ARC_COMPLETENESS_FLOOR {
            return arc
                .phases
                .iter()
                .enumerate()
                .map(|(order, phase)| SuggestedSection {
                    title: phase_title(phase.kind).to_string(),
                    theme_ids: themes
                        .iter()
                        .filter(|t| !t.fragment_ids.is_disjoint(&phase.fragment_ids))
                        .map(|t| t.id)
                        .collect(),
                    estimated_words: estimate(&phase.fragment_ids),
                    fragment_ids: phase.fragment_ids.clone(),
                    order,
                })
                .collect();
        }
    }

    // Theme-driven fallback: setup themes open, payoff themes close,
    // everything else ranks by strength.
    let mut ranked: Vec<&Theme> = themes.iter().collect();
    ranked.sort_by(|a, b| {
        narrative_slot(a)
            .cmp(&narrative_slot(b))
            .then_with(|| {
                b.strength
                    .partial_cmp(&a.strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
    });

    ranked
        .into_iter()
        .take(config.max_theme_sections)
        .enumerate()
        .map(|(order, theme)| SuggestedSection {
            title: theme.name.clone(),
            theme_ids: [theme.id].into_iter().collect(),
            estimated_words: estimate(&theme.fragment_ids),
            fragment_ids: theme.fragment_ids.clone(),
            order,
        })
        .collect()
}

fn narrative_slot(theme: &Theme) -> u8 {
    if theme.is_setup_flavored() {
        0
    } else if theme.is_payoff_flavored() {
        2
    } else {
        1
    }
}
