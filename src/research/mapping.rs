//! Source mapping
//!
//! Maps each fragment onto the discovered themes, assigns a chronological
//! narrative position to dated fragments, and flags key passages from the
//! grade/necessity/inflection signals.

use crate::classify::ResolvedFunctions;
use crate::config::PipelineConfig;
use crate::fragment::{Fragment, FragmentId};
use crate::research::types::{NarrativePosition, SourceMapping, Theme};
use crate::text;
use std::collections::BTreeMap;

/// Grade threshold marking a key passage
const KEY_OVERALL: u8 = 4;
/// Necessity threshold marking a key passage
const KEY_NECESSITY: f64 = 0.7;
/// Inflection threshold marking a key passage
const KEY_INFLECTION: u8 = 4;

/// Map every fragment to themes, position, and key-passage status
pub(crate) fn map_sources(
    fragments: &[Fragment],
    themes: &[Theme],
    resolved: &ResolvedFunctions,
    config: &PipelineConfig,
) -> BTreeMap<FragmentId, SourceMapping> {
    // Chronological order, undated fragments last; ties break on id so the
    // tertile assignment is reproducible.
    let mut ordered: Vec<&Fragment> = fragments.iter().collect();
    ordered.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
    let dated_count = ordered.iter().filter(|f| f.created_at.is_some()).count();

    let mut mappings = BTreeMap::new();
    let mut dated_index = 0usize;
    for fragment in ordered {
        let position = fragment.created_at.map(|_| {
            let position = tertile(dated_index, dated_count);
            dated_index += 1;
            position
        });

        let words = text::significant_words(&fragment.text, config.theme_keyword_min_len);
        let mut relevance = BTreeMap::new();
        for theme in themes {
            if theme.keywords.is_empty() {
                continue;
            }
            let matched = theme.keywords.iter().filter(|k| words.contains(*k)).count();
            let score = matched as f64 / theme.keywords.len() as f64;
            if score > config.theme_relevance_floor {
                relevance.insert(theme.id, score);
            }
        }

        mappings.insert(
            fragment.id.clone(),
            SourceMapping {
                fragment_id: fragment.id.clone(),
                theme_ids: relevance.keys().copied().collect(),
                key_passage: is_key_passage(fragment, resolved),
                position,
                relevance,
            },
        );
    }
    mappings
}

/// Tertile of a chronological index
fn tertile(index: usize, total: usize) -> NarrativePosition {
    if index * 3 < total {
        NarrativePosition::Early
    } else if index * 3 < total * 2 {
        NarrativePosition::Middle
    } else {
        NarrativePosition::Late
    }
}

/// A fragment is a key passage on any of the grade signals
///
/// Necessity falls back to the resolved classifier output when the fragment
/// carries no grade.
fn is_key_passage(fragment: &Fragment, resolved: &ResolvedFunctions) -> bool {
    if let Some(grade) = fragment.grade {
        if grade.overall >= KEY_OVERALL || grade.inflection >= KEY_INFLECTION {
            return true;
        }
    }
    let necessity = fragment
        .grade
        .map(|g| g.necessity)
        .unwrap_or_else(|| resolved.necessity_of(&fragment.id));
    necessity >= KEY_NECESSITY
}
