//! Theme extraction
//!
//! Themes come from two places: precomputed semantic clusters supplied by
//! the embedding collaborator, and a keyword co-occurrence fallback that
//! kicks in when fewer than three themes result. The co-occurrence pass is
//! the pipeline's O(F·W²) hot spot and honors the abort handle.

use crate::abort::AbortHandle;
use crate::classify::ResolvedFunctions;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fragment::{Fragment, FragmentId, NarrativeFunction, SemanticCluster};
use crate::research::types::{clamp_score, Theme, ThemeId};
use crate::text;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Number of ranked keywords kept per theme
const THEME_KEYWORDS: usize = 5;
/// Fragment count at which a theme reaches full strength
const FULL_STRENGTH_COUNT: f64 = 5.0;
/// Minimum themes before the co-occurrence fallback engages
const MIN_THEMES: usize = 3;

/// Extract themes from fragments and optional semantic clusters
pub(crate) fn extract_themes(
    fragments: &[Fragment],
    clusters: &[SemanticCluster],
    resolved: &ResolvedFunctions,
    config: &PipelineConfig,
    abort: Option<&AbortHandle>,
) -> PipelineResult<Vec<Theme>> {
    let by_id: BTreeMap<&FragmentId, &Fragment> =
        fragments.iter().map(|f| (&f.id, f)).collect();

    let mut themes: Vec<Theme> = clusters
        .iter()
        .filter_map(|cluster| theme_from_cluster(cluster, &by_id, resolved, config))
        .collect();

    if themes.len() < MIN_THEMES {
        if let Some(handle) = abort {
            if handle.is_aborted() {
                return Err(PipelineError::Aborted);
            }
        }
        let supplemental = cooccurrence_themes(fragments, &themes, resolved, config);
        debug!(
            clustered = themes.len(),
            supplemental = supplemental.len(),
            "supplementing themes via co-occurrence"
        );
        themes.extend(supplemental);
    }

    themes.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(themes)
}

/// Derive a theme from one supplied semantic cluster
fn theme_from_cluster(
    cluster: &SemanticCluster,
    by_id: &BTreeMap<&FragmentId, &Fragment>,
    resolved: &ResolvedFunctions,
    config: &PipelineConfig,
) -> Option<Theme> {
    let members: Vec<&Fragment> = cluster
        .fragment_ids
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .collect();
    if members.is_empty() {
        return None;
    }

    let keywords = text::top_keywords(
        members.iter().map(|f| f.text.as_str()),
        config.theme_keyword_min_len,
        THEME_KEYWORDS,
    );
    let fragment_ids: BTreeSet<FragmentId> = members.iter().map(|f| f.id.clone()).collect();

    Some(Theme {
        id: ThemeId::from_name(&cluster.label),
        name: cluster.label.clone(),
        keywords,
        strength: clamp_score(members.len() as f64 / FULL_STRENGTH_COUNT),
        average_grade: average_grade(&members),
        dominant_function: dominant_function(&members, resolved),
        fragment_ids,
    })
}

/// Mean supplied grade, with the documented default of 3 when absent
fn average_grade(members: &[&Fragment]) -> f64 {
    if members.is_empty() {
        return 3.0;
    }
    members.iter().map(|f| f.overall_or_default()).sum::<f64>() / members.len() as f64
}

/// Statistical mode of member narrative functions
///
/// Undetermined fragments are excluded; ties break toward the function that
/// sorts first, so the result is stable.
fn dominant_function(
    members: &[&Fragment],
    resolved: &ResolvedFunctions,
) -> Option<NarrativeFunction> {
    let mut counts: BTreeMap<NarrativeFunction, usize> = BTreeMap::new();
    for fragment in members {
        let function = resolved.function_of(&fragment.id);
        if function != NarrativeFunction::Undetermined {
            *counts.entry(function).or_insert(0) += 1;
        }
    }
    let mut best: Option<(NarrativeFunction, usize)> = None;
    for (function, count) in counts {
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((function, count));
        }
    }
    best.map(|(function, _)| function)
}

/// Discover themes from corpus-wide keyword co-occurrence
///
/// For every unordered keyword pair co-occurring inside a fragment, a
/// corpus-wide counter is kept; pairs at or above the configured floor are
/// unioned into clusters in lexicographic pair order, which makes the greedy
/// union reproducible. A candidate cluster becomes a theme only when it does
/// not overlap an already-discovered theme's keywords and at least two
/// fragments contain at least two of its top-five keywords.
fn cooccurrence_themes(
    fragments: &[Fragment],
    existing: &[Theme],
    resolved: &ResolvedFunctions,
    config: &PipelineConfig,
) -> Vec<Theme> {
    let mut pair_counts: BTreeMap<(String, String), u32> = BTreeMap::new();
    let mut corpus_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut fragment_words: Vec<(&Fragment, BTreeSet<String>)> = Vec::new();

    for fragment in fragments {
        let words = text::significant_words(&fragment.text, config.theme_keyword_min_len);
        for word in text::extract_keywords(&fragment.text, config.theme_keyword_min_len) {
            *corpus_counts.entry(word).or_insert(0) += 1;
        }
        let list: Vec<&String> = words.iter().collect();
        for i in 0..list.len() {
            for j in (i + 1)..list.len() {
                // BTreeSet iteration is sorted, so (i, j) is already (a < b)
                *pair_counts
                    .entry((list[i].clone(), list[j].clone()))
                    .or_insert(0) += 1;
            }
        }
        fragment_words.push((fragment, words));
    }

    // Greedy union in lexicographic pair order
    let mut clusters: Vec<BTreeSet<String>> = Vec::new();
    for ((a, b), count) in &pair_counts {
        if *count < config.cooccurrence_floor {
            continue;
        }
        match clusters
            .iter_mut()
            .find(|c| c.contains(a) || c.contains(b))
        {
            Some(cluster) => {
                cluster.insert(a.clone());
                cluster.insert(b.clone());
            }
            None => {
                clusters.push(BTreeSet::from([a.clone(), b.clone()]));
            }
        }
    }

    let mut claimed: BTreeSet<String> = existing
        .iter()
        .flat_map(|t| t.keywords.iter().cloned())
        .collect();

    let mut themes = Vec::new();
    for cluster in clusters {
        if cluster.iter().any(|word| claimed.contains(word)) {
            continue;
        }

        let ranked = text::rank_by_count(
            cluster
                .iter()
                .map(|w| (w.clone(), corpus_counts.get(w).copied().unwrap_or(0)))
                .collect(),
            THEME_KEYWORDS,
        );
        let top: BTreeSet<&String> = ranked.iter().collect();

        let supporters: Vec<&Fragment> = fragment_words
            .iter()
            .filter(|(_, words)| words.iter().filter(|w| top.contains(w)).count() >= 2)
            .map(|(fragment, _)| *fragment)
            .collect();
        if supporters.len() < 2 {
            continue;
        }

        claimed.extend(ranked.iter().cloned());
        let name = theme_name(&ranked);
        themes.push(Theme {
            id: ThemeId::from_name(&name),
            name,
            fragment_ids: supporters.iter().map(|f| f.id.clone()).collect(),
            strength: clamp_score(supporters.len() as f64 / FULL_STRENGTH_COUNT),
            average_grade: average_grade(&supporters),
            dominant_function: dominant_function(&supporters, resolved),
            keywords: ranked,
        });
    }
    themes
}

/// Human-readable theme name from its top keywords
fn theme_name(keywords: &[String]) -> String {
    let titled: Vec<String> = keywords
        .iter()
        .take(2)
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    titled.join(" & ")
}
