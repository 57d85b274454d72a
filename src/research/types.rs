//! Derived research types: themes, arcs, mappings, gaps, suggestions
//!
//! Everything here is recomputed on each run from the immutable fragment
//! set. Scores clamp to [0, 1]; collections are ordered so serialized output
//! is reproducible across runs.

use crate::fragment::{FragmentId, FragmentRejection, NarrativeFunction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Unique identifier for a theme
///
/// Derived from the theme name via UUIDv5 so identical input produces
/// identical ids across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThemeId(Uuid);

impl ThemeId {
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl std::fmt::Display for ThemeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a narrative arc, derived like [`ThemeId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArcId(Uuid);

impl ArcId {
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl std::fmt::Display for ArcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cluster of fragments sharing vocabulary or supplied semantic similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    /// Ranked keywords, strongest first
    pub keywords: Vec<String>,
    pub fragment_ids: BTreeSet<FragmentId>,
    /// 0-1, derived from supporting fragment count
    pub strength: f64,
    /// Mean supplied grade across supporting fragments (default 3)
    pub average_grade: f64,
    /// Statistical mode of supporting fragments' narrative functions
    pub dominant_function: Option<NarrativeFunction>,
}

impl Theme {
    /// Whether this theme's dominant function opens a narrative
    pub fn is_setup_flavored(&self) -> bool {
        self.dominant_function == Some(NarrativeFunction::Setup)
    }

    /// Whether this theme's dominant function closes a narrative
    pub fn is_payoff_flavored(&self) -> bool {
        self.dominant_function == Some(NarrativeFunction::Payoff)
    }
}

/// Kind of phase within a narrative arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcPhaseKind {
    Setup,
    Development,
    Climax,
    Resolution,
}

impl ArcPhaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Development => "development",
            Self::Climax => "climax",
            Self::Resolution => "resolution",
        }
    }
}

/// One phase of a narrative arc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcPhase {
    pub kind: ArcPhaseKind,
    pub fragment_ids: BTreeSet<FragmentId>,
    /// 0-1, fragment count against the per-phase target
    pub strength: f64,
}

/// A detected setup→development→resolution progression (or temporal
/// evolution) across fragments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeArc {
    pub id: ArcId,
    pub name: String,
    /// Phases in narrative order
    pub phases: Vec<ArcPhase>,
    pub fragment_ids: BTreeSet<FragmentId>,
    /// 0-1, phase coverage weighted by mean phase strength
    pub completeness: f64,
}

impl NarrativeArc {
    /// Kinds of phases present in this arc
    pub fn phase_kinds(&self) -> BTreeSet<ArcPhaseKind> {
        self.phases.iter().map(|p| p.kind).collect()
    }
}

/// Severity of a coverage gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    Minor,
    Moderate,
    Major,
}

/// A detected weakness in the harvested material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageGap {
    /// Theme or area label the gap concerns
    pub theme: String,
    pub description: String,
    pub severity: GapSeverity,
    pub suggested_action: String,
}

/// Where a fragment sits chronologically within the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativePosition {
    Early,
    Middle,
    Late,
}

/// Mapping of one fragment to the research structures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMapping {
    pub fragment_id: FragmentId,
    pub theme_ids: BTreeSet<ThemeId>,
    /// Per-theme relevance, only entries above the configured floor
    pub relevance: BTreeMap<ThemeId, f64>,
    /// Set only when the fragment carries a timestamp
    pub position: Option<NarrativePosition>,
    pub key_passage: bool,
}

/// A section proposed from research, before outline merging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedSection {
    pub title: String,
    pub theme_ids: BTreeSet<ThemeId>,
    pub fragment_ids: BTreeSet<FragmentId>,
    pub order: usize,
    pub estimated_words: usize,
}

/// Aggregated output of the research stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub themes: Vec<Theme>,
    pub arcs: Vec<NarrativeArc>,
    pub mappings: BTreeMap<FragmentId, SourceMapping>,
    pub gaps: Vec<CoverageGap>,
    /// Notable strengths of the material, human-readable
    pub strengths: Vec<String>,
    pub suggested_sections: Vec<SuggestedSection>,
    pub fragment_count: usize,
    /// 0-1 composite confidence in the research output
    pub confidence: f64,
    /// Fragments skipped during validation or classification
    pub rejections: Vec<FragmentRejection>,
}

impl ResearchResult {
    /// Look up a theme by id
    pub fn theme(&self, id: &ThemeId) -> Option<&Theme> {
        self.themes.iter().find(|t| &t.id == id)
    }

    /// The main (non-temporal) arc, when detected
    pub fn main_arc(&self) -> Option<&NarrativeArc> {
        self.arcs.iter().find(|a| a.name == "main")
    }

    /// Whether a fragment was flagged as a key passage
    pub fn is_key_passage(&self, id: &FragmentId) -> bool {
        self.mappings.get(id).map(|m| m.key_passage).unwrap_or(false)
    }
}

/// Clamp a score into [0, 1]
pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_id_is_deterministic() {
        assert_eq!(ThemeId::from_name("garden"), ThemeId::from_name("garden"));
        assert_ne!(ThemeId::from_name("garden"), ThemeId::from_name("rocket"));
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(1.2), 1.0);
        assert_eq!(clamp_score(-0.1), 0.0);
        assert_eq!(clamp_score(0.4), 0.4);
    }

    #[test]
    fn test_theme_flavor() {
        let theme = Theme {
            id: ThemeId::from_name("x"),
            name: "x".to_string(),
            keywords: vec![],
            fragment_ids: BTreeSet::new(),
            strength: 0.5,
            average_grade: 3.0,
            dominant_function: Some(NarrativeFunction::Setup),
        };
        assert!(theme.is_setup_flavored());
        assert!(!theme.is_payoff_flavored());
    }
}
