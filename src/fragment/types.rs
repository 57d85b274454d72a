//! Core input types: fragments, grades, and external semantic clusters

use crate::error::PipelineResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unique identifier for a fragment, supplied by the harvesting layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentId(String);

impl FragmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FragmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FragmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Narrative function of a fragment within the larger work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeFunction {
    /// Establishes premise, characters, or stakes
    Setup,
    /// Delivers on an earlier setup
    Payoff,
    /// Reveals who a character is
    Characterization,
    /// Establishes the world the story lives in
    Worldbuilding,
    /// Mood and sensory texture
    Atmosphere,
    /// Moves between scenes or times
    Transition,
    /// Could be cut without structural damage
    Dispensable,
    /// The classifier could not produce a determination
    Undetermined,
}

impl NarrativeFunction {
    /// Label used in serialized output and gap descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Payoff => "payoff",
            Self::Characterization => "characterization",
            Self::Worldbuilding => "worldbuilding",
            Self::Atmosphere => "atmosphere",
            Self::Transition => "transition",
            Self::Dispensable => "dispensable",
            Self::Undetermined => "undetermined",
        }
    }
}

/// Externally-supplied quality grade for a fragment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Overall quality, 1-5
    pub overall: u8,
    /// How necessary the fragment is to the narrative, 0-1
    pub necessity: f64,
    /// Narrative function assigned by the grader
    pub function: NarrativeFunction,
    /// Inflection-point weight, 1-5
    pub inflection: u8,
}

/// A harvested unit of source text
///
/// Immutable input; the pipeline never writes back to a fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
}

impl Fragment {
    pub fn new(id: impl Into<FragmentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: None,
            title: None,
            grade: None,
        }
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = Some(grade);
        self
    }

    /// Overall grade with the documented default of 3 when ungraded
    pub fn overall_or_default(&self) -> f64 {
        self.grade.map(|g| f64::from(g.overall)).unwrap_or(3.0)
    }
}

/// A fragment skipped by the pipeline, with the reason recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentRejection {
    pub fragment_id: FragmentId,
    pub reason: String,
}

/// A precomputed semantic cluster from the embedding collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCluster {
    pub id: String,
    pub label: String,
    pub fragment_ids: Vec<FragmentId>,
}

/// Load a fragment list from a JSON file
pub fn load_fragments(path: &Path) -> PipelineResult<Vec<Fragment>> {
    let raw = std::fs::read_to_string(path)?;
    let fragments: Vec<Fragment> = serde_json::from_str(&raw)?;
    Ok(fragments)
}
