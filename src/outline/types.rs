//! Outline data model: proposed trees, reviews, generated outlines
//!
//! Outline items form a tree; a node's path is the dash-joined index string
//! of its position ("0-1" = second child of the first top-level item).
//! Paths are unique by construction and used as keys in every assignment
//! map. Tree depth is bounded by validation, matching the harvesting
//! system's own limit.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fragment::FragmentId;
use crate::research::ThemeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Shape of a proposed outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineKind {
    Chapters,
    Sections,
    Freeform,
}

/// A node in a proposed book structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineItem>) -> Self {
        self.children = children;
        self
    }
}

/// A user-proposed outline tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineStructure {
    pub kind: OutlineKind,
    pub items: Vec<OutlineItem>,
    pub depth: usize,
    /// 0-1 confidence attached by whoever produced the structure
    pub confidence: f64,
}

impl OutlineStructure {
    /// Build a structure, computing depth from the item tree
    pub fn new(kind: OutlineKind, items: Vec<OutlineItem>) -> Self {
        let depth = tree_depth(&items);
        Self {
            kind,
            items,
            depth,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Validate the tree against the configured bounds
    ///
    /// Rejects empty outlines, blank item text, and trees deeper than the
    /// configured maximum. Called before review and generation; a malformed
    /// tree is an error, never silently tolerated.
    pub fn validate(&self, config: &PipelineConfig) -> PipelineResult<()> {
        if self.items.is_empty() {
            return Err(PipelineError::InvalidOutline {
                reason: "outline has no items".to_string(),
            });
        }
        let depth = tree_depth(&self.items);
        if depth > config.max_outline_depth {
            return Err(PipelineError::OutlineTooDeep {
                depth,
                max: config.max_outline_depth,
            });
        }
        for (path, item) in walk_items(&self.items) {
            if item.text.trim().is_empty() {
                return Err(PipelineError::InvalidOutline {
                    reason: format!("item at path {} has no text", path),
                });
            }
        }
        Ok(())
    }
}

/// Depth of an item tree (empty tree = 0)
pub(crate) fn tree_depth(items: &[OutlineItem]) -> usize {
    items
        .iter()
        .map(|item| 1 + tree_depth(&item.children))
        .max()
        .unwrap_or(0)
}

/// Depth-first traversal yielding (path, item) pairs
pub(crate) fn walk_items(items: &[OutlineItem]) -> Vec<(String, &OutlineItem)> {
    fn recurse<'a>(
        items: &'a [OutlineItem],
        prefix: Option<&str>,
        out: &mut Vec<(String, &'a OutlineItem)>,
    ) {
        for (index, item) in items.iter().enumerate() {
            let path = match prefix {
                Some(prefix) => format!("{}-{}", prefix, index),
                None => index.to_string(),
            };
            let children_path = path.clone();
            out.push((path, item));
            recurse(&item.children, Some(&children_path), out);
        }
    }
    let mut out = Vec::new();
    recurse(items, None, &mut out);
    out
}

/// How well the harvested material covers an outline item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageLevel {
    Strong,
    Partial,
    Weak,
    None,
}

impl CoverageLevel {
    /// Numeric weight used when aggregating item coverage
    pub fn weight(&self) -> f64 {
        match self {
            Self::Strong => 1.0,
            Self::Partial => 0.6,
            Self::Weak => 0.3,
            Self::None => 0.0,
        }
    }
}

/// Review of a single outline item against the research output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItemReview {
    pub path: String,
    pub text: String,
    pub coverage: CoverageLevel,
    /// Matching fragments, strongest first
    pub fragment_ids: Vec<FragmentId>,
    /// Mean match score across the matching fragments
    pub relevance: f64,
    /// Themes relevant to this item that its matches belong to
    pub theme_ids: BTreeSet<ThemeId>,
    /// Unmatched fragments from relevant themes worth considering
    pub suggested_fragments: Vec<FragmentId>,
    pub note: String,
}

/// Review of a whole proposed outline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineReview {
    pub items: Vec<OutlineItemReview>,
    /// 0-1 mean of per-item coverage weights
    pub overall_coverage: f64,
    /// 0-1 composite estimate of draftability
    pub feasibility: f64,
    /// Texts of items with no material at all
    pub uncovered: Vec<String>,
    /// Texts of items with thin material
    pub partially_covered: Vec<String>,
    /// Strong themes no outline item touches
    pub suggested_additions: Vec<ThemeId>,
    /// Path → matched fragment ids
    pub assignments: BTreeMap<String, Vec<FragmentId>>,
    pub summary: String,
}

/// Where a generated outline item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Research,
    Proposed,
    Merged,
}

/// One section of a generated outline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub path: String,
    pub text: String,
    pub fragment_ids: Vec<FragmentId>,
    pub confidence: f64,
    pub source: ItemSource,
    pub theme_ids: BTreeSet<ThemeId>,
}

/// A generated outline plus its fragment assignments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedOutline {
    pub structure: OutlineStructure,
    pub items: Vec<GeneratedItem>,
    /// Path → assigned fragment ids
    pub assignments: BTreeMap<String, Vec<FragmentId>>,
    pub confidence: f64,
    pub from_proposed: bool,
    pub from_research: bool,
}

/// A section's fragments ordered for drafting hand-off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderedSection {
    pub title: String,
    pub path: String,
    /// Fragments ordered by grade descending, then timestamp ascending
    pub fragment_ids: Vec<FragmentId>,
    pub key_fragment_ids: BTreeSet<FragmentId>,
}
