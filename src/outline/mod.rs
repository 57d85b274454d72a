//! Outline stage: review, generation, and section ordering
//!
//! Consumes a [`crate::research::ResearchResult`] and (optionally) a
//! user-proposed outline tree, and produces the structures the drafting
//! layer works from: a scored review, a merged and bounded outline, and a
//! per-section fragment ordering.

mod generate;
mod order;
mod review;
mod types;

pub use generate::OutlineGenerator;
pub use order::order_sections;
pub use review::OutlineReviewer;
pub use types::{
    CoverageLevel, GeneratedItem, GeneratedOutline, ItemSource, OrderedSection, OutlineItem,
    OutlineItemReview, OutlineKind, OutlineReview, OutlineStructure,
};
