//! Tessera: Outline Intelligence Pipeline
//!
//! Turns a loosely curated set of harvested text fragments ("cards") into a
//! structured book outline: unsupervised theme discovery, narrative-arc
//! detection, coverage-gap analysis, outline review and merging, and
//! per-section fragment ordering for drafting hand-off.
//!
//! # Core Concepts
//!
//! - **Fragments**: immutable harvested text units with optional grades
//! - **Themes**: fragment clusters from semantic clusters or co-occurring keywords
//! - **Arcs**: detected setup→development→resolution progressions
//! - **Outlines**: proposed trees reviewed, merged, and ordered for drafting
//!
//! The pipeline is synchronous and side-effect-free over immutable inputs;
//! the only async boundary is narrative-function resolution, which completes
//! before anything else runs.
//!
//! # Example
//!
//! ```
//! use tessera::classify::{resolve_functions, LexicalClassifier};
//! use tessera::{Fragment, ResearchPipeline};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tessera::PipelineError> {
//! let fragments = vec![
//!     Fragment::new("card-1", "It began in the walled garden, rose beds in bloom."),
//!     Fragment::new("card-2", "The garden gate, the last rose past bloom."),
//! ];
//! let resolved = resolve_functions(&LexicalClassifier::new(), &fragments).await;
//! let research = ResearchPipeline::new().research(&fragments, &[], &resolved)?;
//! assert_eq!(research.fragment_count, 2);
//! # Ok(())
//! # }
//! ```

mod abort;
pub mod classify;
mod config;
mod error;
mod fragment;
pub mod outline;
pub mod research;
pub mod text;

pub use abort::AbortHandle;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use fragment::{
    load_fragments, Fragment, FragmentId, FragmentRejection, Grade, NarrativeFunction,
    SemanticCluster,
};
pub use outline::{
    GeneratedOutline, OrderedSection, OutlineGenerator, OutlineItem, OutlineKind, OutlineReview,
    OutlineReviewer, OutlineStructure,
};
pub use research::{ResearchPipeline, ResearchResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
