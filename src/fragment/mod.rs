//! Fragment input model
//!
//! Fragments ("cards") are the harvested units of source text the pipeline
//! works over. They arrive fully formed from the harvesting layer and are
//! never mutated here.

mod types;

pub use types::{
    load_fragments, Fragment, FragmentId, FragmentRejection, Grade, NarrativeFunction,
    SemanticCluster,
};
