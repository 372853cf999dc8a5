//! Batch orchestration for CourseDocs.
//!
//! This crate ties together table loading, link matching, template
//! rendering, and archive packaging into the end-to-end `generate`
//! pipeline.

pub mod pipeline;
