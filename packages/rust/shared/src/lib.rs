//! Shared types, error model, and configuration for CourseDocs.
//!
//! This crate is the foundation depended on by all other CourseDocs crates.
//! It provides:
//! - [`CourseDocsError`], the unified error type
//! - Domain types ([`CourseRow`], [`LinkRow`], [`RenderContext`])
//! - Configuration ([`AppConfig`], [`GenerateOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnchorConfig, AppConfig, DefaultsConfig, GenerateOptions, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{CourseDocsError, Result};
pub use types::{
    ADULTS_LABEL, CourseRow, KIDS_LABEL, LINK_NOT_FOUND, LinkRow, MISSING_LINK, RenderContext,
    YOUTH_LABEL, columns,
};
