//! Shared types, error model, and configuration for circex.
//!
//! This crate is the foundation depended on by all other circex crates.
//! It provides:
//! - [`CircexError`] — the unified error type
//! - Domain types ([`Citation`], [`ContentBlock`], [`ReferenceEdge`], [`DocumentContent`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, DepartmentEntry, ScrapeConfig, ScrapeDefaultsConfig, SiteConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CircexError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, CachedDocument, Citation, ContentBlock, DocumentContent, EdgeContent,
    EdgeKind, FailureReason, ListItem, RefKind, ReferenceEdge, ResolveFailure,
};
