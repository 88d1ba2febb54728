//! Shared types, error model, and configuration for docmesh.
//!
//! This crate is the foundation depended on by all other docmesh crates.
//! It provides:
//! - [`DocmeshError`]: the unified error type
//! - Domain types ([`FileDescriptor`], [`FileMap`], [`CategoryRule`], [`NameMappingRule`])
//! - Configuration ([`SiteConfig`], [`RepositoryConfig`], [`WorkspaceLayout`])
//! - Portable path normalization ([`path`])

pub mod config;
pub mod error;
pub mod path;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, DEFAULT_WORKDIR, RepositoryConfig, SiteConfig, WorkspaceLayout,
    directory_from_url, init_config,
};
pub use error::{DocmeshError, Result};
pub use path::{NormalizedPath, normalize, normalize_path, relative_to};
pub use types::{
    CategoryMatching, CategoryRule, FileDescriptor, FileMap, INDEX_FILE_NAME, MARKDOWN_EXTENSION,
    NameMappingRule, RegexTransform, Transform, UNCATEGORIZED,
};
