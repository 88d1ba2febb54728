//! Working-copy crawling, display-name resolution, and categorization.
//!
//! This crate provides:
//! - [`naming`]: per-repository and global name mapping chains
//! - [`category`]: path-containment category matching
//! - [`engine`]: the [`Crawler`] that walks a working copy into file descriptors

pub mod category;
pub mod engine;
pub mod naming;

pub use category::categorize;
pub use engine::{CrawlResult, Crawler};
pub use naming::{apply_rules, resolve_display_name};
