//! Pipeline orchestration and site generation for docmesh.
//!
//! This crate ties together repository sync, crawling, File Map persistence,
//! and navigation rendering into end-to-end workflows (e.g., [`pipeline::build_site`]).

pub mod nav;
pub mod pipeline;
pub mod site;
pub mod sync;
