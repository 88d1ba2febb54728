//! Site output writer.
//!
//! Writes the generated landing page and navigation document into the
//! work directory, next to the working copies.

use std::path::PathBuf;

use tracing::{info, instrument};

use docmesh_shared::{DocmeshError, RepositoryConfig, Result, WorkspaceLayout};
use docmesh_storage::write_atomic;

use crate::nav::render_index;

/// Create the work directory and its `docs/` root.
pub fn prepare(layout: &WorkspaceLayout) -> Result<()> {
    let docs = layout.docs_dir();
    std::fs::create_dir_all(&docs).map_err(|e| DocmeshError::io(&docs, e))
}

/// Write `docs/index.md` listing `repositories`.
#[instrument(skip_all, fields(repositories = repositories.len()))]
pub fn write_index(layout: &WorkspaceLayout, repositories: &[RepositoryConfig]) -> Result<PathBuf> {
    prepare(layout)?;
    let path = layout.index_path();
    write_atomic(&path, render_index(repositories).as_bytes())?;
    info!(path = %path.display(), "index document written");
    Ok(path)
}

/// Write the rendered navigation document to `mkdocs.yml`.
#[instrument(skip_all)]
pub fn write_navigation(layout: &WorkspaceLayout, document: &str) -> Result<PathBuf> {
    let root = layout.root();
    std::fs::create_dir_all(root).map_err(|e| DocmeshError::io(root, e))?;

    let path = layout.navigation_path();
    write_atomic(&path, document.as_bytes())?;
    info!(path = %path.display(), bytes = document.len(), "navigation document written");
    Ok(path)
}
