//! Error types for docmesh.
//!
//! Library crates use [`DocmeshError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docmesh operations.
#[derive(Debug, thiserror::Error)]
pub enum DocmeshError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A repository needs a token and none could be resolved.
    #[error("credential error for {repository}: {message}")]
    Credential { repository: String, message: String },

    /// Cloning or updating a working copy failed.
    #[error("sync error for {repository}: {message}")]
    Sync { repository: String, message: String },

    /// Walking a working copy or resolving one of its files failed.
    #[error("crawl error at {path:?}: {message}")]
    Crawl { path: PathBuf, message: String },

    /// The File Map artifact is missing or malformed.
    #[error("artifact error at {path:?}: {message}")]
    Artifact { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocmeshError>;

impl DocmeshError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a credential error for the named repository.
    pub fn credential(repository: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Credential {
            repository: repository.into(),
            message: msg.into(),
        }
    }

    /// Create a sync error for the named repository.
    pub fn sync(repository: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Sync {
            repository: repository.into(),
            message: msg.into(),
        }
    }

    /// Create a crawl error at `path`.
    pub fn crawl(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Crawl {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an artifact error at `path`.
    pub fn artifact(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Artifact {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error may be isolated to one repository when the run
    /// continues past failures.
    pub fn is_per_repository(&self) -> bool {
        matches!(self, Self::Sync { .. } | Self::Crawl { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocmeshError::config("site_name must not be empty");
        assert_eq!(err.to_string(), "config error: site_name must not be empty");

        let err = DocmeshError::sync("docs", "git exited with status 128");
        assert!(err.to_string().contains("sync error for docs"));
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn only_sync_and_crawl_are_per_repository() {
        assert!(DocmeshError::sync("docs", "boom").is_per_repository());
        assert!(DocmeshError::crawl("/tmp/x", "boom").is_per_repository());
        assert!(!DocmeshError::credential("docs", "missing").is_per_repository());
        assert!(!DocmeshError::config("bad").is_per_repository());
        assert!(!DocmeshError::artifact("/tmp/map.json", "bad").is_per_repository());
    }
}
