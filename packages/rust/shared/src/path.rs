//! Portable path normalization.
//!
//! Every path that ends up in the File Map or the navigation document goes
//! through [`normalize`] so that crawling the same tree on hosts with
//! different separator conventions yields identical strings.

use std::path::Path;

/// A forward-slash path plus its final segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// Canonical forward-slash form.
    pub path: String,
    /// Final path segment (`.` for an empty relative path, `/` for the root).
    pub basename: String,
}

impl NormalizedPath {
    /// Final segment of the parent directory, or `None` when the parent is
    /// the root of the (relative) path.
    pub fn parent_segment(&self) -> Option<&str> {
        let (parent, _) = self.path.rsplit_once('/')?;
        let segment = parent.rsplit('/').next().unwrap_or(parent);
        match segment {
            "" | "." => None,
            s => Some(s),
        }
    }
}

/// Normalize `raw` to a forward-slash path and split off its basename.
///
/// Backslashes are treated as separators, empty and `.` segments are
/// dropped, and `..` is resolved lexically. Never fails.
pub fn normalize(raw: &str) -> NormalizedPath {
    let unified = raw.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` cannot climb above an absolute root
                _ if absolute => {}
                _ => segments.push(".."),
            },
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    let path = match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    };

    let basename = match segments.last() {
        Some(last) => (*last).to_string(),
        None => path.clone(),
    };

    NormalizedPath { path, basename }
}

/// Normalize a `Path` via its lossy string form.
pub fn normalize_path(path: &Path) -> NormalizedPath {
    normalize(&path.to_string_lossy())
}

/// Make `path` relative to `root`, both compared in normalized form.
///
/// Returns `None` when `path` is not inside `root`.
pub fn relative_to(path: &str, root: &str) -> Option<String> {
    let path = normalize(path).path;
    let root = normalize(root).path;

    if path == root {
        return Some(".".to_string());
    }

    let prefix = if root.ends_with('/') {
        root
    } else {
        format!("{root}/")
    };
    path.strip_prefix(&prefix).map(str::to_string)
}
