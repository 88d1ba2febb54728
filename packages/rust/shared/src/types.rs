//! Core domain types for docmesh.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category label assigned to files no rule claims.
pub const UNCATEGORIZED: &str = "uncategorized";

/// File extension (with dot) of the documents docmesh collects.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Index-style file name renamed to its parent directory outside the
/// repository root.
pub const INDEX_FILE_NAME: &str = "README.md";

// ---------------------------------------------------------------------------
// FileDescriptor / FileMap
// ---------------------------------------------------------------------------

/// One discovered Markdown file.
///
/// Field order is the artifact's field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Absolute forward-slash path of the file.
    pub path: String,
    /// Display name, extension stripped.
    pub name: String,
    /// Identifier (directory name) of the owning repository.
    pub repository: String,
    /// Category label, or [`UNCATEGORIZED`].
    pub category: String,
}

/// Ordered list of descriptors in discovery order. Serialized as a bare
/// JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMap(Vec<FileDescriptor>);

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one repository's contribution, keeping its order.
    pub fn extend(&mut self, descriptors: impl IntoIterator<Item = FileDescriptor>) {
        self.0.extend(descriptors);
    }

    pub fn push(&mut self, descriptor: FileDescriptor) {
        self.0.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileDescriptor> {
        self.0.iter()
    }

    /// First path that appears more than once, if any.
    pub fn duplicate_path(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.0
            .iter()
            .map(|d| d.path.as_str())
            .find(|path| !seen.insert(*path))
    }
}

impl From<Vec<FileDescriptor>> for FileMap {
    fn from(descriptors: Vec<FileDescriptor>) -> Self {
        Self(descriptors)
    }
}

impl FromIterator<FileDescriptor> for FileMap {
    fn from_iter<I: IntoIterator<Item = FileDescriptor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FileMap {
    type Item = &'a FileDescriptor;
    type IntoIter = std::slice::Iter<'a, FileDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// CategoryRule
// ---------------------------------------------------------------------------

/// Label assigned to files whose resolved path contains `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub path: String,
}

/// How an ordered list of [`CategoryRule`]s picks a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMatching {
    /// Each rule overwrites the running label: a match sets the rule's
    /// label, a miss resets to [`UNCATEGORIZED`]. Only the last rule
    /// effectively decides.
    #[default]
    LastRule,
    /// The first rule whose path is contained wins.
    FirstMatch,
}

// ---------------------------------------------------------------------------
// NameMappingRule
// ---------------------------------------------------------------------------

/// One link in a display-name rewrite chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMappingRule {
    /// Exact-match lookup; unmatched names pass through.
    Table(BTreeMap<String, String>),
    /// Unconditional rewrite.
    Transform(Transform),
}

impl NameMappingRule {
    /// Apply this rule to `name`.
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Table(entries) => entries
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string()),
            Self::Transform(transform) => transform.apply(name),
        }
    }
}

/// Declarative basename rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },
    /// Remove a leading prefix when present.
    StripPrefix(String),
    /// Remove a trailing suffix when present.
    StripSuffix(String),
    /// Replace every regex match; `$1` style references are expanded.
    Regex(RegexTransform),
}

impl Transform {
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Replace { from, to } if !from.is_empty() => name.replace(from.as_str(), to),
            Self::Replace { .. } => name.to_string(),
            Self::StripPrefix(prefix) => {
                name.strip_prefix(prefix.as_str()).unwrap_or(name).to_string()
            }
            Self::StripSuffix(suffix) => {
                name.strip_suffix(suffix.as_str()).unwrap_or(name).to_string()
            }
            Self::Regex(re) => re.apply(name),
        }
    }
}

/// A compiled regex rewrite. Compilation happens on deserialization, so an
/// invalid pattern surfaces as a config parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRegex", into = "RawRegex")]
pub struct RegexTransform {
    regex: Regex,
    replacement: String,
}

impl RegexTransform {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    fn apply(&self, name: &str) -> String {
        self.regex
            .replace_all(name, self.replacement.as_str())
            .into_owned()
    }
}

#[derive(Serialize, Deserialize)]
struct RawRegex {
    pattern: String,
    #[serde(default)]
    replacement: String,
}

impl TryFrom<RawRegex> for RegexTransform {
    type Error = regex::Error;

    fn try_from(raw: RawRegex) -> Result<Self, Self::Error> {
        Self::new(&raw.pattern, raw.replacement)
    }
}

impl From<RegexTransform> for RawRegex {
    fn from(transform: RegexTransform) -> Self {
        Self {
            pattern: transform.regex.as_str().to_string(),
            replacement: transform.replacement,
        }
    }
}
