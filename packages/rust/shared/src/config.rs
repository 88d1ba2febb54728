//! Site configuration for docmesh.
//!
//! The config lives in `docmesh.toml` (by default in the current directory).
//! CLI flags override the few values that can also be set there.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocmeshError, Result};
use crate::types::{CategoryMatching, CategoryRule, NameMappingRule, UNCATEGORIZED};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docmesh.toml";

/// Default work directory holding working copies and generated files.
pub const DEFAULT_WORKDIR: &str = ".docmesh";

/// Version-control suffix stripped from the last URL segment.
const VCS_SUFFIX: &str = ".git";

/// Starter config written by `docmesh config init`.
const STARTER_CONFIG: &str = r#"# docmesh site configuration
site_name = "Technical Documentation"

# "last_rule": only the last category rule decides (a miss resets to uncategorized)
# "first_match": the first rule whose path matches wins
category_matching = "last_rule"

# Stop at the first failing repository. Set to false to skip failing
# repositories and report them at the end.
fail_fast = true

[[repositories]]
url = "https://github.com/<organization>/<repository>.git"
needs_token = false

# [[repositories.categories]]
# name = "Components"
# path = "lib/components"

# [[repositories.name_mapping]]
# table = { "README-BestPractices.md" = "Best Practices" }

# Applied to every repository, after its own rules.
# [[name_mapping]]
# transform = { strip_prefix = "README-" }
"#;

// ---------------------------------------------------------------------------
// Config structs (matching docmesh.toml schema)
// ---------------------------------------------------------------------------

/// Top-level site config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Title of the generated site.
    pub site_name: String,

    /// Category rule evaluation mode.
    #[serde(default)]
    pub category_matching: CategoryMatching,

    /// Abort the whole run on the first repository failure.
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    /// Source repositories, in navigation order.
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    /// Global name mapping rules, applied after each repository's own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_mapping: Vec<NameMappingRule>,
}

fn default_true() -> bool {
    true
}

/// `[[repositories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Clone URL, without credentials.
    pub url: String,

    /// Explicit working-copy directory name (defaults to the URL's last segment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Whether cloning requires a token.
    #[serde(default)]
    pub needs_token: bool,

    /// Category rules, evaluated in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRule>,

    /// Repository-specific name mapping rules, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_mapping: Vec<NameMappingRule>,
}

impl RepositoryConfig {
    /// A repository with no rules.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            directory: None,
            needs_token: false,
            categories: Vec::new(),
            name_mapping: Vec::new(),
        }
    }

    /// Identifier and working-copy directory name.
    ///
    /// `https://example.com/org/docs.git` → `docs`.
    pub fn name(&self) -> String {
        if let Some(dir) = self.directory.as_deref().filter(|d| !d.is_empty()) {
            return dir.to_string();
        }
        directory_from_url(&self.url)
    }

    /// The clone URL with `token` embedded as HTTPS user info.
    ///
    /// Non-HTTPS URLs (local paths, `ssh://`, scp-style) are returned
    /// unchanged.
    pub fn authenticated_url(&self, token: &str) -> Result<String> {
        let Ok(mut url) = Url::parse(&self.url) else {
            return Ok(self.url.clone());
        };
        if url.scheme() != "https" {
            return Ok(self.url.clone());
        }
        url.set_username(token).map_err(|()| {
            DocmeshError::credential(self.name(), "URL cannot carry credentials")
        })?;
        Ok(url.into())
    }
}

/// Last path segment of `url` with any `.git` suffix stripped.
pub fn directory_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let segment = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or(trimmed);
    segment
        .strip_suffix(VCS_SUFFIX)
        .unwrap_or(segment)
        .to_string()
}

impl SiteConfig {
    /// Check structural invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.site_name.trim().is_empty() {
            return Err(DocmeshError::config("site_name must not be empty"));
        }

        let mut seen = HashSet::new();
        for (index, repo) in self.repositories.iter().enumerate() {
            if repo.url.trim().is_empty() {
                return Err(DocmeshError::config(format!(
                    "repositories[{index}]: url must not be empty"
                )));
            }

            let name = repo.name();
            if name.is_empty() || name == "." || name == ".." {
                return Err(DocmeshError::config(format!(
                    "repositories[{index}]: cannot derive a directory name from '{}'",
                    repo.url
                )));
            }
            if name.contains(['/', '\\']) {
                return Err(DocmeshError::config(format!(
                    "repositories[{index}]: directory '{name}' must be a single path segment"
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(DocmeshError::config(format!(
                    "repositories[{index}]: directory '{name}' is used by more than one repository"
                )));
            }

            for category in &repo.categories {
                if category.name.trim().is_empty() || category.path.trim().is_empty() {
                    return Err(DocmeshError::config(format!(
                        "repository '{name}': category name and path must not be empty"
                    )));
                }
                if category.name == UNCATEGORIZED {
                    return Err(DocmeshError::config(format!(
                        "repository '{name}': category name '{UNCATEGORIZED}' is reserved"
                    )));
                }
            }
        }

        Ok(())
    }

    /// First repository that requires a token, if any.
    pub fn token_repository(&self) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.needs_token)
    }

    /// Load and validate the config at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocmeshError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            DocmeshError::config(format!("failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;
        tracing::debug!(
            ?path,
            repositories = config.repositories.len(),
            "config loaded"
        );
        Ok(config)
    }
}

/// Write the starter config to `path`. Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(DocmeshError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DocmeshError::io(parent, e))?;
    }

    std::fs::write(path, STARTER_CONFIG).map_err(|e| DocmeshError::io(path, e))?;
    tracing::info!(?path, "created starter config file");

    Ok(path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Workspace layout
// ---------------------------------------------------------------------------

/// Paths under the work directory.
///
/// ```text
/// <root>/
/// ├── docs/
/// │   ├── index.md
/// │   └── <repository>/...
/// ├── files-map.json
/// └── mkdocs.yml
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    /// Anchor the layout at `root`, made absolute against the current
    /// directory so descriptor paths are absolute.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = std::path::absolute(root).map_err(|e| DocmeshError::io(root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the static-site generator treats as its docs root.
    pub fn docs_dir(&self) -> PathBuf {
        self.root.join("docs")
    }

    /// Working copy of the repository named `name`.
    pub fn repository_dir(&self, name: &str) -> PathBuf {
        self.docs_dir().join(name)
    }

    pub fn file_map_path(&self) -> PathBuf {
        self.root.join("files-map.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.docs_dir().join("index.md")
    }

    pub fn navigation_path(&self) -> PathBuf {
        self.root.join("mkdocs.yml")
    }
}
