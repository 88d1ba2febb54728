//! Navigation document and landing page rendering.
//!
//! Groups the File Map into a [`NavTree`] (repository → category → files)
//! and renders it as the `mkdocs.yml` consumed by the site generator. Both
//! renderers are pure functions of their inputs.

use std::borrow::Cow;
use std::fmt::Write as _;

use tracing::{debug, instrument, warn};

use docmesh_shared::{FileDescriptor, FileMap, RepositoryConfig, UNCATEGORIZED, relative_to};

/// Fixed `site_description` of the navigation document.
pub const SITE_DESCRIPTION: &str = "This is a site generated by docmesh";

/// Fixed `theme` of the navigation document.
pub const THEME: &str = "readthedocs";

/// Landing document the `Home` entry points at, relative to the docs root.
pub const INDEX_DOCUMENT: &str = "index.md";

/// Indentation of file entries directly under a repository.
const UNCATEGORIZED_INDENT: usize = 4;

/// Indentation of file entries under a category.
const CATEGORIZED_INDENT: usize = 6;

// ---------------------------------------------------------------------------
// NavTree
// ---------------------------------------------------------------------------

/// Render-time grouping of a File Map. Borrows the descriptors.
#[derive(Debug)]
pub struct NavTree<'a> {
    /// Repositories in configuration order.
    pub repositories: Vec<RepositoryNav<'a>>,
}

/// One repository's navigation group.
#[derive(Debug)]
pub struct RepositoryNav<'a> {
    pub name: String,
    /// Categories in first-seen order.
    pub categories: Vec<CategoryNav<'a>>,
}

/// Files sharing a category label, in File Map order.
#[derive(Debug)]
pub struct CategoryNav<'a> {
    pub label: &'a str,
    pub files: Vec<&'a FileDescriptor>,
}

impl CategoryNav<'_> {
    pub fn is_uncategorized(&self) -> bool {
        self.label == UNCATEGORIZED
    }
}

impl<'a> NavTree<'a> {
    /// Group `file_map` under the configured repositories.
    ///
    /// Every configured repository gets a group, even an empty one.
    /// Descriptors of unconfigured repositories are dropped.
    pub fn build(file_map: &'a FileMap, repositories: &[RepositoryConfig]) -> Self {
        let mut groups: Vec<RepositoryNav<'a>> = repositories
            .iter()
            .map(|repo| RepositoryNav {
                name: repo.name(),
                categories: Vec::new(),
            })
            .collect();

        for file in file_map {
            let Some(group) = groups.iter_mut().find(|g| g.name == file.repository) else {
                warn!(
                    repository = %file.repository,
                    path = %file.path,
                    "file belongs to an unconfigured repository, skipping"
                );
                continue;
            };

            match group
                .categories
                .iter_mut()
                .find(|c| c.label == file.category)
            {
                Some(category) => category.files.push(file),
                None => group.categories.push(CategoryNav {
                    label: &file.category,
                    files: vec![file],
                }),
            }
        }

        Self {
            repositories: groups,
        }
    }

    /// Number of files placed in the tree.
    pub fn file_count(&self) -> usize {
        self.repositories
            .iter()
            .flat_map(|r| &r.categories)
            .map(|c| c.files.len())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the navigation document.
///
/// File paths are written relative to `docs_root`.
#[instrument(skip_all, fields(files = file_map.len(), repositories = repositories.len()))]
pub fn render_navigation(
    file_map: &FileMap,
    repositories: &[RepositoryConfig],
    site_name: &str,
    docs_root: &str,
) -> String {
    let tree = NavTree::build(file_map, repositories);

    let mut out = String::new();
    // Writing to a String never fails.
    let _ = writeln!(out, "site_name: {}", yaml_scalar(site_name));
    let _ = writeln!(out, "site_description: {SITE_DESCRIPTION}");
    let _ = writeln!(out, "theme: {THEME}");
    out.push_str("nav:\n");
    let _ = writeln!(out, "  - Home: {INDEX_DOCUMENT}");

    for repo in &tree.repositories {
        let _ = writeln!(out, "  - {}:", yaml_scalar(&repo.name));

        for category in &repo.categories {
            let indent = if category.is_uncategorized() {
                UNCATEGORIZED_INDENT
            } else {
                let _ = writeln!(out, "    - {}:", yaml_scalar(category.label));
                CATEGORIZED_INDENT
            };

            for file in &category.files {
                let path = relative_path(file, docs_root);
                let _ = writeln!(
                    out,
                    "{:indent$}- {}: {}",
                    "",
                    yaml_scalar(&file.name),
                    yaml_scalar(&path)
                );
            }
        }
    }

    debug!(entries = tree.file_count(), "navigation rendered");
    out
}

/// Render the landing page listing every repository's source URL.
pub fn render_index(repositories: &[RepositoryConfig]) -> String {
    let mut out = String::from("# Welcome to docmesh\n\n");
    let _ = writeln!(out, "{SITE_DESCRIPTION}\n");
    out.push_str("## Repositories\n\n");
    for repo in repositories {
        let _ = writeln!(out, "- [{url}]({url})", url = repo.url);
    }
    out
}

/// Characters that cannot start a plain YAML scalar.
const YAML_INDICATORS: &[char] = &[
    '[', ']', '{', '}', ',', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`', '#',
];

/// Write `value` as a plain scalar when YAML reads it back unchanged,
/// otherwise as a double-quoted one.
fn yaml_scalar(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value != value.trim()
        || value.starts_with(YAML_INDICATORS)
        || value.starts_with("- ")
        || value.starts_with("? ")
        || value.starts_with(": ")
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.contains(|c: char| c.is_control());

    if !needs_quotes {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", u32::from(c));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

fn relative_path(file: &FileDescriptor, docs_root: &str) -> String {
    relative_to(&file.path, docs_root).unwrap_or_else(|| {
        warn!(path = %file.path, docs_root, "file lies outside the docs root");
        file.path.clone()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use docmesh_shared::CategoryRule;
    use pretty_assertions::assert_eq;

    use super::*;

    const ROOT: &str = "/w/.docmesh/docs";

    fn file(repo: &str, rel: &str, name: &str, category: &str) -> FileDescriptor {
        FileDescriptor {
            path: format!("{ROOT}/{repo}/{rel}"),
            name: name.into(),
            repository: repo.into(),
            category: category.into(),
        }
    }

    fn repos() -> Vec<RepositoryConfig> {
        let mut frontend = RepositoryConfig::new("https://example.com/org/frontend.git");
        frontend.categories.push(CategoryRule {
            name: "Components".into(),
            path: "lib/components".into(),
        });
        vec![
            frontend,
            RepositoryConfig::new("https://example.com/org/backend.git"),
        ]
    }

    fn sample_map() -> FileMap {
        FileMap::from(vec![
            file("frontend", "guide.md", "guide", UNCATEGORIZED),
            file("frontend", "lib/components/button.md", "button", "Components"),
            file("backend", "api/README.md", "api", UNCATEGORIZED),
            file("frontend", "lib/components/input.md", "input", "Components"),
            file("frontend", "setup.md", "setup", UNCATEGORIZED),
        ])
    }

    #[test]
    fn render_matches_expected_document() {
        let doc = render_navigation(&sample_map(), &repos(), "Team Docs", ROOT);
        let expected = "\
site_name: Team Docs
site_description: This is a site generated by docmesh
theme: readthedocs
nav:
  - Home: index.md
  - frontend:
    - guide: frontend/guide.md
    - setup: frontend/setup.md
    - Components:
      - button: frontend/lib/components/button.md
      - input: frontend/lib/components/input.md
  - backend:
    - api: backend/api/README.md
";
        assert_eq!(doc, expected);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let map = FileMap::from(vec![
            file("frontend", "lib/components/a.md", "a", "Components"),
            file("frontend", "b.md", "b", UNCATEGORIZED),
        ]);
        let tree = NavTree::build(&map, &repos());
        let labels: Vec<&str> = tree.repositories[0]
            .categories
            .iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["Components", UNCATEGORIZED]);
    }

    #[test]
    fn repositories_follow_configuration_order() {
        let map = FileMap::from(vec![
            file("backend", "a.md", "a", UNCATEGORIZED),
            file("frontend", "b.md", "b", UNCATEGORIZED),
        ]);
        let tree = NavTree::build(&map, &repos());
        let names: Vec<&str> = tree.repositories.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["frontend", "backend"]);
    }

    #[test]
    fn empty_repository_still_gets_a_group() {
        let doc = render_navigation(&FileMap::new(), &repos(), "Docs", ROOT);
        assert!(doc.ends_with("  - frontend:\n  - backend:\n"));
    }

    #[test]
    fn unconfigured_repository_is_dropped() {
        let map = FileMap::from(vec![
            file("frontend", "a.md", "a", UNCATEGORIZED),
            file("legacy", "b.md", "b", UNCATEGORIZED),
        ]);
        let tree = NavTree::build(&map, &repos());
        assert_eq!(tree.file_count(), 1);

        let doc = render_navigation(&map, &repos(), "Docs", ROOT);
        assert!(!doc.contains("legacy"));
    }

    #[test]
    fn file_outside_root_keeps_absolute_path() {
        let map = FileMap::from(vec![FileDescriptor {
            path: "/elsewhere/x.md".into(),
            name: "x".into(),
            repository: "backend".into(),
            category: UNCATEGORIZED.into(),
        }]);
        let doc = render_navigation(&map, &repos(), "Docs", ROOT);
        assert!(doc.contains("    - x: /elsewhere/x.md\n"));
    }

    #[test]
    fn render_is_deterministic() {
        let map = sample_map();
        let first = render_navigation(&map, &repos(), "Docs", ROOT);
        let second = render_navigation(&map, &repos(), "Docs", ROOT);
        assert_eq!(first, second);
    }

    #[test]
    fn rendered_document_is_valid_yaml() {
        let doc = render_navigation(&sample_map(), &repos(), "Docs", ROOT);
        let value: serde_yaml::Value = serde_yaml::from_str(&doc).expect("parse yaml");

        assert_eq!(value["theme"].as_str(), Some(THEME));
        let nav = value["nav"].as_sequence().expect("nav sequence");
        assert_eq!(nav.len(), 3);
        assert_eq!(nav[0]["Home"].as_str(), Some(INDEX_DOCUMENT));

        let frontend = nav[1]["frontend"].as_sequence().expect("frontend items");
        assert_eq!(frontend.len(), 3);
        let components = frontend[2]["Components"]
            .as_sequence()
            .expect("category items");
        assert_eq!(
            components[0]["button"].as_str(),
            Some("frontend/lib/components/button.md")
        );
    }

    #[test]
    fn names_with_yaml_syntax_are_quoted() {
        let map = FileMap::from(vec![
            file("backend", "a/FAQ: setup.md", "FAQ: setup", UNCATEGORIZED),
            file("backend", "b/#notes.md", "#notes", UNCATEGORIZED),
            file("backend", "c/say \"hi\".md", "[draft] say \"hi\"", UNCATEGORIZED),
        ]);
        let doc = render_navigation(&map, &repos(), "Docs: internal", ROOT);

        assert!(doc.starts_with("site_name: \"Docs: internal\"\n"));
        assert!(doc.contains("    - \"FAQ: setup\": \"backend/a/FAQ: setup.md\"\n"));
        assert!(doc.contains("    - \"#notes\": backend/b/#notes.md\n"));

        let value: serde_yaml::Value = serde_yaml::from_str(&doc).expect("parse yaml");
        assert_eq!(value["site_name"].as_str(), Some("Docs: internal"));
        let backend = value["nav"][2]["backend"]
            .as_sequence()
            .expect("backend items");
        assert_eq!(
            backend[0]["FAQ: setup"].as_str(),
            Some("backend/a/FAQ: setup.md")
        );
        assert_eq!(backend[1]["#notes"].as_str(), Some("backend/b/#notes.md"));
        assert_eq!(
            backend[2]["[draft] say \"hi\""].as_str(),
            Some("backend/c/say \"hi\".md")
        );
    }

    #[test]
    fn plain_scalars_are_left_alone() {
        for plain in ["guide", "Best Practices", "frontend/lib/components/x.md", "C#", "a:b"] {
            assert_eq!(yaml_scalar(plain), plain);
        }
        assert_eq!(yaml_scalar("a: b"), "\"a: b\"");
        assert_eq!(yaml_scalar(""), "\"\"");
        assert_eq!(yaml_scalar("back\\slash: x"), "\"back\\\\slash: x\"");
    }

    #[test]
    fn index_lists_repository_urls() {
        let index = render_index(&repos());
        let expected = "\
# Welcome to docmesh

This is a site generated by docmesh

## Repositories

- [https://example.com/org/frontend.git](https://example.com/org/frontend.git)
- [https://example.com/org/backend.git](https://example.com/org/backend.git)
";
        assert_eq!(index, expected);
    }
}
