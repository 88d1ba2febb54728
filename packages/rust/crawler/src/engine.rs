//! Working-copy crawler.
//!
//! Walks one repository's working copy, keeps the Markdown files, and turns
//! each into a [`FileDescriptor`]. Every repository's crawl is an independent
//! value; callers concatenate them in configuration order.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

use docmesh_shared::{
    CategoryMatching, DocmeshError, FileDescriptor, MARKDOWN_EXTENSION, NameMappingRule,
    RepositoryConfig, Result, SiteConfig, normalize, normalize_path,
};

use crate::category::categorize;
use crate::naming::resolve_display_name;

/// Version-control metadata directory never descended into.
const VCS_DIR: &str = ".git";

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// One repository's contribution to the File Map.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Repository identifier.
    pub repository: String,
    /// Descriptors in traversal order.
    pub files: Vec<FileDescriptor>,
    /// Wall time spent walking.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Turns working copies into file descriptors.
#[derive(Debug, Clone)]
pub struct Crawler {
    global_rules: Vec<NameMappingRule>,
    matching: CategoryMatching,
}

impl Crawler {
    /// Create a crawler with the site-wide rules of `config`.
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            global_rules: config.name_mapping.clone(),
            matching: config.category_matching,
        }
    }

    /// Create a crawler from explicit global rules.
    pub fn with_rules(global_rules: Vec<NameMappingRule>, matching: CategoryMatching) -> Self {
        Self {
            global_rules,
            matching,
        }
    }

    /// Walk the working copy at `root` and describe every Markdown file in it.
    ///
    /// Entries are visited sorted by file name at each level. Any listing or
    /// resolution failure aborts the crawl.
    #[instrument(skip_all, fields(repository = %repo.name(), root = %root.display()))]
    pub fn crawl(&self, repo: &RepositoryConfig, root: &Path) -> Result<CrawlResult> {
        let start = Instant::now();
        let repository = repo.name();
        let root = std::path::absolute(root)
            .map_err(|e| DocmeshError::crawl(root, format!("cannot resolve root: {e}")))?;

        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != VCS_DIR);

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(&root, e))?;
            if !is_markdown_file(&entry) {
                continue;
            }

            let relative = entry.path().strip_prefix(&root).map_err(|_| {
                DocmeshError::crawl(entry.path(), "entry escaped the repository root")
            })?;
            let descriptor = self.describe(repo, &repository, &root, relative)?;
            debug!(path = %descriptor.path, name = %descriptor.name, category = %descriptor.category, "discovered");
            files.push(descriptor);
        }

        let duration = start.elapsed();
        info!(
            files = files.len(),
            elapsed_ms = duration.as_millis(),
            "repository crawled"
        );

        Ok(CrawlResult {
            repository,
            files,
            duration,
        })
    }

    /// Build the descriptor of the file at `relative` inside `root`.
    pub fn describe(
        &self,
        repo: &RepositoryConfig,
        repository: &str,
        root: &Path,
        relative: &Path,
    ) -> Result<FileDescriptor> {
        let relative = normalize_path(relative);
        let absolute = normalize(&format!("{}/{}", normalize_path(root).path, relative.path));

        let real_path = std::fs::canonicalize(&absolute.path)
            .map_err(|e| DocmeshError::crawl(PathBuf::from(&absolute.path), e.to_string()))?;

        let name = resolve_display_name(
            &relative.basename,
            relative.parent_segment(),
            &repo.name_mapping,
            &self.global_rules,
        );
        let category = categorize(
            &normalize_path(&real_path).path,
            &repo.categories,
            self.matching,
        );

        Ok(FileDescriptor {
            path: absolute.path,
            name,
            repository: repository.to_string(),
            category,
        })
    }
}

/// Non-directory entries named `*.md`. Links are kept even when their
/// target is missing so that resolution fails loudly in `describe`.
fn is_markdown_file(entry: &DirEntry) -> bool {
    if !entry.file_name().to_string_lossy().ends_with(MARKDOWN_EXTENSION) {
        return false;
    }
    if entry.path_is_symlink() {
        return !entry.path().is_dir();
    }
    !entry.file_type().is_dir()
}

fn walk_error(root: &Path, err: walkdir::Error) -> DocmeshError {
    let path = err.path().unwrap_or(root).to_path_buf();
    DocmeshError::crawl(path, err.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use docmesh_shared::{CategoryRule, FileMap, Transform, UNCATEGORIZED};
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "# doc\n").expect("write");
    }

    fn crawler() -> Crawler {
        Crawler::with_rules(Vec::new(), CategoryMatching::LastRule)
    }

    fn names(result: &CrawlResult) -> Vec<&str> {
        result.files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn crawl_keeps_only_markdown_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "guide.md");
        write(&root, "notes.txt");
        write(&root, "src/lib.rs");
        fs::create_dir_all(root.join("folder.md")).expect("mkdir");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let result = crawler().crawl(&repo, &root).expect("crawl");

        assert_eq!(names(&result), vec!["guide"]);
        assert_eq!(result.repository, "docs");
    }

    #[test]
    fn crawl_matches_readme_scenario() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "guide.md");
        write(&root, "docs/README.md");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let result = crawler().crawl(&repo, &root).expect("crawl");

        // Sorted traversal: "docs" directory before "guide.md".
        assert_eq!(names(&result), vec!["docs", "guide"]);
        for file in &result.files {
            assert_eq!(file.category, UNCATEGORIZED);
            assert_eq!(file.repository, "docs");
        }
    }

    #[test]
    fn root_readme_is_not_renamed() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "README.md");
        write(&root, "setup/README.md");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let result = crawler().crawl(&repo, &root).expect("crawl");

        assert_eq!(names(&result), vec!["README", "setup"]);
    }

    #[test]
    fn crawl_assigns_categories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "lib/components/x.md");
        write(&root, "lib/utils/y.md");

        let mut repo = RepositoryConfig::new("https://example.com/org/docs.git");
        repo.categories.push(CategoryRule {
            name: "Components".into(),
            path: "lib/components".into(),
        });
        let result = crawler().crawl(&repo, &root).expect("crawl");

        let categories: Vec<&str> = result.files.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["Components", UNCATEGORIZED]);
    }

    #[test]
    fn crawl_applies_repository_then_global_rules() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("frontend");
        write(&root, "README-BestPratices.md");
        write(&root, "README-Deploy.md");

        let mut repo = RepositoryConfig::new("https://example.com/org/frontend.git");
        repo.name_mapping.push(NameMappingRule::Table(BTreeMap::from([(
            "README-BestPratices.md".to_string(),
            "Best Practices".to_string(),
        )])));
        let crawler = Crawler::with_rules(
            vec![NameMappingRule::Transform(Transform::StripPrefix(
                "README-".into(),
            ))],
            CategoryMatching::LastRule,
        );

        let result = crawler.crawl(&repo, &root).expect("crawl");
        assert_eq!(names(&result), vec!["Best Practices", "Deploy"]);
    }

    #[test]
    fn crawl_skips_vcs_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, ".git/description.md");
        write(&root, "guide.md");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let result = crawler().crawl(&repo, &root).expect("crawl");
        assert_eq!(names(&result), vec!["guide"]);
    }

    #[test]
    fn descriptor_paths_are_absolute_and_unique() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "a.md");
        write(&root, "nested/a.md");
        write(&root, "nested/deeper/README.md");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let result = crawler().crawl(&repo, &root).expect("crawl");

        let map = FileMap::from(result.files.clone());
        assert_eq!(map.len(), 3);
        assert_eq!(map.duplicate_path(), None);
        for file in &result.files {
            assert!(Path::new(&file.path).is_absolute(), "{}", file.path);
            assert!(!file.path.contains('\\'));
            assert!(file.path.ends_with(".md"));
        }
    }

    #[test]
    fn recrawl_is_deterministic() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        for rel in ["z.md", "a.md", "m/README.md", "m/b.md", "B.md"] {
            write(&root, rel);
        }

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let first = crawler().crawl(&repo, &root).expect("crawl");
        let second = crawler().crawl(&repo, &root).expect("crawl");
        assert_eq!(first.files, second.files);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_markdown_link_is_crawl_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "guide.md");
        std::os::unix::fs::symlink(root.join("gone.md"), root.join("dangling.md"))
            .expect("symlink");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let err = crawler().crawl(&repo, &root).unwrap_err();
        match err {
            DocmeshError::Crawl { path, .. } => assert!(path.ends_with("dangling.md")),
            other => panic!("expected crawl error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn linked_markdown_file_is_kept() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("docs");
        write(&root, "shared/guide.md");
        fs::create_dir_all(root.join("linked.md.d")).expect("mkdir");
        std::os::unix::fs::symlink(root.join("shared/guide.md"), root.join("alias.md"))
            .expect("symlink");
        std::os::unix::fs::symlink(root.join("linked.md.d"), root.join("folder.md"))
            .expect("symlink");

        let repo = RepositoryConfig::new("https://example.com/org/docs.git");
        let result = crawler().crawl(&repo, &root).expect("crawl");
        assert_eq!(names(&result), vec!["alias", "guide"]);
    }

    #[test]
    fn missing_working_copy_is_crawl_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let repo = RepositoryConfig::new("https://example.com/org/docs.git");

        let err = crawler()
            .crawl(&repo, &tmp.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, DocmeshError::Crawl { .. }));
    }
}
