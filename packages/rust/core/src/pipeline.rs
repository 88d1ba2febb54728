//! End-to-end pipeline: sync → crawl → save File Map → index → render.
//!
//! Stages run strictly one after another. The crawl stage produces one
//! ordered list per repository and concatenates them in configuration
//! order; the render stage reads only the saved File Map.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};

use docmesh_crawler::Crawler;
use docmesh_shared::{
    DocmeshError, FileMap, Result, SiteConfig, WorkspaceLayout, normalize_path,
};
use docmesh_storage::FileMapStore;

use crate::nav::render_navigation;
use crate::site;
use crate::sync::{GitSync, SyncAction, resolve_token};

/// Runtime options merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Crawl existing working copies without touching git.
    pub skip_sync: bool,
    /// Abort on the first repository failure.
    pub fail_fast: bool,
    /// Token passed on the command line or via the environment.
    pub token: Option<String>,
    /// JSON env file consulted when no explicit token is given.
    pub env_file: PathBuf,
    /// Git runner.
    pub git: GitSync,
}

impl BuildOptions {
    /// Options derived from `config` alone.
    pub fn from_config(config: &SiteConfig, env_file: impl Into<PathBuf>) -> Self {
        Self {
            skip_sync: false,
            fail_fast: config.fail_fast,
            token: None,
            env_file: env_file.into(),
            git: GitSync::default(),
        }
    }
}

/// A repository skipped because it failed while the run kept going.
#[derive(Debug)]
pub struct RepositoryFailure {
    pub repository: String,
    pub error: DocmeshError,
}

/// Outcome of the sync stage.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// `(repository, action)` for each synced repository.
    pub synced: Vec<(String, SyncAction)>,
    pub failures: Vec<RepositoryFailure>,
}

/// Outcome of the crawl stage.
#[derive(Debug)]
pub struct CrawlReport {
    pub file_count: usize,
    pub file_map_path: PathBuf,
    pub index_path: PathBuf,
    pub failures: Vec<RepositoryFailure>,
}

/// Outcome of a full build.
#[derive(Debug)]
pub struct BuildReport {
    /// Repositories that made it into the navigation without failing.
    pub repositories: usize,
    pub file_count: usize,
    pub file_map_path: PathBuf,
    pub navigation_path: PathBuf,
    pub failures: Vec<RepositoryFailure>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a repository is synced or crawled.
    fn repository(&self, name: &str, current: usize, total: usize);
    /// Called when a full build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn repository(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &BuildReport) {}
}

/// Record a repository failure, or return it when the run must stop.
fn isolate(
    failures: &mut Vec<RepositoryFailure>,
    repository: String,
    err: DocmeshError,
    fail_fast: bool,
) -> Result<()> {
    if fail_fast || !err.is_per_repository() {
        return Err(err);
    }
    warn!(%repository, error = %err, "repository failed, continuing");
    failures.push(RepositoryFailure {
        repository,
        error: err,
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Clone or update every configured repository, in order.
///
/// The token is resolved before any git work starts when any repository
/// needs one; a missing token aborts the run.
#[instrument(skip_all, fields(repositories = config.repositories.len()))]
pub async fn sync_repositories(
    config: &SiteConfig,
    layout: &WorkspaceLayout,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<SyncReport> {
    progress.phase("Syncing repositories");
    site::prepare(layout)?;

    let token = match config.token_repository() {
        Some(repo) => Some(resolve_token(
            options.token.as_deref(),
            &options.env_file,
            &repo.name(),
        )?),
        None => None,
    };

    let total = config.repositories.len();
    let mut report = SyncReport::default();

    for (i, repo) in config.repositories.iter().enumerate() {
        let name = repo.name();
        progress.repository(&name, i + 1, total);

        let dest = layout.repository_dir(&name);
        match options.git.sync(repo, &dest, token.as_deref()).await {
            Ok(action) => {
                info!(repository = %name, %action, "repository synced");
                report.synced.push((name, action));
            }
            Err(e) => isolate(&mut report.failures, name, e, options.fail_fast)?,
        }
    }

    info!(
        synced = report.synced.len(),
        failed = report.failures.len(),
        "all repositories processed"
    );
    Ok(report)
}

/// Crawl every working copy not in `skip`, returning the concatenated File Map.
#[instrument(skip_all, fields(repositories = config.repositories.len()))]
pub fn crawl_repositories(
    config: &SiteConfig,
    layout: &WorkspaceLayout,
    fail_fast: bool,
    skip: &HashSet<String>,
    progress: &dyn ProgressReporter,
) -> Result<(FileMap, Vec<RepositoryFailure>)> {
    progress.phase("Crawling working copies");

    let crawler = Crawler::new(config);
    let total = config.repositories.len();
    let mut file_map = FileMap::new();
    let mut failures = Vec::new();

    for (i, repo) in config.repositories.iter().enumerate() {
        let name = repo.name();
        if skip.contains(&name) {
            continue;
        }
        progress.repository(&name, i + 1, total);

        match crawler.crawl(repo, &layout.repository_dir(&name)) {
            Ok(result) => {
                debug!(
                    repository = %result.repository,
                    files = result.files.len(),
                    elapsed_ms = result.duration.as_millis(),
                    "crawl result merged"
                );
                file_map.extend(result.files);
            }
            Err(e) => isolate(&mut failures, name, e, fail_fast)?,
        }
    }

    info!(files = file_map.len(), "found markdown files");
    Ok((file_map, failures))
}

/// Crawl, persist the File Map, and write the landing page.
///
/// Nothing is persisted if the crawl aborts.
pub fn crawl_site(
    config: &SiteConfig,
    layout: &WorkspaceLayout,
    fail_fast: bool,
    skip: &HashSet<String>,
    progress: &dyn ProgressReporter,
) -> Result<CrawlReport> {
    let (file_map, failures) = crawl_repositories(config, layout, fail_fast, skip, progress)?;

    progress.phase("Saving file map");
    let store = FileMapStore::new(layout.file_map_path());
    store.save(&file_map)?;

    let index_path = site::write_index(layout, &config.repositories)?;

    Ok(CrawlReport {
        file_count: file_map.len(),
        file_map_path: store.path().to_path_buf(),
        index_path,
        failures,
    })
}

/// Load the saved File Map and write the navigation document.
///
/// Returns the document path and the number of files in the map.
#[instrument(skip_all)]
pub fn render_site(
    config: &SiteConfig,
    layout: &WorkspaceLayout,
    progress: &dyn ProgressReporter,
) -> Result<(PathBuf, usize)> {
    progress.phase("Rendering navigation");

    let file_map = FileMapStore::new(layout.file_map_path()).load()?;
    let docs_root = normalize_path(&layout.docs_dir()).path;
    let document = render_navigation(
        &file_map,
        &config.repositories,
        &config.site_name,
        &docs_root,
    );

    let path = site::write_navigation(layout, &document)?;
    Ok((path, file_map.len()))
}

/// Run the full pipeline.
#[instrument(skip_all, fields(site = %config.site_name))]
pub async fn build_site(
    config: &SiteConfig,
    layout: &WorkspaceLayout,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let start = Instant::now();
    info!(
        repositories = config.repositories.len(),
        skip_sync = options.skip_sync,
        fail_fast = options.fail_fast,
        "starting build"
    );

    let mut failures = Vec::new();
    if !options.skip_sync {
        let sync = sync_repositories(config, layout, options, progress).await?;
        failures.extend(sync.failures);
    }

    let skip: HashSet<String> = failures.iter().map(|f| f.repository.clone()).collect();
    let crawl = crawl_site(config, layout, options.fail_fast, &skip, progress)?;
    failures.extend(crawl.failures);

    let (navigation_path, file_count) = render_site(config, layout, progress)?;

    let report = BuildReport {
        repositories: config.repositories.len() - failures.len(),
        file_count,
        file_map_path: crawl.file_map_path,
        navigation_path,
        failures,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    if report.failures.is_empty() {
        info!(
            files = report.file_count,
            elapsed_ms = report.elapsed.as_millis(),
            "build complete"
        );
    } else {
        error!(
            failed = report.failures.len(),
            files = report.file_count,
            "build finished with failed repositories"
        );
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
