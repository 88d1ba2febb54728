//! CLI command definitions, routing, and tracing setup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docmesh_core::pipeline::{
    self, BuildOptions, BuildReport, ProgressReporter, RepositoryFailure,
};
use docmesh_core::sync::{ENV_FILE_NAME, GitSync, TOKEN_ENV_VAR};
use docmesh_shared::{CONFIG_FILE_NAME, DEFAULT_WORKDIR, SiteConfig, WorkspaceLayout, init_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// One documentation site from many repositories.
#[derive(Parser)]
#[command(
    name = "docmesh",
    version,
    about = "Aggregate Markdown docs from many repositories into one MkDocs site definition.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to the site config file.
    #[arg(short, long, default_value = CONFIG_FILE_NAME, global = true)]
    pub config: PathBuf,

    /// Work directory for working copies and generated files.
    #[arg(short, long, default_value = DEFAULT_WORKDIR, global = true)]
    pub workdir: PathBuf,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Flags shared by commands that clone or pull.
#[derive(clap::Args)]
pub(crate) struct SyncArgs {
    /// Access token for repositories with `needs_token`.
    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    pub token: Option<String>,

    /// Git executable.
    #[arg(long, default_value = "git")]
    pub git: PathBuf,

    /// Skip failing repositories instead of aborting.
    #[arg(long)]
    pub keep_going: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sync, crawl, and render the whole site.
    Build {
        #[command(flatten)]
        sync: SyncArgs,

        /// Crawl the existing working copies without running git.
        #[arg(long)]
        skip_sync: bool,
    },

    /// Clone or update every repository's working copy.
    Sync {
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Crawl existing working copies and save the file map.
    Crawl {
        /// Skip failing repositories instead of aborting.
        #[arg(long)]
        keep_going: bool,
    },

    /// Render the navigation document from the saved file map.
    Render,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a starter config file.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docmesh=info",
        1 => "docmesh=debug",
        _ => "docmesh=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build { sync, skip_sync } => {
            cmd_build(&cli.config, &cli.workdir, &sync, skip_sync).await
        }
        Command::Sync { sync } => cmd_sync(&cli.config, &cli.workdir, &sync).await,
        Command::Crawl { keep_going } => cmd_crawl(&cli.config, &cli.workdir, keep_going),
        Command::Render => cmd_render(&cli.config, &cli.workdir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&cli.config),
            ConfigAction::Show => cmd_config_show(&cli.config),
        },
    }
}

fn load(config_path: &Path, workdir: &Path) -> Result<(SiteConfig, WorkspaceLayout)> {
    let config = SiteConfig::load_from(config_path)?;
    let layout = WorkspaceLayout::new(workdir)?;
    Ok((config, layout))
}

fn build_options(config: &SiteConfig, config_path: &Path, sync: &SyncArgs) -> BuildOptions {
    let env_file = config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(ENV_FILE_NAME);

    BuildOptions {
        skip_sync: false,
        fail_fast: config.fail_fast && !sync.keep_going,
        token: sync.token.clone(),
        env_file,
        git: GitSync::new(&sync.git),
    }
}

async fn cmd_build(config_path: &Path, workdir: &Path, sync: &SyncArgs, skip_sync: bool) -> Result<()> {
    let (config, layout) = load(config_path, workdir)?;
    let options = BuildOptions {
        skip_sync,
        ..build_options(&config, config_path, sync)
    };

    info!(
        site = %config.site_name,
        repositories = config.repositories.len(),
        workdir = %layout.root().display(),
        "building site"
    );

    let reporter = CliProgress::new();
    let report = pipeline::build_site(&config, &layout, &options, &reporter).await?;

    println!();
    println!("  Site definition generated!");
    println!("  Repositories: {}", report.repositories);
    println!("  Files:        {}", report.file_count);
    println!("  File map:     {}", report.file_map_path.display());
    println!("  Navigation:   {}", report.navigation_path.display());
    println!("  Time:         {:.1}s", report.elapsed.as_secs_f64());
    println!();

    fail_on(&report.failures)
}

async fn cmd_sync(config_path: &Path, workdir: &Path, sync: &SyncArgs) -> Result<()> {
    let (config, layout) = load(config_path, workdir)?;
    let options = build_options(&config, config_path, sync);

    println!("Found {} repositories to sync", config.repositories.len());

    let reporter = CliProgress::new();
    let report = pipeline::sync_repositories(&config, &layout, &options, &reporter).await?;
    reporter.finish();

    for (name, action) in &report.synced {
        println!("  {name}: {action}");
    }

    fail_on(&report.failures)
}

fn cmd_crawl(config_path: &Path, workdir: &Path, keep_going: bool) -> Result<()> {
    let (config, layout) = load(config_path, workdir)?;
    let fail_fast = config.fail_fast && !keep_going;

    let reporter = CliProgress::new();
    let report = pipeline::crawl_site(&config, &layout, fail_fast, &HashSet::new(), &reporter)?;
    reporter.finish();

    println!("Found {} .md files", report.file_count);
    println!("  File map: {}", report.file_map_path.display());
    println!("  Index:    {}", report.index_path.display());

    fail_on(&report.failures)
}

fn cmd_render(config_path: &Path, workdir: &Path) -> Result<()> {
    let (config, layout) = load(config_path, workdir)?;

    let reporter = CliProgress::new();
    let (path, files) = pipeline::render_site(&config, &layout, &reporter)?;
    reporter.finish();

    println!("Navigation for {files} files written to {}", path.display());
    Ok(())
}

fn cmd_config_init(config_path: &Path) -> Result<()> {
    let path = init_config(config_path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config = SiteConfig::load_from(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Print a summary of skipped repositories and turn them into an error.
fn fail_on(failures: &[RepositoryFailure]) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    eprintln!("{} repositories failed:", failures.len());
    for failure in failures {
        eprintln!("  {}: {}", failure.repository, failure.error);
    }
    Err(eyre!("{} repositories failed", failures.len()))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn repository(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {name}"));
    }

    fn done(&self, _report: &BuildReport) {
        self.finish();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
