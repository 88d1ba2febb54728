//! Working-copy sync and credential resolution.
//!
//! [`GitSync`] clones a repository on first use and pulls on later runs.
//! Tokens for private repositories come from [`resolve_token`] and are only
//! ever placed in the clone URL, never logged.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use docmesh_shared::{DocmeshError, RepositoryConfig, Result};

/// Env file looked up next to the config file.
pub const ENV_FILE_NAME: &str = "docmesh.env.json";

/// Environment variable the CLI reads the token from.
pub const TOKEN_ENV_VAR: &str = "DOCMESH_TOKEN";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EnvFile {
    #[serde(default)]
    token: Option<String>,
}

/// Resolve the access token for private repositories.
///
/// An explicit, non-empty token wins; otherwise `env_file` is read and its
/// `token` field used. `repository` names the repository that needed it.
pub fn resolve_token(explicit: Option<&str>, env_file: &Path, repository: &str) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        debug!("using token from command line or environment");
        return Ok(token.to_string());
    }

    let content = std::fs::read_to_string(env_file).map_err(|e| {
        DocmeshError::credential(
            repository,
            format!(
                "a token is required but {TOKEN_ENV_VAR} is unset and {} cannot be read: {e}",
                env_file.display()
            ),
        )
    })?;

    let parsed: EnvFile = serde_json::from_str(&content).map_err(|e| {
        DocmeshError::credential(
            repository,
            format!("{} is not valid JSON: {e}", env_file.display()),
        )
    })?;

    parsed
        .token
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| {
            DocmeshError::credential(
                repository,
                format!("{} has no token", env_file.display()),
            )
        })
}

// ---------------------------------------------------------------------------
// GitSync
// ---------------------------------------------------------------------------

/// What a sync did to a working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Updated,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloned => write!(f, "cloned"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Clones or pulls working copies with the `git` command line.
#[derive(Debug, Clone)]
pub struct GitSync {
    program: PathBuf,
}

impl Default for GitSync {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitSync {
    /// Use `program` as the git executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Bring the working copy at `dest` up to date.
    ///
    /// `token` is required when the repository needs one; it is embedded in
    /// the clone URL only.
    #[instrument(skip_all, fields(repository = %repo.name(), dest = %dest.display()))]
    pub async fn sync(
        &self,
        repo: &RepositoryConfig,
        dest: &Path,
        token: Option<&str>,
    ) -> Result<SyncAction> {
        let name = repo.name();

        if dest.exists() {
            info!(url = %repo.url, "updating working copy");
            self.run(&name, |cmd| {
                cmd.arg("-C").arg(dest).arg("pull").arg("--ff-only");
            })
            .await?;
            return Ok(SyncAction::Updated);
        }

        let url = match (repo.needs_token, token) {
            (true, Some(token)) => repo.authenticated_url(token)?,
            (true, None) => {
                return Err(DocmeshError::credential(&name, "a token is required"));
            }
            (false, _) => repo.url.clone(),
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocmeshError::io(parent, e))?;
        }

        info!(url = %repo.url, "cloning working copy");
        self.run(&name, |cmd| {
            cmd.arg("clone").arg(&url).arg(dest);
        })
        .await?;
        Ok(SyncAction::Cloned)
    }

    async fn run(&self, repository: &str, configure: impl FnOnce(&mut Command)) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure(&mut cmd);

        let output = cmd.output().await.map_err(|e| {
            DocmeshError::sync(
                repository,
                format!("failed to run {}: {e}", self.program.display()),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocmeshError::sync(
                repository,
                format!(
                    "git exited with status {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }

        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "git finished"
        );
        Ok(())
    }
}
