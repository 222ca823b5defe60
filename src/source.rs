//! A single content source: one git repository checked out locally.
//!
//! The source exclusively owns its checkout directory and the sidecar sync
//! marker inside it. Fetching is conflict-averse: a fresh checkout is a
//! shallow single-branch clone, an existing one is updated fast-forward-only,
//! and a failed fetch leaves both the tree and the marker untouched.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::SourceConfig;
use crate::filter;
use crate::freshness;
use crate::models::SourceStats;

/// Sidecar marker holding the last successful sync time as a bare
/// floating-point Unix timestamp.
const SYNC_MARKER: &str = ".last_update";

pub struct ContentSource {
    config: SourceConfig,
    last_sync: Option<DateTime<Utc>>,
}

impl ContentSource {
    /// Wrap a source configuration, loading the persisted sync marker if one
    /// exists. An absent or unparsable marker means "no prior sync".
    pub fn new(config: SourceConfig) -> Self {
        let last_sync = read_marker(&config.local_path.join(SYNC_MARKER));
        Self { config, last_sync }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Time of the last successful fetch, if any. Monotonically
    /// non-decreasing across the process lifetime and across restarts.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Whether this source is due for a fetch at `now`.
    pub fn needs_update(&self, now: DateTime<Utc>) -> bool {
        freshness::needs_update(
            self.config.update_frequency,
            self.last_sync,
            self.checkout_valid(),
            now,
        )
    }

    /// A checkout counts only when it is an actual repository. A bare
    /// directory left behind by an interrupted clone is treated as absent,
    /// so the next sync re-clones instead of pulling into a non-repository.
    fn checkout_valid(&self) -> bool {
        self.config.local_path.join(".git").exists()
    }

    /// Clone or fast-forward the checkout. Returns true on success.
    ///
    /// Failures are logged with captured git diagnostics and never propagate;
    /// the checkout and the sync marker are only touched on success.
    pub async fn sync(&mut self) -> bool {
        info!(source = %self.config.name, "updating content source");

        let result = if self.checkout_valid() {
            self.pull().await
        } else {
            self.clone_repo().await
        };

        match result {
            Ok(()) => {
                self.last_sync = Some(Utc::now());
                if let Err(e) = self.write_marker() {
                    // Only risks one redundant fetch on the next run.
                    warn!(source = %self.config.name, error = %e, "could not persist sync marker");
                }
                true
            }
            Err(e) => {
                error!(source = %self.config.name, error = %format!("{e:#}"), "failed to update source");
                false
            }
        }
    }

    async fn clone_repo(&self) -> Result<()> {
        info!(
            source = %self.config.name,
            url = %self.config.url,
            path = %self.config.local_path.display(),
            "cloning"
        );

        if let Some(parent) = self.config.local_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        if self.config.local_path.exists() {
            warn!(
                source = %self.config.name,
                path = %self.config.local_path.display(),
                "clearing leftover checkout that is not a repository"
            );
            std::fs::remove_dir_all(&self.config.local_path)
                .with_context(|| format!("failed to clear {}", self.config.local_path.display()))?;
        }

        let output = Command::new("git")
            .args([
                "clone",
                "--depth",
                "1",
                "--single-branch",
                "--branch",
                &self.config.branch,
            ])
            .arg(&self.config.url)
            .arg(&self.config.local_path)
            .kill_on_drop(true)
            .output()
            .await
            .context("failed to execute 'git clone'; is git installed?")?;

        if !output.status.success() {
            bail!(
                "git clone failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        info!(source = %self.config.name, "clone complete");
        Ok(())
    }

    async fn pull(&self) -> Result<()> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.config.local_path)
            .args(["pull", "--ff-only", "origin", &self.config.branch])
            .kill_on_drop(true)
            .output()
            .await
            .context("failed to execute 'git pull'")?;

        if !output.status.success() {
            bail!(
                "git pull --ff-only failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        if String::from_utf8_lossy(&output.stdout).contains("Already up to date") {
            info!(source = %self.config.name, "already up to date");
        } else {
            info!(source = %self.config.name, "advanced to latest revision");
        }
        Ok(())
    }

    fn write_marker(&self) -> Result<()> {
        let Some(last_sync) = self.last_sync else {
            return Ok(());
        };
        let secs = last_sync.timestamp_micros() as f64 / 1_000_000.0;
        std::fs::write(self.config.local_path.join(SYNC_MARKER), format!("{secs}"))?;
        Ok(())
    }

    /// Files currently on disk matching this source's include/exclude
    /// patterns. Not coupled to whether a fetch just happened.
    pub fn files(&self) -> Vec<PathBuf> {
        filter::select_files(
            &self.config.local_path,
            &self.config.include_paths,
            &self.config.exclude_paths,
        )
    }

    pub fn stats(&self) -> SourceStats {
        let file_count = if self.config.local_path.exists() {
            self.files().len()
        } else {
            0
        };
        SourceStats {
            name: self.config.name.clone(),
            url: self.config.url.clone(),
            branch: self.config.branch.clone(),
            file_count,
            last_sync_time: self.last_sync,
            priority: self.config.priority,
        }
    }
}

fn read_marker(path: &Path) -> Option<DateTime<Utc>> {
    let text = std::fs::read_to_string(path).ok()?;
    let secs: f64 = text.trim().parse().ok()?;
    DateTime::from_timestamp_micros((secs * 1_000_000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateFrequency;
    use tempfile::TempDir;

    fn config_at(checkout: PathBuf) -> SourceConfig {
        SourceConfig {
            name: "test".to_string(),
            source_type: Some("git".to_string()),
            url: "https://example.com/test.git".to_string(),
            branch: "main".to_string(),
            local_path: checkout,
            update_frequency: UpdateFrequency::Daily,
            include_paths: vec!["**/*.txt".to_string()],
            exclude_paths: Vec::new(),
            priority: 1.0,
            source_label: None,
        }
    }

    #[test]
    fn marker_round_trips() {
        let tmp = TempDir::new().unwrap();
        let mut source = ContentSource::new(config_at(tmp.path().to_path_buf()));
        assert!(source.last_sync().is_none());

        source.last_sync = Some(Utc::now());
        source.write_marker().unwrap();

        let reloaded = ContentSource::new(config_at(tmp.path().to_path_buf()));
        let delta = (reloaded.last_sync().unwrap() - source.last_sync().unwrap())
            .num_milliseconds()
            .abs();
        assert!(delta < 10, "marker drifted by {delta}ms");
    }

    #[test]
    fn garbage_marker_means_no_prior_sync() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SYNC_MARKER), "not a timestamp").unwrap();
        let source = ContentSource::new(config_at(tmp.path().to_path_buf()));
        assert!(source.last_sync().is_none());
    }

    #[test]
    fn directory_without_a_repository_needs_update() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("stale.txt"), "leftover").unwrap();
        let source = ContentSource::new(config_at(tmp.path().to_path_buf()));
        assert!(source.needs_update(Utc::now()));
    }

    #[test]
    fn missing_checkout_needs_update() {
        let source = ContentSource::new(config_at(PathBuf::from("/nonexistent/checkout")));
        assert!(source.needs_update(Utc::now()));
    }

    #[test]
    fn stats_report_zero_files_without_checkout() {
        let source = ContentSource::new(config_at(PathBuf::from("/nonexistent/checkout")));
        let stats = source.stats();
        assert_eq!(stats.file_count, 0);
        assert!(stats.last_sync_time.is_none());
    }
}
