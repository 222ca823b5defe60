//! Orchestration across all configured content sources.
//!
//! The manager owns the source collection and drives refresh-if-stale over
//! it. Fetches are independent (disjoint checkout directories), so they run
//! concurrently on a bounded worker pool, one task per source, each carrying
//! a timeout. Document collection only ever happens after the join barrier —
//! it never observes a source mid-fetch.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::{self, SourceConfig};
use crate::models::{DocumentCandidate, ManagerStats, SourceStats};
use crate::source::ContentSource;

/// Upper bound on sources fetched in parallel.
const DEFAULT_MAX_PARALLEL_FETCHES: usize = 4;
/// Per-source fetch deadline; overrunning it counts as a fetch failure.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Outcome of one refresh pass. Sources skipped as not-due never count
/// against success.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RefreshSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RefreshSummary {
    /// True iff every attempted fetch succeeded and at least one source is
    /// configured.
    pub fn all_ok(&self) -> bool {
        self.failed == 0 && self.attempted + self.skipped > 0
    }
}

enum FetchOutcome {
    Succeeded,
    Failed,
    Skipped,
}

pub struct ContentManager {
    sources: Vec<ContentSource>,
    max_parallel: usize,
    fetch_timeout: Duration,
}

impl ContentManager {
    pub fn new(configs: Vec<SourceConfig>) -> Self {
        Self {
            sources: configs.into_iter().map(ContentSource::new).collect(),
            max_parallel: DEFAULT_MAX_PARALLEL_FETCHES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Build a manager from a `content_sources.yaml` file.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(config::load_sources(path)?))
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn sources(&self) -> &[ContentSource] {
        &self.sources
    }

    /// Refresh every source that is due (or all of them with `force`).
    ///
    /// Fail-soft: a failure or timeout on one source never stops the others,
    /// and a failed source keeps its last good checkout and sync time.
    pub async fn refresh(&mut self, force: bool) -> RefreshSummary {
        if self.sources.is_empty() {
            warn!("no content sources configured");
            return RefreshSummary::default();
        }

        let now = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let fetch_timeout = self.fetch_timeout;
        // Kept so a panicked fetch task loses one refresh cycle, not the
        // source itself.
        let configs: Vec<SourceConfig> = self.sources.iter().map(|s| s.config().clone()).collect();

        let mut join_set = JoinSet::new();
        for (index, mut source) in self.sources.drain(..).enumerate() {
            let due = force || source.needs_update(now);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                if !due {
                    return (index, source, FetchOutcome::Skipped);
                }
                let _permit = semaphore.acquire().await.ok();
                match timeout(fetch_timeout, source.sync()).await {
                    Ok(true) => (index, source, FetchOutcome::Succeeded),
                    Ok(false) => (index, source, FetchOutcome::Failed),
                    Err(_) => {
                        error!(
                            source = %source.name(),
                            timeout_secs = fetch_timeout.as_secs(),
                            "fetch timed out"
                        );
                        (index, source, FetchOutcome::Failed)
                    }
                }
            });
        }

        // Join barrier: collect every worker's result, then merge once.
        let mut finished = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(entry) => finished.push(entry),
                Err(e) => error!(error = %e, "fetch task panicked"),
            }
        }
        restore_missing(&mut finished, &configs);
        finished.sort_by_key(|(index, _, _)| *index);

        let mut summary = RefreshSummary::default();
        for (_, source, outcome) in finished {
            match outcome {
                FetchOutcome::Succeeded => {
                    summary.attempted += 1;
                    summary.succeeded += 1;
                }
                FetchOutcome::Failed => {
                    summary.attempted += 1;
                    summary.failed += 1;
                }
                FetchOutcome::Skipped => summary.skipped += 1,
            }
            self.sources.push(source);
        }

        if summary.attempted > 0 {
            info!(
                updated = summary.succeeded,
                failed = summary.failed,
                total = self.sources.len(),
                "content refresh complete"
            );
        } else {
            info!("all content sources up to date");
        }
        summary
    }

    /// Candidate files across every source, tagged with the source's name,
    /// priority, and label.
    ///
    /// Reads whatever is currently on disk; a source that failed to refresh
    /// still contributes its last-known-good checkout.
    pub fn collect_documents(&self) -> Vec<DocumentCandidate> {
        let mut candidates = Vec::new();
        for source in &self.sources {
            let files = source.files();
            info!(source = %source.name(), files = files.len(), "collected files");
            for path in files {
                candidates.push(DocumentCandidate {
                    path,
                    source: source.name().to_string(),
                    priority: source.config().priority,
                    source_label: source.config().label().to_string(),
                });
            }
        }
        info!(total = candidates.len(), "total files from all sources");
        candidates
    }

    /// Read-only observability snapshot. Performs no fetches.
    pub fn stats(&self) -> ManagerStats {
        let sources: Vec<SourceStats> = self.sources.iter().map(|s| s.stats()).collect();
        let total_file_count = sources.iter().map(|s| s.file_count).sum();
        ManagerStats {
            source_count: self.sources.len(),
            sources,
            total_file_count,
        }
    }
}

/// Rebuild any source whose fetch task never reported back (a panic). The
/// source re-enters the collection from its config, counted as a failure for
/// this cycle; its on-disk checkout and marker are untouched.
fn restore_missing(
    finished: &mut Vec<(usize, ContentSource, FetchOutcome)>,
    configs: &[SourceConfig],
) {
    if finished.len() == configs.len() {
        return;
    }
    let present: HashSet<usize> = finished.iter().map(|(index, _, _)| *index).collect();
    for (index, config) in configs.iter().enumerate() {
        if !present.contains(&index) {
            warn!(source = %config.name, "fetch task was lost; keeping the source as failed");
            finished.push((index, ContentSource::new(config.clone()), FetchOutcome::Failed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateFrequency;
    use std::path::PathBuf;

    fn config(name: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            source_type: Some("git".to_string()),
            url: format!("https://example.com/{name}.git"),
            branch: "main".to_string(),
            local_path: PathBuf::from("/nonexistent").join(name),
            update_frequency: UpdateFrequency::Daily,
            include_paths: vec!["**/*.txt".to_string()],
            exclude_paths: Vec::new(),
            priority: 1.0,
            source_label: None,
        }
    }

    #[test]
    fn lost_fetch_task_keeps_the_source_as_failed() {
        let configs = vec![config("alpha"), config("beta")];
        let mut finished = vec![(
            0,
            ContentSource::new(configs[0].clone()),
            FetchOutcome::Succeeded,
        )];

        restore_missing(&mut finished, &configs);

        assert_eq!(finished.len(), 2);
        let (index, source, outcome) = &finished[1];
        assert_eq!(*index, 1);
        assert_eq!(source.name(), "beta");
        assert!(matches!(outcome, FetchOutcome::Failed));
    }

    #[tokio::test]
    async fn empty_manager_refresh_is_not_ok() {
        let mut manager = ContentManager::new(Vec::new());
        let summary = manager.refresh(false).await;
        assert!(!summary.all_ok());
        assert_eq!(summary.attempted, 0);
    }

    #[test]
    fn all_skipped_counts_as_success() {
        let summary = RefreshSummary {
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 3,
        };
        assert!(summary.all_ok());
    }

    #[test]
    fn any_failure_flips_the_summary() {
        let summary = RefreshSummary {
            attempted: 2,
            succeeded: 1,
            failed: 1,
            skipped: 0,
        };
        assert!(!summary.all_ok());
    }
}
