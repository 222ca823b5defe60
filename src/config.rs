//! Content-source configuration loading.
//!
//! Parses the `content_sources.yaml` document into typed [`SourceConfig`]
//! entries. Each entry is deserialized independently so one malformed source
//! is logged and skipped without aborting the whole load.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Refresh cadence governing when a source is considered stale.
///
/// Unrecognized cadence strings are rejected at deserialization time, which
/// causes the containing source entry to be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateFrequency {
    Hourly,
    #[default]
    Daily,
    OnStartup,
    Never,
}

/// Configuration for one content source. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Unique key identifying the source.
    pub name: String,
    /// Informational only; all sources are git repositories today.
    #[serde(rename = "type", default)]
    pub source_type: Option<String>,
    /// Repository URL (anything `git clone` accepts).
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Local checkout directory, exclusively owned by this source.
    pub local_path: PathBuf,
    #[serde(default)]
    pub update_frequency: UpdateFrequency,
    /// Include glob patterns, relative to the checkout root.
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Exclude glob patterns; exclude always wins over include.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    /// Advisory ranking weight for downstream consumers.
    #[serde(default = "default_priority")]
    pub priority: f64,
    #[serde(default)]
    pub source_label: Option<String>,
}

impl SourceConfig {
    /// Display label, falling back to the source name.
    pub fn label(&self) -> &str {
        self.source_label.as_deref().unwrap_or(&self.name)
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_priority() -> f64 {
    1.0
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    content_sources: Vec<serde_yaml::Value>,
}

/// Load source configurations from a YAML file.
///
/// An unreadable file or invalid top-level document is an error; a malformed
/// individual entry is logged and skipped.
pub fn load_sources(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let raw: RawConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    if raw.content_sources.is_empty() {
        warn!(config = %path.display(), "no content sources defined in config");
    }

    let mut sources = Vec::new();
    for entry in raw.content_sources {
        let name = entry
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unnamed>")
            .to_string();
        match serde_yaml::from_value::<SourceConfig>(entry) {
            Ok(source) => {
                info!(source = %source.name, "loaded content source");
                sources.push(source);
            }
            Err(e) => {
                error!(source = %name, error = %e, "skipping malformed source entry");
            }
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_str(yaml: &str) -> Vec<SourceConfig> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        load_sources(file.path()).unwrap()
    }

    #[test]
    fn full_entry_parses() {
        let sources = load_str(
            r#"
content_sources:
  - name: handbook
    type: git
    url: https://example.com/handbook.git
    branch: develop
    local_path: /tmp/content/handbook
    update_frequency: hourly
    include_paths: ["docs/**/*.md"]
    exclude_paths: ["docs/internal/**"]
    priority: 2.5
    source_label: Handbook
"#,
        );
        assert_eq!(sources.len(), 1);
        let s = &sources[0];
        assert_eq!(s.name, "handbook");
        assert_eq!(s.branch, "develop");
        assert_eq!(s.update_frequency, UpdateFrequency::Hourly);
        assert_eq!(s.priority, 2.5);
        assert_eq!(s.label(), "Handbook");
    }

    #[test]
    fn defaults_are_applied() {
        let sources = load_str(
            r#"
content_sources:
  - name: wiki
    url: https://example.com/wiki.git
    local_path: /tmp/content/wiki
"#,
        );
        let s = &sources[0];
        assert_eq!(s.branch, "main");
        assert_eq!(s.update_frequency, UpdateFrequency::Daily);
        assert!(s.include_paths.is_empty());
        assert!(s.exclude_paths.is_empty());
        assert_eq!(s.priority, 1.0);
        assert_eq!(s.label(), "wiki");
    }

    #[test]
    fn malformed_entry_is_skipped() {
        let sources = load_str(
            r#"
content_sources:
  - name: broken
    url: https://example.com/broken.git
  - name: good
    url: https://example.com/good.git
    local_path: /tmp/content/good
"#,
        );
        // "broken" has no local_path and is dropped; "good" survives.
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "good");
    }

    #[test]
    fn unknown_cadence_rejects_the_entry() {
        let sources = load_str(
            r#"
content_sources:
  - name: odd
    url: https://example.com/odd.git
    local_path: /tmp/content/odd
    update_frequency: fortnightly
"#,
        );
        assert!(sources.is_empty());
    }

    #[test]
    fn empty_document_yields_no_sources() {
        let sources = load_str("content_sources: []\n");
        assert!(sources.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_sources(Path::new("/nonexistent/content_sources.yaml")).is_err());
    }
}
