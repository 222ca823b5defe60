//! Append-only interaction and feedback store.
//!
//! Sibling collaborator of the sync core: the downstream answering pipeline
//! records Q&A interactions here for training-data collection and quality
//! review. The core neither reads nor writes this store.
//!
//! Records are JSON Lines on disk, so files can be appended without loading,
//! streamed line by line, and imported into other tooling.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// A document consulted while answering, recorded alongside the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub file: String,
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

/// One recorded Q&A interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub question: String,
    pub answer: String,
    pub docs_used: Vec<RetrievedDoc>,
    pub confidence: f64,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Reviewer feedback on a previously recorded interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub interaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub feedback_type: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub corrected_answer: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reviewer: Option<String>,
}

/// Parameters for [`InteractionLogger::log_interaction`].
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub question: String,
    pub answer: String,
    pub docs_used: Vec<RetrievedDoc>,
    pub confidence: f64,
    pub response_time_ms: Option<u64>,
    pub channel: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for NewInteraction {
    fn default() -> Self {
        Self {
            question: String::new(),
            answer: String::new(),
            docs_used: Vec::new(),
            confidence: 0.0,
            response_time_ms: None,
            channel: "local".to_string(),
            user_id: None,
            session_id: None,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Aggregate statistics over the interaction log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionStats {
    pub total_interactions: usize,
    pub channels: BTreeMap<String, usize>,
    pub avg_confidence: f64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Flattened record exported for fine-tuning or retrieval evaluation.
#[derive(Debug, Clone, Serialize)]
struct TrainingRecord {
    question: String,
    answer: String,
    context_files: Vec<String>,
    confidence: f64,
    timestamp: DateTime<Utc>,
}

pub struct InteractionLogger {
    log_dir: PathBuf,
    interactions_file: PathBuf,
    feedback_file: PathBuf,
    daily_file: PathBuf,
}

impl InteractionLogger {
    /// Create the log directory if needed and open a logger over it.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self> {
        let log_dir = log_dir.into();
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

        let interactions_file = log_dir.join("interactions.jsonl");
        let feedback_file = log_dir.join("feedback.jsonl");
        // Daily rotation copy for easier management of long-running deployments.
        let daily_file = log_dir.join(format!(
            "interactions_{}.jsonl",
            Utc::now().format("%Y-%m-%d")
        ));

        info!(dir = %log_dir.display(), "interaction logger initialised");
        Ok(Self {
            log_dir,
            interactions_file,
            feedback_file,
            daily_file,
        })
    }

    /// Append one interaction and return its record ID.
    pub fn log_interaction(&self, new: NewInteraction) -> Result<String> {
        let timestamp = Utc::now();
        let id = interaction_id(&new.question, timestamp);
        let record = Interaction {
            id: id.clone(),
            timestamp,
            channel: new.channel,
            question: new.question,
            answer: new.answer,
            docs_used: new.docs_used,
            confidence: new.confidence,
            response_time_ms: new.response_time_ms,
            user_id: new.user_id,
            session_id: new.session_id,
            metadata: new.metadata,
        };

        append_jsonl(&self.interactions_file, &record)?;
        append_jsonl(&self.daily_file, &record)?;
        info!(id = %id, channel = %record.channel, "logged interaction");
        Ok(id)
    }

    /// Append reviewer feedback for a previously recorded interaction.
    pub fn log_feedback(
        &self,
        interaction_id: &str,
        feedback_type: &str,
        rating: Option<u8>,
        corrected_answer: Option<String>,
        notes: Option<String>,
        reviewer: Option<String>,
    ) -> Result<()> {
        let record = Feedback {
            interaction_id: interaction_id.to_string(),
            timestamp: Utc::now(),
            feedback_type: feedback_type.to_string(),
            rating,
            corrected_answer,
            notes,
            reviewer,
        };
        append_jsonl(&self.feedback_file, &record)?;
        info!(id = %interaction_id, kind = %feedback_type, "logged feedback");
        Ok(())
    }

    /// Read back interactions, most recent first. Malformed lines are
    /// skipped.
    pub fn interactions(
        &self,
        limit: usize,
        channel: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Interaction>> {
        if !self.interactions_file.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.interactions_file)?;

        let mut records: Vec<Interaction> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<Interaction>(line).ok())
            .filter(|i| channel.is_none_or(|c| i.channel == c))
            .filter(|i| since.is_none_or(|s| i.timestamp >= s))
            .collect();

        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    /// Aggregate statistics over the whole log.
    pub fn stats(&self) -> Result<InteractionStats> {
        let interactions = self.interactions(10_000, None, None)?;
        if interactions.is_empty() {
            return Ok(InteractionStats::default());
        }

        let mut channels: BTreeMap<String, usize> = BTreeMap::new();
        let mut confidences = Vec::new();
        for interaction in &interactions {
            *channels.entry(interaction.channel.clone()).or_default() += 1;
            if interaction.confidence > 0.0 {
                confidences.push(interaction.confidence);
            }
        }

        let avg_confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };

        Ok(InteractionStats {
            total_interactions: interactions.len(),
            channels,
            avg_confidence,
            // Read-back is most-recent-first.
            earliest: interactions.last().map(|i| i.timestamp),
            latest: interactions.first().map(|i| i.timestamp),
        })
    }

    /// Export a flattened JSONL dataset suitable for fine-tuning or
    /// retrieval evaluation. Returns the output path.
    pub fn export_for_training(&self, output_file: &str) -> Result<PathBuf> {
        let interactions = self.interactions(10_000, None, None)?;
        let output_path = self.log_dir.join(output_file);

        let mut out = String::new();
        for interaction in &interactions {
            let record = TrainingRecord {
                question: interaction.question.clone(),
                answer: interaction.answer.clone(),
                context_files: interaction
                    .docs_used
                    .iter()
                    .map(|d| d.file.clone())
                    .collect(),
                confidence: interaction.confidence,
                timestamp: interaction.timestamp,
            };
            out.push_str(&serde_json::to_string(&record)?);
            out.push('\n');
        }

        std::fs::write(&output_path, out)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        info!(records = interactions.len(), path = %output_path.display(), "exported training data");
        Ok(output_path)
    }
}

/// Content-addressed record ID: sha256(question + timestamp), truncated.
fn interaction_id(question: &str, timestamp: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(question.as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let line = serde_json::to_string(record)?;
    writeln!(file, "{line}")?;
    Ok(())
}
