//! Core data models used throughout corpus-sync.
//!
//! These types represent the candidates, documents, and stats snapshots that
//! flow through the sync → filter → collect → load pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A file selected by filtering, tagged with its owning source. Content has
/// not been read yet.
#[derive(Debug, Clone)]
pub struct DocumentCandidate {
    pub path: PathBuf,
    pub source: String,
    pub priority: f64,
    pub source_label: String,
}

/// Metadata attached to every emitted document. No field is optional.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadata {
    pub file: String,
    pub full_path: String,
    pub source: String,
    pub source_label: String,
    pub priority: f64,
    pub last_modified: DateTime<Utc>,
}

/// The final text-plus-metadata unit emitted to downstream consumers.
/// Created fresh on every pipeline run and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub path: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Read-only per-source snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub name: String,
    pub url: String,
    pub branch: String,
    pub file_count: usize,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub priority: f64,
}

/// Aggregate snapshot across all configured sources.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStats {
    pub source_count: usize,
    pub sources: Vec<SourceStats>,
    pub total_file_count: usize,
}
