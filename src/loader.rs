//! Converts candidate files into the pipeline's document stream.
//!
//! Decoding is deliberately lenient: malformed byte sequences are replaced
//! rather than rejected, trading exact fidelity for coverage of binary-ish
//! files that slipped through filtering. Empty documents are never emitted.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{info, warn};

use crate::extract;
use crate::manager::ContentManager;
use crate::models::{Document, DocumentCandidate, DocumentMetadata};

/// Load one candidate into a document.
///
/// Returns `None` when the file is unreadable, fails notebook extraction, or
/// is empty after extraction; such files are skipped, never fatal.
pub fn load_document(candidate: &DocumentCandidate) -> Option<Document> {
    let text = match read_text(&candidate.path) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                path = %candidate.path.display(),
                error = %format!("{e:#}"),
                "failed to load file"
            );
            return None;
        }
    };

    if text.trim().is_empty() {
        warn!(path = %candidate.path.display(), "skipping empty file");
        return None;
    }

    let full_path = candidate.path.to_string_lossy().to_string();
    let file = candidate
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Some(Document {
        path: full_path.clone(),
        text,
        metadata: DocumentMetadata {
            file,
            full_path,
            source: candidate.source.clone(),
            source_label: candidate.source_label.clone(),
            priority: candidate.priority,
            last_modified: file_mtime(&candidate.path),
        },
    })
}

/// Load every candidate, skipping per-file failures.
pub fn load_documents(candidates: &[DocumentCandidate]) -> Vec<Document> {
    let documents: Vec<Document> = candidates.iter().filter_map(load_document).collect();
    info!(
        loaded = documents.len(),
        candidates = candidates.len(),
        "loaded documents"
    );
    documents
}

/// Full pipeline entry point: load config, refresh stale sources, collect
/// candidates, and load documents.
pub async fn sync_and_load(config_path: &Path) -> Result<Vec<Document>> {
    let mut manager = ContentManager::from_config_file(config_path)?;
    info!("checking for content updates");
    manager.refresh(false).await;
    let candidates = manager.collect_documents();
    Ok(load_documents(&candidates))
}

fn read_text(path: &Path) -> Result<String> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ipynb"))
    {
        return extract::notebook_text(path);
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn file_mtime(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn candidate(path: PathBuf) -> DocumentCandidate {
        DocumentCandidate {
            path,
            source: "docs".to_string(),
            priority: 1.5,
            source_label: "Docs".to_string(),
        }
    }

    #[test]
    fn plain_text_document_carries_full_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("guide.md");
        fs::write(&path, "# Guide\n\nBody.").unwrap();

        let doc = load_document(&candidate(path.clone())).unwrap();
        assert_eq!(doc.text, "# Guide\n\nBody.");
        assert_eq!(doc.metadata.file, "guide.md");
        assert_eq!(doc.metadata.full_path, path.to_string_lossy());
        assert_eq!(doc.metadata.source, "docs");
        assert_eq!(doc.metadata.source_label, "Docs");
        assert_eq!(doc.metadata.priority, 1.5);
    }

    #[test]
    fn empty_and_whitespace_files_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty.txt");
        let blank = tmp.path().join("blank.txt");
        fs::write(&empty, "").unwrap();
        fs::write(&blank, "  \n\t\n").unwrap();

        assert!(load_document(&candidate(empty)).is_none());
        assert!(load_document(&candidate(blank)).is_none());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mixed.txt");
        fs::write(&path, [b'o', b'k', 0xFF, b'!']).unwrap();

        let doc = load_document(&candidate(path)).unwrap();
        assert!(doc.text.starts_with("ok"));
        assert!(doc.text.contains('\u{FFFD}'));
    }

    #[test]
    fn notebooks_are_routed_through_extraction() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("demo.ipynb");
        fs::write(
            &path,
            r#"{"cells": [{"cell_type": "code", "source": ["x = 1"]}]}"#,
        )
        .unwrap();

        let doc = load_document(&candidate(path)).unwrap();
        assert!(doc.text.contains("# Jupyter Notebook: demo.ipynb"));
        assert!(doc.text.contains("x = 1"));
    }

    #[test]
    fn broken_notebook_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.ipynb");
        fs::write(&path, "{ nope").unwrap();
        assert!(load_document(&candidate(path)).is_none());
    }

    #[test]
    fn missing_file_is_skipped() {
        assert!(load_document(&candidate(PathBuf::from("/nonexistent/file.txt"))).is_none());
    }

    #[test]
    fn batch_load_skips_failures() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.txt");
        fs::write(&good, "hello").unwrap();

        let candidates = vec![
            candidate(good),
            candidate(PathBuf::from("/nonexistent/file.txt")),
        ];
        let documents = load_documents(&candidates);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].text, "hello");
    }
}
