//! Jupyter notebook text extraction.
//!
//! Walks the notebook's ordered cell list, rendering markdown cells as raw
//! text and code cells as fenced code blocks, each labelled with its 1-based
//! index. A document-level heading naming the file precedes the cells.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

/// Cell source in the notebook format is either one string or a list of
/// lines that already carry their newlines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl CellSource {
    fn joined(&self) -> String {
        match self {
            CellSource::Text(text) => text.clone(),
            CellSource::Lines(lines) => lines.concat(),
        }
    }
}

/// Extract readable text from a `.ipynb` file.
///
/// Any read or parse failure is an error; callers treat it as "load failed"
/// for that file only.
pub fn notebook_text(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read notebook: {}", path.display()))?;
    let notebook: Notebook = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse notebook: {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut parts = vec![format!("# Jupyter Notebook: {}\n", file_name)];
    for (i, cell) in notebook.cells.iter().enumerate() {
        let content = cell.source.joined();
        match cell.cell_type.as_str() {
            "markdown" => parts.push(format!("## Cell {} (Markdown)\n{}\n", i + 1, content)),
            "code" => parts.push(format!("## Cell {} (Code)\n```python\n{}\n```\n", i + 1, content)),
            _ => {}
        }
    }

    Ok(parts.join("\n\n"))
}
