//! Include/exclude file selection over a checked-out tree.
//!
//! Selection is a pure function of the tree: union the include-glob matches,
//! keep regular files only, then drop anything matching an exclude pattern.
//! Exclude patterns are matched against the root-relative path normalized to
//! forward slashes, so behavior is identical across host path conventions.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Select the files under `root` matching any include pattern and no exclude
/// pattern. Returns a sorted, de-duplicated list.
///
/// A missing `root` yields an empty selection, not an error. An empty include
/// list selects nothing.
pub fn select_files(root: &Path, include: &[String], exclude: &[String]) -> Vec<PathBuf> {
    if !root.exists() {
        warn!(root = %root.display(), "content path does not exist");
        return Vec::new();
    }

    let include_set = build_globset(include, "include");
    let exclude_set = build_globset(exclude, "exclude");

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name().to_str() != Some(".git"));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        // A path that cannot be expressed relative to root is dropped.
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let rel = normalize_slashes(relative);

        if !include_set.is_match(&rel) {
            continue;
        }
        if exclude_set.is_match(&rel) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    files.dedup();
    files
}

/// Root-relative path in forward-slash form.
fn normalize_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String], kind: &str) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                warn!(pattern = %pattern, kind = kind, error = %e, "skipping invalid glob pattern");
            }
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!(kind = kind, error = %e, "failed to build glob set");
        GlobSet::empty()
    })
}
