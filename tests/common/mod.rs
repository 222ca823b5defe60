//! Shared helpers for integration tests: small local git repositories to
//! clone from and update, built with the system git binary.
#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use corpus_sync::config::{SourceConfig, UpdateFrequency};

pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=tester",
            "-c",
            "user.email=tester@example.com",
        ])
        .args(args)
        .output()
        .expect("failed to run git; is it installed?");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a repository with an initial commit of `files`. Returns the name
/// of the default branch, whatever the host git calls it.
pub fn init_origin(dir: &Path, files: &[(&str, &str)]) -> String {
    std::fs::create_dir_all(dir).unwrap();
    git(dir, &["init"]);
    commit_files(dir, files, "initial");
    current_branch(dir)
}

pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) {
    for (rel, content) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-m", message]);
}

pub fn current_branch(dir: &Path) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .expect("failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn source_config(name: &str, origin: &Path, branch: &str, checkout: &Path) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        source_type: Some("git".to_string()),
        url: origin.display().to_string(),
        branch: branch.to_string(),
        local_path: checkout.to_path_buf(),
        update_frequency: UpdateFrequency::Daily,
        include_paths: vec!["**/*.txt".to_string()],
        exclude_paths: Vec::new(),
        priority: 1.0,
        source_label: None,
    }
}
