//! Pipeline file discovery and loading
//!
//! Files are discovered, sorted by path, then parsed in parallel. Results
//! come back in sorted order regardless of which parse finishes first, so
//! the merge into the node registry is deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use walkdir::WalkDir;

use super::document::{load_json, DocumentError, ParsedJson};

/// How deep to look for `*.json` files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Only the directory itself
    #[default]
    Flat,
    /// The directory and every subdirectory
    Recursive,
}

/// Outcome of loading one pipeline file
#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub result: Result<ParsedJson, DocumentError>,
}

/// Lists `*.json` files under `dir`, sorted by path
pub fn find_pipeline_files(dir: &Path, mode: ScanMode) -> Result<Vec<PathBuf>> {
    let mut files = match mode {
        ScanMode::Flat => {
            let entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to read pipeline directory: {}", dir.display()))?;

            let mut files = Vec::new();
            for entry in entries {
                let path = entry
                    .with_context(|| format!("Failed to read pipeline directory: {}", dir.display()))?
                    .path();
                if path.is_file() && is_json(&path) {
                    files.push(path);
                }
            }
            files
        }
        ScanMode::Recursive => {
            let mut files = Vec::new();
            for entry in WalkDir::new(dir).follow_links(true) {
                let entry = entry
                    .with_context(|| format!("Failed to walk pipeline directory: {}", dir.display()))?;
                if entry.file_type().is_file() && is_json(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            files
        }
    };

    files.sort();
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Parses every file in parallel, preserving input order
pub fn load_all(paths: &[PathBuf]) -> Vec<LoadedFile> {
    paths
        .par_iter()
        .map(|path| LoadedFile {
            path: path.clone(),
            result: load_json(path),
        })
        .collect()
}
