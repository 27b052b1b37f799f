//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tierlog::Level;

/// Log files in `dir` that belong to `level`, oldest first
pub fn level_files(dir: &Path, level: Level) -> Vec<PathBuf> {
    let marker = format!("{}_", level.as_str());
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy();
            name.ends_with(".log")
                && (name.starts_with(&marker) || name.contains(&format!(".{}", marker)))
        })
        .collect();
    // Names differ only in the increasing token, so sort by it
    files.sort_by_key(|p| token(p));
    files
}

fn token(path: &Path) -> u64 {
    let name = path.file_name().unwrap().to_string_lossy();
    let stem = name.trim_end_matches(".log");
    stem.rsplit('.').next().unwrap().parse().unwrap()
}

/// All lines written for `level`, across rotated files
pub fn level_lines(dir: &Path, level: Level) -> Vec<String> {
    level_files(dir, level)
        .iter()
        .flat_map(|p| {
            fs::read_to_string(p)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Every `.log` file in `dir`
pub fn all_log_files(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map(|e| e == "log").unwrap_or(false))
        .collect()
}
