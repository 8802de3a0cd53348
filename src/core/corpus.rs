//! Purpose: Corpus directory resolution, listing, and the JSON fixture filter.
//! Exports: `DEFAULT_CORPUS_DIR`, `default_corpus_dir`, `list_entries`, `is_json_fixture`.
//! Invariants: Listing is non-recursive and sorted by file name.
//! Invariants: Entries are not filtered by file type; unreadable entries fail at read time.
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::Error;

pub const DEFAULT_CORPUS_DIR: &str = "example-data";
pub const CORPUS_DIR_ENV: &str = "MPK_CORPUS_DIR";
pub const JSON_SUFFIX: &str = ".json";
pub const MPK_EXTENSION: &str = "mpk";

pub fn default_corpus_dir() -> PathBuf {
    corpus_dir_from(std::env::var_os(CORPUS_DIR_ENV))
}

fn corpus_dir_from(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CORPUS_DIR),
    }
}

pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let read_dir =
        fs::read_dir(dir).map_err(|err| Error::from_io(err, "failed to list corpus directory", dir))?;
    let mut entries = Vec::new();
    for entry in read_dir {
        let entry =
            entry.map_err(|err| Error::from_io(err, "failed to list corpus directory", dir))?;
        entries.push(entry.path());
    }
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

pub fn is_json_fixture(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(JSON_SUFFIX))
        .unwrap_or(false)
}
