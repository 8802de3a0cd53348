//! Purpose: Regenerate `<name>.mpk` fixtures from their `<name>.json` siblings.
//! Exports: `GenerateStatus`, `GenerateReport`, `generate_fixture`, `generate_corpus`.
//! Role: Keeps the binary half of each fixture pair in sync with its JSON source.
//! Invariants: Fixtures are written to `<name>.mpk.copy` and renamed into place.
//! Invariants: Written bytes are re-read and compared before a status is reported.
//! Invariants: A generated fixture that fails to decode is reported, not fatal.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::codec;
use crate::core::corpus::{self, MPK_EXTENSION};
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateStatus {
    Created,
    Unchanged,
    Updated {
        old_len: usize,
        new_len: usize,
        n_diff: usize,
    },
    Undecodable {
        message: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GenerateReport {
    pub json_path: PathBuf,
    pub mpk_path: PathBuf,
    #[serde(flatten)]
    pub status: GenerateStatus,
}

pub fn mpk_path_for(json_path: &Path) -> PathBuf {
    json_path.with_extension(MPK_EXTENSION)
}

pub fn generate_fixture(json_path: &Path) -> Result<GenerateReport, Error> {
    let mpk_path = mpk_path_for(json_path);

    let text = fs::read_to_string(json_path)
        .map_err(|err| Error::from_io(err, "failed to read json fixture", json_path))?;
    let doc: serde_json::Value = serde_json::from_str(&text).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message("json fixture is not valid json")
            .with_path(json_path)
            .with_source(err)
    })?;
    let bytes = codec::encode_json(&doc)?;

    let old_bytes = match fs::read(&mpk_path) {
        Ok(old) => Some(old),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(Error::from_io(err, "failed to read existing fixture", &mpk_path));
        }
    };

    write_replace(&mpk_path, &bytes)?;

    let written = fs::read(&mpk_path)
        .map_err(|err| Error::from_io(err, "failed to re-read fixture", &mpk_path))?;
    if written != bytes {
        return Err(Error::new(ErrorKind::Corrupt)
            .with_message("fixture bytes on disk differ from what was written")
            .with_path(&mpk_path));
    }

    let status = match codec::decode_value(&written) {
        Err(failure) => {
            warn!(path = %mpk_path.display(), error = %failure, "generated fixture does not decode");
            GenerateStatus::Undecodable {
                message: failure.to_string(),
            }
        }
        Ok(_) => compare(old_bytes.as_deref(), &written),
    };
    debug!(path = %mpk_path.display(), ?status, "fixture generated");

    Ok(GenerateReport {
        json_path: json_path.to_path_buf(),
        mpk_path,
        status,
    })
}

pub fn generate_corpus<F>(dir: &Path, mut on_report: F) -> Result<Vec<GenerateReport>, Error>
where
    F: FnMut(&GenerateReport),
{
    info!(dir = %dir.display(), "generating fixtures");
    let mut reports = Vec::new();
    for path in corpus::list_entries(dir)? {
        if !corpus::is_json_fixture(&path) {
            continue;
        }
        let report = generate_fixture(&path)?;
        on_report(&report);
        reports.push(report);
    }
    Ok(reports)
}

fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".copy");
    let staging = PathBuf::from(staging);
    fs::write(&staging, bytes)
        .map_err(|err| Error::from_io(err, "failed to write staging fixture", &staging))?;
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(Error::from_io(err, "failed to move fixture into place", path));
    }
    Ok(())
}

fn compare(old: Option<&[u8]>, new: &[u8]) -> GenerateStatus {
    let Some(old) = old else {
        return GenerateStatus::Created;
    };
    if old == new {
        return GenerateStatus::Unchanged;
    }
    // Only the common prefix is compared byte for byte; length changes show in the lens.
    let n_diff = old.iter().zip(new).filter(|(a, b)| a != b).count();
    GenerateStatus::Updated {
        old_len: old.len(),
        new_len: new.len(),
        n_diff,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        GenerateStatus, compare, generate_corpus, generate_fixture, mpk_path_for, write_replace,
    };
    use crate::core::check::check_corpus;
    use crate::core::error::ErrorKind;
    use std::fs;
    use std::path::Path;

    #[test]
    fn mpk_path_replaces_extension() {
        assert_eq!(
            mpk_path_for(Path::new("data/patch1.json")),
            Path::new("data/patch1.mpk")
        );
    }

    #[test]
    fn compare_classifies_changes() {
        assert_eq!(compare(None, &[1]), GenerateStatus::Created);
        assert_eq!(compare(Some(&[1u8, 2][..]), &[1, 2]), GenerateStatus::Unchanged);
        assert_eq!(
            compare(Some(&[1u8, 2, 3][..]), &[1, 9]),
            GenerateStatus::Updated {
                old_len: 3,
                new_len: 2,
                n_diff: 1,
            }
        );
    }

    #[test]
    fn created_then_unchanged_then_updated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let json = temp.path().join("change1.json");
        fs::write(&json, r#"{"actor": "a1", "seq": 1}"#).expect("write");

        let first = generate_fixture(&json).expect("generate");
        assert_eq!(first.status, GenerateStatus::Created);
        assert_eq!(first.mpk_path, temp.path().join("change1.mpk"));
        assert!(!temp.path().join("change1.mpk.copy").exists());

        let second = generate_fixture(&json).expect("generate");
        assert_eq!(second.status, GenerateStatus::Unchanged);

        fs::write(&json, r#"{"actor": "a1", "seq": 2}"#).expect("write");
        let third = generate_fixture(&json).expect("generate");
        assert_eq!(
            third.status,
            GenerateStatus::Updated {
                old_len: 15,
                new_len: 15,
                n_diff: 1,
            }
        );
    }

    #[test]
    fn failed_rename_leaves_no_staging_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A non-empty directory cannot be replaced by a file.
        let target = temp.path().join("patch1.mpk");
        fs::create_dir(&target).expect("mkdir");
        fs::write(target.join("keep"), b"x").expect("write");

        let err = write_replace(&target, &[0xc0]).unwrap_err();
        assert_eq!(err.path(), Some(target.as_path()));
        assert!(!temp.path().join("patch1.mpk.copy").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn malformed_json_is_corrupt() {
        let temp = tempfile::tempdir().expect("tempdir");
        let json = temp.path().join("patch1.json");
        fs::write(&json, "{\"diffs\": [").expect("write");

        let err = generate_fixture(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert_eq!(err.path(), Some(json.as_path()));
        assert!(!temp.path().join("patch1.mpk").exists());
    }

    #[test]
    fn generated_corpus_passes_check() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("patch1.json"), r#"{"clock": {"a": 2}, "diffs": []}"#)
            .expect("write");
        fs::write(temp.path().join("patch2.json"), r#"[1, -2, 3.5, "x", null, true]"#)
            .expect("write");
        fs::write(temp.path().join("notes.txt.mpk"), [0xc0]).expect("write");

        let mut seen = 0;
        let reports = generate_corpus(temp.path(), |_| seen += 1).expect("generate");
        assert_eq!(reports.len(), 2);
        assert_eq!(seen, 2);
        assert!(reports.iter().all(|r| r.status == GenerateStatus::Created));

        let outcome = check_corpus(temp.path(), |_| {}).expect("check");
        assert_eq!(outcome.read, 3);
        assert!(outcome.is_clean());
    }
}
