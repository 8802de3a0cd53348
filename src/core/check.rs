//! Purpose: Decode every binary fixture in a corpus directory and report failures.
//! Exports: `CheckEvent`, `CheckFailure`, `CheckOutcome`, `check_corpus`, `check_file`.
//! Role: Validation pass behind `mpk-corpus check`; decoded values are discarded.
//! Invariants: Entries named `*.json` are never opened.
//! Invariants: Decode failures are reported and skipped; I/O failures end the run.
//! Invariants: Each entry is read and decoded at most once, in listing order.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::codec::{self, DecodeFailure};
use crate::core::corpus;
use crate::core::error::Error;

#[derive(Debug)]
pub enum CheckEvent<'a> {
    Reading {
        path: &'a Path,
    },
    Failed {
        path: &'a Path,
        failure: &'a DecodeFailure,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CheckFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub read: u64,
    pub skipped: u64,
    pub failed: u64,
    pub failures: Vec<CheckFailure>,
}

impl CheckOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub fn check_corpus<F>(dir: &Path, mut on_event: F) -> Result<CheckOutcome, Error>
where
    F: FnMut(CheckEvent<'_>),
{
    info!(dir = %dir.display(), "checking corpus");
    let mut outcome = CheckOutcome::default();

    for path in corpus::list_entries(dir)? {
        if corpus::is_json_fixture(&path) {
            debug!(path = %path.display(), "skipping json fixture");
            outcome.skipped += 1;
            continue;
        }

        on_event(CheckEvent::Reading { path: &path });
        outcome.read += 1;

        match check_file(&path)? {
            None => debug!(path = %path.display(), "decoded"),
            Some(failure) => {
                debug!(path = %path.display(), error = %failure, "decode failed");
                on_event(CheckEvent::Failed {
                    path: &path,
                    failure: &failure,
                });
                outcome.failed += 1;
                outcome.failures.push(CheckFailure {
                    path,
                    message: failure.to_string(),
                });
            }
        }
    }

    info!(
        read = outcome.read,
        skipped = outcome.skipped,
        failed = outcome.failed,
        "corpus check finished"
    );
    Ok(outcome)
}

/// Reads and decodes one file. `Ok(Some(_))` is a recovered decode failure.
pub fn check_file(path: &Path) -> Result<Option<DecodeFailure>, Error> {
    let bytes = fs::read(path).map_err(|err| Error::from_io(err, "failed to read fixture", path))?;
    Ok(codec::decode_value(&bytes).err())
}
