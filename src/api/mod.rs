//! Purpose: Define the public Rust API boundary for the corpus tooling.
//! Exports: Checker, generator, codec seam, corpus helpers, and error types.
//! Role: The only public path into `core`; used by the CLI and integration tests.
//! Invariants: Internal modules remain private and are not directly exposed.

pub use crate::core::check::{
    CheckEvent, CheckFailure, CheckOutcome, check_corpus, check_file,
};
pub use crate::core::codec::{DecodeFailure, MAX_DECODE_DEPTH, decode_value, encode_json};
pub use crate::core::corpus::{
    CORPUS_DIR_ENV, DEFAULT_CORPUS_DIR, default_corpus_dir, is_json_fixture, list_entries,
};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::generate::{
    GenerateReport, GenerateStatus, generate_corpus, generate_fixture, mpk_path_for,
};
