//! Purpose: Library backing the `mpk-corpus` CLI and its tests.
//! Exports: `api` (checker, generator, codec seam, errors).
//! Role: Internal library for the binary; not a stable SDK.
//! Invariants: Core modules take explicit paths and callbacks instead of hidden state.
pub mod api;
mod core;
