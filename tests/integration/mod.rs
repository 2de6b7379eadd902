//! Integration test suite for update-helper
//!
//! End-to-end tests against real zip archives, a local HTTP server and the
//! compiled `update-helper-cli` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: Helper flag parsing, usage errors and exit codes
//! - **download**: Archive download and installation through an HTTP mock
//! - **engine**: Replacement runs of the helper binary
//! - **extraction**: Archive extraction with modes, directories and symlinks
//! - **session**: Helper launch, self-kill barrier and post-restart cleanup

mod cli;
mod download;
mod extraction;
mod session;
