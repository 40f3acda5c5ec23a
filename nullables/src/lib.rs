//! Nullable infrastructure for deterministic testing.
//!
//! Storage is abstracted behind the `tally-store` traits. This crate
//! provides a test-friendly implementation that:
//! - Keeps everything in memory and never touches the filesystem
//! - Applies batches atomically under a single lock
//! - Can be told to fail the next write, to exercise rollback paths
//!
//! Usage: swap the LMDB backend for [`NullStore`] in tests.

pub mod store;

pub use store::NullStore;
