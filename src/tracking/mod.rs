//! # Processed file tracking
//!
//! Bookkeeping that lets an XML source skip files it already ingested.
//!
//! A run goes through two phases of bookkeeping:
//!
//! 1. Workers stage the name of every file they fully processed in a
//!    run-scoped [`staging::StagingArea`], one artifact per file.
//! 2. Once every worker is done and the run succeeded, the coordinator drains
//!    the staging area and commits the names into the
//!    [`tracker::ProcessedFileTracker`] in a single step.
//!
//! Workers never write to the tracking table, so a retried worker or a failed
//! run can never leave a partial commit behind.

/// Filesystem abstraction used by staging areas
pub mod fs;

/// Run-scoped staging of processed filenames
pub mod staging;

/// Key-value tables backing the tracker
pub mod store;

/// Processed file table with expiry
pub mod tracker;

pub use fs::{FileSystem, InMemoryFileSystem, LocalFileSystem};
pub use staging::{PendingCommitStaging, StagingArea, StagingRecorder};
pub use store::{
    InMemoryKeyValueStore, InMemoryTables, JsonFileKeyValueStore, JsonFileTables, KeyValue,
    KeyValueStore, TableProvider,
};
pub use tracker::{ExclusionSet, ExpiryPolicy, ProcessedFileTracker};
