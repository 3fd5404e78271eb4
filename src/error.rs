//! Structured errors at component boundaries.
//!
//! Internal plumbing (geometry ops, I/O) returns `anyhow::Result` with
//! `.context(...)`. This module only carries the error *kinds* a caller
//! (scheduler, API layer) needs to match on.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{LocationId, MapUpdateId};

#[derive(Debug, Error)]
pub enum McpError {
    /// Adding or un-clearing a parentage would create an `Ancestry(x, x)`.
    /// Carries the offending edge so the caller can report exactly which
    /// one was broken ("Circular hierarchy! Breaking parent→child P→C").
    #[error("circular hierarchy: parent {parent:?} -> child {child:?} would create a self-ancestry")]
    CircularHierarchy {
        parent: LocationId,
        child: LocationId,
    },

    /// Another worker already holds the `RUNNING` row for this job type.
    #[error("job {job_type:?} is already running for a newer or equal map update")]
    JobLockContention { job_type: &'static str },

    /// `func` raised inside a job; `status` was recorded as `FAILED`.
    #[error("job {job_type:?} failed for update range ending at {up_to:?}: {source}")]
    JobFailed {
        job_type: &'static str,
        up_to: MapUpdateId,
        #[source]
        source: anyhow::Error,
    },

    /// A blob cache artifact was requested but has not been produced yet.
    #[error("cache miss for key {key:?} at update {update:?}")]
    CacheMiss { update: MapUpdateId, key: String },

    /// A deserialized artifact's schema hash doesn't match this build's.
    #[error("stale artifact at {path:?}: schema hash {found} does not match expected {expected}")]
    SchemaMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },
}
