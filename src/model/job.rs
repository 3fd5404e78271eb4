use serde::{Deserialize, Serialize};

use super::MapUpdateId;

/// Identifies a registered job function, e.g. `"mapdata.recalculate_geometries"`
/// (: `register_mapupdate_job` derives this from module + func name).
pub type JobType = &'static str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// A worker holds this row; uniqueness on `(job_type, RUNNING)` is how
    /// two workers contend for the same job.
    Running,
    Success,
    Skipped,
    Failed,
    /// `RUNNING` for longer than the configured job timeout with no lock
    /// held — detected, not set by the running worker itself.
    Timeout,
}

/// One row of the job log. `up_to` is the [`MapUpdateId`]
/// the job processed through; a job is only re-run once a newer update
/// exists than the last `Success` row's `up_to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_type: JobType,
    pub up_to: MapUpdateId,
    pub status: JobStatus,
    pub started_at: i64,
    pub finished_at: Option<i64>,
}
