use ahash::AHashMap;

use crate::error::McpError;
use crate::model::{Job, JobStatus, JobType, MapUpdate, MapUpdateId};

/// What the scheduler needs from the authoritative store: the
/// update log, the job log, and an atomic "claim a `RUNNING` row" op, backed
/// by a row-level lock on a unique `(job_type, RUNNING)` constraint.
pub trait JobStore {
    fn last_update(&self) -> MapUpdateId;
    fn updates_between(&self, after: MapUpdateId, up_to: MapUpdateId) -> Vec<MapUpdate>;
    fn last_successful_or_skipped(&self, job_type: JobType) -> Option<Job>;
    /// The current `RUNNING` row for `job_type`, if any.
    fn running(&self, job_type: JobType) -> Option<Job>;
    /// Atomically insert a `RUNNING` row for `job_type`. Fails with
    /// [`McpError::JobLockContention`] if one already exists.
    fn try_start(&mut self, job_type: JobType, up_to: MapUpdateId) -> Result<(), McpError>;
    /// Finalize the `RUNNING` row for `job_type` with a terminal status.
    fn finish(&mut self, job_type: JobType, status: JobStatus);
    /// Attempt to reclaim an abandoned `RUNNING` row as `TIMEOUT`. Returns
    /// `true` if reclaimed (the row's lock was acquirable, meaning no
    /// worker actually holds it any more), `false` if it's still genuinely
    /// held.
    fn try_reclaim_timeout(&mut self, job_type: JobType) -> bool;
    /// Current time, injected so timeout checks are deterministic in tests.
    fn now(&self) -> i64;
}

/// Reference [`JobStore`] used by tests and as a starting point for a real
/// backend; holds everything in memory with no actual row-level locking
/// (there's only ever one caller in-process, so the uniqueness constraint
/// alone is enough to model contention).
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    updates: Vec<MapUpdate>,
    jobs: AHashMap<JobType, Vec<Job>>,
    clock: i64,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_update(&mut self, update: MapUpdate) {
        self.clock = update.created_at;
        self.updates.push(update);
    }

    pub fn advance_clock(&mut self, by: i64) {
        self.clock += by;
    }

    pub fn last_status(&self, job_type: JobType) -> Option<JobStatus> {
        self.jobs.get(job_type).and_then(|jobs| jobs.last()).map(|j| j.status)
    }
}

impl JobStore for InMemoryJobStore {
    fn last_update(&self) -> MapUpdateId {
        self.updates.last().map(|u| u.id).unwrap_or(MapUpdateId(0))
    }

    fn updates_between(&self, after: MapUpdateId, up_to: MapUpdateId) -> Vec<MapUpdate> {
        self.updates.iter().filter(|u| u.id > after && u.id <= up_to).cloned().collect()
    }

    fn last_successful_or_skipped(&self, job_type: JobType) -> Option<Job> {
        self.jobs
            .get(job_type)?
            .iter()
            .rev()
            .find(|j| matches!(j.status, JobStatus::Success | JobStatus::Skipped))
            .cloned()
    }

    fn running(&self, job_type: JobType) -> Option<Job> {
        self.jobs.get(job_type)?.iter().rev().find(|j| j.status == JobStatus::Running).cloned()
    }

    fn try_start(&mut self, job_type: JobType, up_to: MapUpdateId) -> Result<(), McpError> {
        if self.running(job_type).is_some() {
            return Err(McpError::JobLockContention { job_type });
        }
        self.jobs.entry(job_type).or_default().push(Job {
                job_type,
                up_to,
                status: JobStatus::Running,
                started_at: self.clock,
                finished_at: None,
        });
        Ok(())
    }

    fn finish(&mut self, job_type: JobType, status: JobStatus) {
        if let Some(job) = self.jobs.get_mut(job_type).and_then(|jobs| jobs.last_mut()) {
            job.status = status;
            job.finished_at = Some(self.clock);
        }
    }

    fn try_reclaim_timeout(&mut self, job_type: JobType) -> bool {
        let clock = self.clock;
        if let Some(job) = self.jobs.get_mut(job_type).and_then(|jobs| jobs.last_mut()) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Timeout;
                job.finished_at = Some(clock);
                return true;
            }
        }
        false
    }

    fn now(&self) -> i64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MapUpdateKind;

    #[test]
    fn try_start_twice_without_finishing_is_lock_contention() {
        let mut store = InMemoryJobStore::new();
        store.push_update(MapUpdate { id: MapUpdateId(1), kind: MapUpdateKind::Direct, created_at: 0 });
        store.try_start("a", MapUpdateId(1)).unwrap();
        assert!(matches!(store.try_start("a", MapUpdateId(1)), Err(McpError::JobLockContention {.. })));
    }

    #[test]
    fn reclaim_timeout_frees_the_slot_for_a_retry() {
        let mut store = InMemoryJobStore::new();
        store.push_update(MapUpdate { id: MapUpdateId(1), kind: MapUpdateKind::Direct, created_at: 0 });
        store.try_start("a", MapUpdateId(1)).unwrap();
        assert!(store.try_reclaim_timeout("a"));
        assert!(store.running("a").is_none());
        assert!(store.try_start("a", MapUpdateId(1)).is_ok());
    }
}
