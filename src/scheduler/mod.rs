//! Job scheduler: runs registered processing jobs in dependency
//! order, enforcing that a job only reprocesses once something newer than
//! its last successful/skipped run exists, and reclaiming `RUNNING` rows
//! abandoned by a crashed worker.

mod registry;
mod store;

pub use registry::{JobConfig, JobRegistry};
pub use store::{InMemoryJobStore, JobStore};

use crate::error::McpError;
use crate::model::{Job, JobStatus, JobType, MapUpdate, MapUpdateId};

/// Runs every `eager` job in dependency order for a single freshly-committed
/// update, the way a commit hook does when no queue worker is configured.
pub fn run_eager_jobs<S: JobStore>(
    store: &mut S,
    registry: &JobRegistry,
    update: &MapUpdate,
    mut run: impl FnMut(JobType, &[MapUpdate]) -> anyhow::Result<bool>,
) -> Result<(), McpError> {
    let mut done = ahash::AHashSet::default();
    let mut remaining: Vec<JobType> = registry.eager_job_types().collect();

    while let Some(pos) = remaining.iter().position(|&job_type| {
            registry.get(job_type).dependencies.iter().all(|dep| done.contains(dep))
    }) {
        let job_type = remaining.remove(pos);
        run_job(store, registry, job_type, &mut run)?;
        done.insert(job_type);
    }
    Ok(())
}

/// Runs every registered job once, in dependency order, blocking until all
/// of them have settled.
pub fn run_all_jobs<S: JobStore>(
    store: &mut S,
    registry: &JobRegistry,
    mut run: impl FnMut(JobType, &[MapUpdate]) -> anyhow::Result<bool>,
) -> Result<(), McpError> {
    let mut done = ahash::AHashSet::default();
    let mut remaining: Vec<JobType> = registry.all_job_types().collect();

    while let Some(pos) = remaining
        .iter()
        .position(|&job_type| registry.get(job_type).dependencies.iter().all(|dep| done.contains(dep)))
    {
        let job_type = remaining.remove(pos);

        if let Some(running) = store.running(job_type) {
            if check_running_job(store, job_type, &running) {
                log::info!(target: "c3nav::scheduler", "job already running: {job_type}");
                done.insert(job_type);
                continue;
            }
        }

        match run_job(store, registry, job_type, &mut run) {
            Ok(()) => {}
            Err(McpError::JobLockContention { job_type }) => {
                log::info!(target: "c3nav::scheduler", "couldn't start job, race condition?: {job_type}");
            }
            Err(other) => return Err(other),
        }
        done.insert(job_type);
    }
    Ok(())
}

/// Runs `job_type` with whatever updates it can run with right now. A no-op
/// (not an error) if the job has unmet dependencies or nothing new to
/// process.
pub fn run_job<S: JobStore>(
    store: &mut S,
    registry: &JobRegistry,
    job_type: JobType,
    run: &mut impl FnMut(JobType, &[MapUpdate]) -> anyhow::Result<bool>,
) -> Result<(), McpError> {
    let config = registry.get(job_type);
    let last_job = store.last_successful_or_skipped(job_type);
    let last_up_to = last_job.as_ref().map(|j| j.up_to).unwrap_or(MapUpdateId(0));

    let newest_runnable = if config.dependencies.is_empty() {
        store.last_update()
    } else {
        let mut newest = None;
        for &dependency in config.dependencies {
            let Some(dep_job) = store.last_successful_or_skipped(dependency) else {
                log::info!(target: "c3nav::scheduler", "unfulfilled dependency for job: {}", config.title);
                return Ok(());
            };
            newest = Some(match newest {
                    Some(existing) => std::cmp::min(existing, dep_job.up_to),
                    None => dep_job.up_to,
            });
        }
        newest.unwrap()
    };

    if newest_runnable <= last_up_to {
        log::info!(target: "c3nav::scheduler", "no updates for job: {}", config.title);
        return Ok(());
    }

    run_job_range(store, job_type, config.title, last_up_to, newest_runnable, run)
}

fn run_job_range<S: JobStore>(
    store: &mut S,
    job_type: JobType,
    title: &str,
    last_up_to: MapUpdateId,
    up_to: MapUpdateId,
    run: &mut impl FnMut(JobType, &[MapUpdate]) -> anyhow::Result<bool>,
) -> Result<(), McpError> {
    log::info!(target: "c3nav::scheduler", "running job: {title}");
    store.try_start(job_type, up_to)?;

    let updates = store.updates_between(last_up_to, up_to);
    match run(job_type, &updates) {
        Ok(had_effect) => {
            store.finish(job_type, if had_effect { JobStatus::Success } else { JobStatus::Skipped });
            Ok(())
        }
        Err(source) => {
            store.finish(job_type, JobStatus::Failed);
            Err(McpError::JobFailed { job_type, up_to, source })
        }
    }
}

/// `true` if the job is genuinely still alive and should be left alone,
/// `false` if it was reclaimed (or already wasn't running).
fn check_running_job<S: JobStore>(store: &mut S, job_type: JobType, running: &Job) -> bool {
    const GRACE_SECONDS: i64 = 10;
    let age = store.now() - running.started_at;
    if age < GRACE_SECONDS {
        return true;
    }
    !store.try_reclaim_timeout(job_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MapUpdateKind;

    fn update(id: u64, at: i64) -> MapUpdate {
        MapUpdate { id: MapUpdateId(id), kind: MapUpdateKind::Direct, created_at: at }
    }

    /// S6: jobs A/B with `deps(B) = {A}`; after commit U1, running
    /// the scheduler runs A for U1 then B for U1; re-running is a no-op.
    #[test]
    fn s6_dependent_job_waits_then_runs_then_settles() {
        let mut registry = JobRegistry::new();
        registry.register(JobConfig { key: "a", title: "A", eager: false, dependencies: &[] });
        registry.register(JobConfig { key: "b", title: "B", eager: false, dependencies: &["a"] });

        let mut store = InMemoryJobStore::new();
        store.push_update(update(1, 1000));

        let mut ran = Vec::new();
        run_all_jobs(&mut store, &registry, |job_type, updates| {
                ran.push((job_type, updates.iter().map(|u| u.id).collect::<Vec<_>>()));
                Ok(true)
        })
            .unwrap();

        assert_eq!(ran, vec![("a", vec![MapUpdateId(1)]), ("b", vec![MapUpdateId(1)])]);

        ran.clear();
        run_all_jobs(&mut store, &registry, |job_type, updates| {
                ran.push((job_type, updates.iter().map(|u| u.id).collect::<Vec<_>>()));
                Ok(true)
        })
            .unwrap();
        assert!(ran.is_empty(), "re-running with no new updates is a no-op");
    }

    #[test]
    fn job_with_unmet_dependency_is_skipped_not_errored() {
        let mut registry = JobRegistry::new();
        registry.register(JobConfig { key: "a", title: "A", eager: false, dependencies: &[] });
        registry.register(JobConfig { key: "b", title: "B", eager: false, dependencies: &["a"] });

        let mut store = InMemoryJobStore::new();
        store.push_update(update(1, 1000));

        let mut ran = Vec::new();
        run_job(&mut store, &registry, "b", &mut |job_type, updates| {
                ran.push((job_type, updates.len()));
                Ok(true)
        })
            .unwrap();
        assert!(ran.is_empty());
    }

    #[test]
    fn failed_job_records_failed_status_and_propagates_error() {
        let mut registry = JobRegistry::new();
        registry.register(JobConfig { key: "a", title: "A", eager: false, dependencies: &[] });
        let mut store = InMemoryJobStore::new();
        store.push_update(update(1, 1000));

        let err = run_job(&mut store, &registry, "a", &mut |_, _| anyhow::bail!("boom"));
        assert!(matches!(err, Err(McpError::JobFailed {.. })));
        assert_eq!(store.last_status("a"), Some(JobStatus::Failed));
    }
}
