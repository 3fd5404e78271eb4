use ahash::AHashMap;

use crate::model::JobType;

/// Static configuration for one registered job, the Rust analogue of
/// `@register_mapupdate_job` + `MapUpdateJobConfig`. `key`/`title`/
/// `dependencies` are set once at startup; there's no runtime registration
/// since Rust has no decorator-time side effects to hang this off of.
#[derive(Debug, Clone, Copy)]
pub struct JobConfig {
    pub key: JobType,
    pub title: &'static str,
    /// Run inline in the commit hook rather than dispatched to a queue.
    pub eager: bool,
    pub dependencies: &'static [JobType],
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: AHashMap<JobType, JobConfig>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, config: JobConfig) {
        self.jobs.insert(config.key, config);
    }

    pub fn get(&self, job_type: JobType) -> &JobConfig {
        self.jobs.get(job_type).unwrap_or_else(|| panic!("job type not registered: {job_type}"))
    }

    pub fn all_job_types(&self) -> impl Iterator<Item = JobType> + '_ {
        self.jobs.keys().copied()
    }

    pub fn eager_job_types(&self) -> impl Iterator<Item = JobType> + '_ {
        self.jobs.values().filter(|c| c.eager).map(|c| c.key)
    }
}
