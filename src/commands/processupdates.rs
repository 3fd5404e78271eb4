//! `processupdates`: run every queued job to completion and exit. Exit
//! codes: `0` success, `1` a job failed, `2` lock contention (another
//! worker is already running one of these jobs).

use ahash::AHashMap;

use c3nav_mpc::altitude::{build_altitude_areas, LevelInput};
use c3nav_mpc::ancestry::AncestryEngine;
use c3nav_mpc::error::McpError;
use c3nav_mpc::model::{AltitudeArea, Building, Door, JobType, Level, LevelId, Space};
use c3nav_mpc::render::{compose_level_render, LevelRenderInput};
use c3nav_mpc::scheduler::{run_all_jobs, InMemoryJobStore, JobConfig, JobRegistry};
use c3nav_mpc::store::{InMemoryMapDataStore, MapDataStore};
use c3nav_mpc::tracker::ChangeTracker;

const JOB_ALTITUDE: JobType = "c3nav.mapdata.jobs.recalculate_altitudeareas";
const JOB_ANCESTRY: JobType = "c3nav.mapdata.jobs.rebuild_ancestries";
const JOB_RENDER: JobType = "c3nav.mapdata.jobs.render_levels";

fn registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry.register(JobConfig { key: JOB_ALTITUDE, title: "recalculate altitude areas", eager: true, dependencies: &[] });
    registry.register(JobConfig { key: JOB_ANCESTRY, title: "rebuild location ancestries", eager: true, dependencies: &[] });
    registry.register(JobConfig {
            key: JOB_RENDER,
            title: "render levels",
            eager: false,
            dependencies: &[JOB_ALTITUDE],
    });
    registry
}

pub fn run_processupdates(cli: &crate::cli::Cli) -> i32 {
    let _ = cli;
    let registry = registry();
    let mut job_store = InMemoryJobStore::new();
    let mut data_store = InMemoryMapDataStore::new();
    let mut tracker = ChangeTracker::new();

    let result = run_all_jobs(&mut job_store, &registry, |job_type, updates| {
            log::info!(target: "c3nav::cli", "running {job_type} over {} update(s)", updates.len());
            tracker.reset();
            match job_type {
                JOB_ALTITUDE => run_altitude_job(&mut data_store, &mut tracker),
                JOB_ANCESTRY => run_ancestry_job(&data_store),
                JOB_RENDER => run_render_job(&data_store, &mut tracker),
                other => {
                    log::warn!(target: "c3nav::cli", "no handler registered for job type {other}, skipping");
                    Ok(false)
                }
            }
    });

    match result {
        Ok(()) => 0,
        Err(McpError::JobLockContention { job_type }) => {
            log::error!(target: "c3nav::cli", "lock contention on {job_type}");
            2
        }
        Err(other) => {
            log::error!(target: "c3nav::cli", "job failed: {other}");
            1
        }
    }
}

/// Phases A-H over every level, diffed against what's already stored, then
/// the diff is applied and every touched region registered for
/// invalidation.
fn run_altitude_job(store: &mut InMemoryMapDataStore, tracker: &mut ChangeTracker) -> anyhow::Result<bool> {
    let levels = store.levels();
    let buildings: Vec<Vec<Building>> = levels.iter().map(|l| store.buildings(l.id)).collect();
    let spaces: Vec<Vec<Space>> = levels.iter().map(|l| store.spaces(l.id)).collect();
    let doors: Vec<Vec<Door>> = levels.iter().map(|l| store.doors(l.id)).collect();
    let existing: Vec<AltitudeArea> = levels.iter().flat_map(|l| store.altitude_areas(l.id)).collect();

    let inputs: Vec<LevelInput> = levels
        .iter()
        .enumerate()
        .map(|(i, level)| LevelInput { level, buildings: &buildings[i], spaces: &spaces[i], doors: &doors[i] })
        .collect();

    let (_, diff) = build_altitude_areas(&inputs, &existing, || store.next_altitude_area_id());
    log::info!(target: "c3nav::cli", "altitude areas: {}", diff.summary());

    for id in &diff.deleted {
        if let Some(area) = existing.iter().find(|a| a.id == *id) {
            tracker.register_delete(area.level, &area.geometry);
        }
    }
    for area in diff.updated.iter().chain(diff.created.iter()) {
        tracker.register_change(area.level, &area.geometry, false);
    }

    let had_effect = !diff.created.is_empty() || !diff.updated.is_empty() || !diff.deleted.is_empty();
    store.delete_altitude_areas(&diff.deleted);
    store.upsert_altitude_areas(&diff.updated);
    store.upsert_altitude_areas(&diff.created);

    Ok(had_effect)
}

/// Rebuilds the ancestry closure from the stored `Parentage` edges and
/// validates it, the way a migration or integrity sweep would. There's
/// nothing further to persist: an `Ancestry` exists exactly as long as a
/// path witnesses it, and the edges themselves are the store's source of
/// truth.
fn run_ancestry_job(store: &InMemoryMapDataStore) -> anyhow::Result<bool> {
    let mut engine = AncestryEngine::new();
    for parentage in store.parentages() {
        engine
            .add_parent(parentage.parent, parentage.child)
            .map_err(|e| anyhow::anyhow!("edge {:?} -> {:?} rejected while rebuilding: {e}", parentage.parent, parentage.child))?;
    }
    engine.validate_all().map_err(|e| anyhow::anyhow!(e))?;
    log::info!(
        target: "c3nav::cli",
        "ancestry closure rebuilt: {} edges, {} paths",
        engine.parentages().len(),
        engine.paths().len()
    );
    Ok(!engine.parentages().is_empty())
}

/// Composes every non-intermediate level's render artifact and registers
/// its darken area for invalidation.
fn run_render_job(store: &InMemoryMapDataStore, tracker: &mut ChangeTracker) -> anyhow::Result<bool> {
    let levels = store.levels();
    let buildings: Vec<Vec<Building>> = levels.iter().map(|l| store.buildings(l.id)).collect();
    let spaces: Vec<Vec<Space>> = levels.iter().map(|l| store.spaces(l.id)).collect();
    let doors: Vec<Vec<Door>> = levels.iter().map(|l| store.doors(l.id)).collect();
    let altitude_areas: Vec<Vec<AltitudeArea>> = levels.iter().map(|l| store.altitude_areas(l.id)).collect();

    let mut inputs: AHashMap<LevelId, LevelRenderInput> = AHashMap::default();
    for (i, level) in levels.iter().enumerate() {
        inputs.insert(
            level.id,
            LevelRenderInput { level, buildings: &buildings[i], doors: &doors[i], spaces: &spaces[i], altitude_areas: &altitude_areas[i] },
        );
    }
    let all_levels: Vec<&Level> = levels.iter().collect();

    let mut had_effect = false;
    for render_level in levels.iter().filter(|l| !l.is_intermediate()) {
        let (render_data, _restrictions) = compose_level_render(render_level, &all_levels, &inputs);
        log::info!(
            target: "c3nav::cli",
            "rendered level {:?}: {} sublevel geometries",
            render_level.id,
            render_data.levels.len()
        );
        if !render_data.darken_area.0.is_empty() {
            tracker.register_change(render_level.id, &render_data.darken_area, false);
            had_effect = true;
        }
    }
    Ok(had_effect)
}
