//! `loadmap` / `loadmappkgs`: import one or many map package snapshots
//! into the authoritative store. A "package" here is a JSON
//! snapshot of the entity tables the processing core reads; the editor's
//! own import format is out of scope.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use c3nav_mpc::model::{Building, Door, Level, LocationTag, Parentage, Space};
use c3nav_mpc::store::{InMemoryMapDataStore, MapDataStore};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct MapPackage {
    pub levels: Vec<Level>,
    pub buildings: Vec<Building>,
    pub spaces: Vec<Space>,
    pub doors: Vec<Door>,
    pub location_tags: Vec<LocationTag>,
    pub parentages: Vec<Parentage>,
}

pub fn load_package_file(store: &mut InMemoryMapDataStore, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading package {}", path.display()))?;
    let package: MapPackage =
    serde_json::from_slice(&bytes).with_context(|| format!("parsing package {}", path.display()))?;
    apply_package(store, package);
    Ok(())
}

fn apply_package(store: &mut InMemoryMapDataStore, package: MapPackage) {
    for level in package.levels {
        store.push_level(level);
    }
    for building in package.buildings {
        store.push_building(building);
    }
    for space in package.spaces {
        store.push_space(space);
    }
    for door in package.doors {
        store.push_door(door);
    }
    for tag in package.location_tags {
        store.push_location_tag(tag);
    }
    store.upsert_parentages(&package.parentages);
}

pub fn run_loadmap(cli: &crate::cli::Cli, args: &crate::cli::LoadmapArgs) -> Result<()> {
    let _ = cli;
    let mut store = InMemoryMapDataStore::new();
    load_package_file(&mut store, &args.path)?;
    log::info!(target: "c3nav::cli", "loaded package from {}", args.path.display());
    Ok(())
}

pub fn run_loadmappkgs(cli: &crate::cli::Cli, args: &crate::cli::LoadmapArgs) -> Result<()> {
    let _ = cli;
    let mut store = InMemoryMapDataStore::new();
    let mut count = 0;
    for entry in std::fs::read_dir(&args.path).with_context(|| format!("reading directory {}", args.path.display()))? {
        let entry = entry?;
        if entry.path().extension().is_some_and(|ext| ext == "json") {
            load_package_file(&mut store, &entry.path())?;
            count += 1;
        }
    }
    log::info!(target: "c3nav::cli", "loaded {count} packages from {}", args.path.display());
    Ok(())
}
