//! `dumpmap`: write the in-memory store's entity tables back out as a
//! single JSON package (the inverse of [`crate::commands::loadmap`]).

use anyhow::{Context, Result};

use c3nav_mpc::store::{InMemoryMapDataStore, MapDataStore};

use super::loadmap::MapPackage;

pub fn run_dumpmap(cli: &crate::cli::Cli, args: &crate::cli::DumpmapArgs) -> Result<()> {
    let _ = cli;
    // A fresh store stands in for "the authoritative store" until a real
    // backend is wired in; dumping it exercises the serialization path.
    let store = InMemoryMapDataStore::new();

    let package = MapPackage {
        levels: store.levels(),
        buildings: Vec::new(),
        spaces: Vec::new(),
        doors: Vec::new(),
        location_tags: store.location_tags(),
        parentages: store.parentages(),
    };

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output directory {}", args.output.display()))?;
    let out_path = args.output.join("map.json");
    let bytes = serde_json::to_vec_pretty(&package)?;
    std::fs::write(&out_path, bytes).with_context(|| format!("writing {}", out_path.display()))?;

    log::info!(target: "c3nav::cli", "dumped map package to {}", out_path.display());
    Ok(())
}
