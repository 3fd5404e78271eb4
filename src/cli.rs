//! CLI argument schema: thin by design, kept separate from the command
//! bodies in `commands/`.

use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(name = "mpc", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to a config TOML file; falls back to defaults for anything unset.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Write map packages to disk.
    Dumpmap(DumpmapArgs),
    /// Import a single map package.
    Loadmap(LoadmapArgs),
    /// Import every map package in a directory.
    Loadmappkgs(LoadmapArgs),
    /// Run every queued job to completion and exit.
    Processupdates,
}

#[derive(clap::Args, Debug)]
pub struct DumpmapArgs {
    /// Output directory for the dumped packages.
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct LoadmapArgs {
    /// Package file (or directory, for `loadmappkgs`) to import.
    #[arg(value_hint = clap::ValueHint::AnyPath)]
    pub path: PathBuf,
}
