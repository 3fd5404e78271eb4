mod cli;
mod commands;

use clap::Parser;

use cli::{Cli, Commands};
use commands::{dumpmap, loadmap, processupdates};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Commands::Dumpmap(args) => match dumpmap::run_dumpmap(&cli, args) {
            Ok(()) => 0,
            Err(err) => {
                log::error!(target: "c3nav::cli", "dumpmap failed: {err:#}");
                1
            }
        },
        Commands::Loadmap(args) => match loadmap::run_loadmap(&cli, args) {
            Ok(()) => 0,
            Err(err) => {
                log::error!(target: "c3nav::cli", "loadmap failed: {err:#}");
                1
            }
        },
        Commands::Loadmappkgs(args) => match loadmap::run_loadmappkgs(&cli, args) {
            Ok(()) => 0,
            Err(err) => {
                log::error!(target: "c3nav::cli", "loadmappkgs failed: {err:#}");
                1
            }
        },
        Commands::Processupdates => processupdates::run_processupdates(&cli),
    };

    std::process::exit(exit_code);
}
