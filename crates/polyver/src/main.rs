//! polyver command-line entry point.

use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod installers;
mod logging;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match bootstrap::app_paths() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };
    if let Err(error) = paths.ensure_dirs() {
        eprintln!("error: could not create data directories: {error}");
        std::process::exit(1);
    }

    logging::init_logging(&paths, cli.verbose);

    let engine = bootstrap::build_engine(&paths);
    let exit_code = commands::dispatch(cli.command, &engine).await;
    std::process::exit(exit_code);
}
