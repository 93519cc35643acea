mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 strucflow CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let app_config = config::load_config(cli.config.as_deref(), &cli.set_values)?;
    debug!("Resolved configuration: {:?}", &app_config);

    let command_result = match cli.command {
        Commands::Tmalign(args) => {
            info!("Dispatching to 'tmalign' command.");
            commands::tmalign::run(args, &app_config)
        }
        Commands::CaspQa(args) => {
            info!("Dispatching to 'casp-qa' command.");
            commands::casp_qa::run(args, &app_config)
        }
        Commands::Fetch(args) => {
            info!("Dispatching to 'fetch' command.");
            commands::fetch::run(args, &app_config)
        }
        Commands::Spin(args) => {
            info!("Dispatching to 'spin' command.");
            commands::animate::run_spin(args, &app_config)
        }
        Commands::Turntable(args) => {
            info!("Dispatching to 'turntable' command.");
            commands::animate::run_turntable(args, &app_config)
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            println!("✅ Command completed successfully.");
        }
        Err(e) => {
            error!("❌ Command failed: {}", e);
            eprintln!("❌ Command failed: {}", e);
        }
    }

    command_result
}
