//! Dubmix CLI
//!
//! Command-line interface for the bus mixer and the timeline compositor.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use dubmix::cli::commands::{self, Stems, SurgeryOptions};
use dubmix::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    info!("Dubmix v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Dubmix v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => commands::init_config(&path)
            .with_context(|| format!("writing configuration to {}", path.display())),
        Commands::Status { config } => commands::status(&config)
            .with_context(|| format!("reading configuration {}", config.display())),
        Commands::Mix {
            config,
            settings,
            voice,
            music,
            sfx,
            env,
            output,
            bit_depth,
        } => {
            let stems = Stems {
                voice,
                music,
                sfx,
                env,
            };
            commands::mix(
                config.as_deref(),
                settings.as_deref(),
                &stems,
                &output,
                bit_depth,
            )
            .with_context(|| format!("mixing into {}", output.display()))
        }
        Commands::Surgery {
            background,
            clips,
            output,
            config,
            no_duck,
            duck_attenuation,
            offline,
        } => {
            let options = SurgeryOptions {
                config,
                no_duck,
                duck_attenuation,
                offline,
            };
            commands::surgery(&background, clips, &output, &options)
                .with_context(|| format!("compositing {}", background.display()))
        }
    }
}
