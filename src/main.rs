//! bytefsm - byte-input finite state machine engine
//!
//! Runs the bundled demo machines, either one-shot or from a REPL.

mod commands;
mod demos;
mod repl;

use bytefsm_core::EngineConfig;
use clap::{Parser, Subcommand};
use colored::Colorize;
use demos::DemoKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bytefsm")]
#[command(about = "Byte-input finite state machine engine")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "BYTEFSM_CONFIG")]
    config: Option<PathBuf>,

    /// Print run reports as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive REPL
    Repl {
        /// Demo selected on startup
        #[arg(value_enum, default_value = "bit-counter")]
        demo: DemoKind,
    },

    /// List the bundled demos
    List,

    /// Print the states and transitions of a demo
    Describe {
        #[arg(value_enum)]
        demo: DemoKind,
    },

    /// Run a demo over one input
    Run {
        #[arg(value_enum)]
        demo: DemoKind,

        /// Input bytes (read from stdin when omitted)
        input: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match EngineConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        None => repl::run(&config, DemoKind::BitCounter, cli.json)?,
        Some(Commands::Repl { demo }) => repl::run(&config, demo, cli.json)?,
        Some(cmd) => match commands::execute(&config, cmd, cli.json) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
