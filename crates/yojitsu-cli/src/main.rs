//! yojitsu CLI - Budget / Forecast / Actual comparison workbook generator
//!
//! Reads a daily Budget source and writes a formula-driven comparison workbook.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::settings::{ConfigArgs, LayeredConfig};

#[derive(Parser)]
#[command(name = "yojitsu")]
#[command(author, version, about = "Budget / Forecast / Actual comparison workbook generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the comparison workbook
    Generate {
        #[command(flatten)]
        config: ConfigArgs,

        /// Also write the workbook model as JSON
        #[arg(long, value_name = "FILE")]
        dump_layout: Option<PathBuf>,
    },

    /// Validate configuration and source without writing anything
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let working_dir = std::env::current_dir()?;
    match cli.command {
        Commands::Generate {
            config,
            dump_layout,
        } => {
            let provider = LayeredConfig::new(&config, &working_dir);
            let output = commands::generate(&provider, dump_layout.as_deref())?;
            println!("出力完了: {}", output.display());
        }
        Commands::Check { config } => {
            let provider = LayeredConfig::new(&config, &working_dir);
            print!("{}", commands::check(&provider)?);
        }
    }

    Ok(())
}
