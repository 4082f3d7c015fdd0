//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::build::{self, FragmentArgs};
use super::harness_cmd;
use super::logging;
use super::output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "amalgam")]
#[command(author, version, about = "Amalgamate header fragments into a single self-contained include")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the amalgamated header (full rebuild)
    Build {
        #[command(flatten)]
        fragments: FragmentArgs,

        /// Output path (overrides the manifest)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show the order fragments would be emitted in
    Order {
        #[command(flatten)]
        fragments: FragmentArgs,
    },

    /// Show each fragment's local dependencies and external includes
    Deps {
        #[command(flatten)]
        fragments: FragmentArgs,
    },

    /// Run a typed test suite and write `<case>_output.json` files
    Harness {
        /// Test suite JSON file
        suite: PathBuf,

        /// Directory the output files are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let output = Output::new(cli.format);

    match cli.command {
        Commands::Build { fragments, output: out_path } => {
            debug!(fragments = ?fragments.fragments, "build");
            build::build(&output, &fragments, out_path)?
        }
        Commands::Order { fragments } => build::order(&output, &fragments)?,
        Commands::Deps { fragments } => build::deps(&output, &fragments)?,
        Commands::Harness { suite, out_dir } => harness_cmd::run(&output, &suite, &out_dir)?,
    }

    debug!("command completed successfully");
    Ok(())
}
