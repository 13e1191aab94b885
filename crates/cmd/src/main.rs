// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::commands::catalog::{CatalogArgs, catalog_command};
use cmd::commands::describe::describe_command;
use cmd::commands::init::{DEFAULT_CONFIG_FILE, init_command};
use cmd::commands::list::list_command;
use cmd::common::CatalogContext;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "cataloguer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file (otherwise CATALOG_SERVICE is required)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output, including asset ids and documents
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or remove assets for one grid cell of a collection
    Catalog(CatalogArgs),
    /// List the items of a collection
    List {
        /// Collection to list
        #[arg(long = "collection")]
        collection_id: String,
    },
    /// Show the attributes and asset id of local files without cataloging them
    Describe {
        /// Files to describe
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write an example configuration file
    Init {
        /// Destination (refuses to overwrite)
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    diagnostics::init();

    let cli = Cli::parse();
    let context = CatalogContext::new(cli.config.clone(), cli.verbose);
    let print = |output: &str| print!("{}", output);

    match &cli.command {
        Commands::Catalog(args) => catalog_command(&context, args, print),
        Commands::List { collection_id } => list_command(&context, collection_id, print),
        Commands::Describe { files } => describe_command(files, cli.verbose, print),
        Commands::Init { file } => init_command(file, print),
    }
}
