//! Catalog command-line entry point.
//!
//! # Responsibility
//! - Wire configuration, logging, and the catalog stores for one command.
//! - Print results as JSON on stdout.

use anyhow::{Context, Result};
use catalog_core::db::open_db;
use catalog_core::{
    init_logging, AddItemRequest, Cancellation, CatalogConfig, CatalogService, FsImageStore,
    SqliteCategoryStore, SqliteItemStore,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "catalog", version, about = "Catalog item and category store")]
struct Cli {
    /// Abort the command after this many seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add an item, creating its category on first use.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        /// Image file to store alongside the item.
        #[arg(long)]
        image: PathBuf,
    },
    /// List all items.
    List,
    /// Show one item.
    Get { id: i64 },
    /// List items whose name contains KEYWORD.
    Search { keyword: String },
    /// Show one category.
    Category { id: i64 },
    /// List all categories.
    Categories,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CatalogConfig::from_env();
    config.validate().context("invalid catalog configuration")?;

    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir)
            .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;
    }

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn)?,
        SqliteItemStore::try_new(&conn)?,
        FsImageStore::new(config.image_dir.clone()),
    );

    let cancel = match cli.timeout_secs {
        Some(secs) => Cancellation::with_timeout(Duration::from_secs(secs)),
        None => Cancellation::new(),
    };

    match cli.command {
        Command::Add {
            name,
            category,
            image,
        } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            let added = service.add_item(&cancel, &AddItemRequest::new(name, category, bytes))?;
            print_json(&added)
        }
        Command::List => print_json(&service.list_items(&cancel)?),
        Command::Get { id } => print_json(&service.get_item(&cancel, id)?),
        Command::Search { keyword } => print_json(&service.search_items(&cancel, &keyword)?),
        Command::Category { id } => print_json(&service.get_category(&cancel, id)?),
        Command::Categories => print_json(&service.list_categories(&cancel)?),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
