//! `manserv build` - scan extracted packages and write the redirect
//! index.

use std::path::PathBuf;

use clap::Args;
use manserv::config::Product;
use manserv::index::{build_index, storage, ProductOrder};

use crate::commands::common::load_config;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Configuration file (defaults to the user configuration path)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory in which to place the index
    #[arg(long)]
    pub serving_dir: Option<PathBuf>,

    /// Index file name, relative to the serving directory
    #[arg(long)]
    pub index: Option<String>,

    /// Scan a single cache directory instead of the configured products
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Product name for --cache scans
    #[arg(long, default_value = "manpages")]
    pub product: String,
}

pub fn run(args: BuildArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    let products = match args.cache {
        Some(cache) => vec![Product {
            name: args.product.clone(),
            aliases: Vec::new(),
            cache_dirs: vec![cache],
        }],
        None => config.products.clone(),
    };
    if products.is_empty() {
        return Err(CliError::Config(
            "no products configured; add [product.<name>] sections or pass --cache".to_string(),
        ));
    }

    let order = ProductOrder::new(config.product_order.clone());
    let (index, stats) = build_index(&products, &order)?;

    let serving_dir = args.serving_dir.unwrap_or(config.server.serving_dir);
    std::fs::create_dir_all(&serving_dir).map_err(CliError::Io)?;
    let index_path = serving_dir.join(args.index.unwrap_or(config.server.index));
    tracing::info!(path = %index_path.display(), "writing redirect index");
    let bytes = storage::save(&index, &index_path)?;

    println!("packages scanned:        {}", stats.packages_scanned);
    println!("packages with manpages:  {}", stats.packages_with_manpages);
    println!("entries indexed:         {}", stats.entries_indexed);
    println!("duplicates skipped:      {}", stats.duplicates_skipped);
    println!("paths ignored:           {}", stats.paths_ignored);
    println!("index bytes written:     {}", bytes);

    Ok(())
}
