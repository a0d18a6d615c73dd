//! `manserv serve` - development server for the rendered tree.

use std::path::PathBuf;

use clap::Args;
use manserv::index::storage;
use manserv::redirect::SectionOrder;

use crate::commands::common::load_config;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Configuration file (defaults to the user configuration path)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory from which the documentation should be served
    #[arg(long)]
    pub serving_dir: Option<PathBuf>,

    /// host:port on which to serve documentation
    #[arg(long)]
    pub listen: Option<String>,

    /// Index file to load; may be given several times, entries of later
    /// files are merged in
    #[arg(long = "index")]
    pub indexes: Vec<PathBuf>,
}

pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    let serving_dir = args.serving_dir.unwrap_or(config.server.serving_dir);
    let listen = args.listen.unwrap_or(config.server.listen);
    let index_paths = if args.indexes.is_empty() {
        vec![serving_dir.join(&config.server.index)]
    } else {
        args.indexes
    };

    // A broken index must keep the server from starting at all.
    let index = storage::load(&index_paths)?;
    let section_order = SectionOrder::man_default();

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::RuntimeCreation)?;
    runtime
        .block_on(manserv::server::serve(
            &listen,
            serving_dir,
            index,
            section_order,
        ))
        .map_err(CliError::from)
}
