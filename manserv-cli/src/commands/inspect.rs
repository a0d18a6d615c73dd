//! `manserv inspect` - summarize a persisted index file.

use std::path::PathBuf;

use clap::Args;
use manserv::index::storage;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Index files to inspect; several files are merged before reporting
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// List every variant of one page name
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let index = storage::load(&args.paths)?;

    let variants: usize = index.entries.values().map(Vec::len).sum();
    println!("page names:     {}", index.entries.len());
    println!("page variants:  {}", variants);
    println!("languages:      {}", index.langs.join(", "));
    println!("sections:       {}", index.sections.join(", "));
    println!("products:       {}", index.product_names.join(", "));

    if let Some(name) = args.name {
        println!();
        match index.entries_for(&name.to_lowercase()) {
            Some(entries) => {
                for entry in entries {
                    println!("{}", entry.serving_path(".html"));
                }
            }
            None => println!("no entries for {:?}", name),
        }
    }

    Ok(())
}
