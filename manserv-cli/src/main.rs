//! manserv command-line interface.
//!
//! This binary drives the manserv library: building the redirect index
//! from extracted packages, serving the rendered documentation tree, and
//! inspecting persisted index files.

mod commands;
mod error;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "manserv",
    version,
    about = "Build and serve a static manual page mirror"
)]
struct Cli {
    /// Print additional status messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan extracted packages and write the redirect index
    Build(commands::build::BuildArgs),

    /// Serve the rendered documentation tree
    Serve(commands::serve::ServeArgs),

    /// Summarize a persisted index file
    Inspect(commands::inspect::InspectArgs),

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build(args) => commands::build::run(args),
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Initialize stderr logging; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
