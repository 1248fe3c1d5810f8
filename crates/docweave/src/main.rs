mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command)
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Refine { input, output } => cli::refine::run(&input, &output),
        Commands::Export { input, output } => cli::export::run(&input, &output),
        Commands::Batch { config, store_root } => cli::batch::run(&config, &store_root),
    }
}
