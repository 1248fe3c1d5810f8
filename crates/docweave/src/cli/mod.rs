pub mod batch;
pub mod export;
pub mod refine;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dwv",
    about = "Repair and export structured document-extraction results",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild mention text and strip layout fields from a raw result
    Refine {
        /// Raw extraction result (JSON)
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the repaired document
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Flatten a repaired document into CSV rows
    Export {
        /// Repaired document (JSON)
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run a full batch extraction and repair every result
    Batch {
        /// Batch configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,
        /// Directory backing the blob store
        #[arg(long, default_value = ".")]
        store_root: PathBuf,
    },
}
