use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use docweave_core::{write_records_to_path, DocumentRefiner};

pub fn run(input: &Path, output: &Path) -> Result<()> {
    let raw = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let doc: Value =
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", input.display()))?;

    let records = DocumentRefiner::new().flatten(&doc)?;
    write_records_to_path(output, &records)?;

    println!("Wrote {} rows -> {}", records.len(), output.display());
    Ok(())
}
