use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use docweave_core::DocumentRefiner;

pub fn run(input: &Path, output: &Path) -> Result<()> {
    let raw = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mut doc: Value =
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", input.display()))?;

    let stats = DocumentRefiner::new().refine(&mut doc)?;

    let repaired = serde_json::to_vec_pretty(&doc)?;
    fs::write(output, repaired).with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Rebuilt {} mentions across {} entities in {} ms -> {}",
        stats.mentions_rebuilt,
        stats.entities_visited,
        stats.duration_ms,
        output.display()
    );
    Ok(())
}
