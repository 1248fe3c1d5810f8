use std::path::Path;

use anyhow::{Context, Result};

use docweave_core::{BatchConfig, BatchRunner, HttpExtractionService, LocalBlobStore};

pub fn run(config_path: &Path, store_root: &Path) -> Result<()> {
    let config = BatchConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut service = HttpExtractionService::from_endpoint(&config.endpoint)?;
    if let Some(token) = config.auth_token.clone() {
        service = service.with_auth_token(token);
    }
    let store = LocalBlobStore::new(store_root);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(BatchRunner::new(&service, &store, config).run())?;

    println!(
        "Run {}: {} documents repaired, {} failed (operation {})",
        summary.run_id,
        summary.documents_processed,
        summary.failures.len(),
        summary.operation
    );
    for (blob, error) in &summary.failures {
        eprintln!("  failed: {blob}: {error}");
    }
    Ok(())
}
