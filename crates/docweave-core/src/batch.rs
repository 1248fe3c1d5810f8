use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::refine::{DocumentRefiner, RefineError};
use crate::service::{
    wait_until_done, BatchRequest, ExtractionService, OperationState, ServiceError,
};
use crate::store::{BlobStore, BlobUri, StoreError, JSON_CONTENT_TYPE};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("refine error: {0}")]
    Refine(#[from] RefineError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("extraction operation failed: {0}")]
    OperationFailed(String),
}

pub type BatchResult<T> = Result<T, BatchError>;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub operation: String,
    pub documents_processed: usize,
    /// Blob name and error message for every document that was skipped.
    pub failures: Vec<(String, String)>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Drives one batch extraction end to end: submit, wait, then repair and
/// re-upload every JSON result the service deposited. Service and store are
/// injected; the runner holds no client state of its own.
pub struct BatchRunner<'a> {
    service: &'a dyn ExtractionService,
    store: &'a dyn BlobStore,
    config: BatchConfig,
    refiner: DocumentRefiner,
}

impl<'a> BatchRunner<'a> {
    #[must_use]
    pub fn new(
        service: &'a dyn ExtractionService,
        store: &'a dyn BlobStore,
        config: BatchConfig,
    ) -> Self {
        Self {
            service,
            store,
            config,
            refiner: DocumentRefiner::new(),
        }
    }

    #[must_use]
    pub fn with_refiner(mut self, refiner: DocumentRefiner) -> Self {
        self.refiner = refiner;
        self
    }

    pub async fn run(&self) -> BatchResult<RunSummary> {
        let started_at = Utc::now();

        let request = BatchRequest {
            processor: self.config.processor.clone(),
            input_prefix: self.config.input_prefix.clone(),
            output_prefix: self.config.output_prefix.clone(),
        };
        let operation = self.service.submit(&request).await?;
        info!(operation = %operation, "batch extraction submitted");

        let status = wait_until_done(
            self.service,
            &operation,
            self.config.poll_interval(),
            self.config.timeout(),
        )
        .await?;

        if status.state == OperationState::Failed {
            return Err(BatchError::OperationFailed(
                status.message.unwrap_or_else(|| "unknown".into()),
            ));
        }

        let mut documents_processed = 0;
        let mut failures = Vec::new();

        for destination in &status.outputs {
            let uri = match BlobUri::parse(destination) {
                Ok(uri) => uri,
                Err(error) => {
                    warn!(destination = %destination, error = %error, "skipping output destination");
                    failures.push((destination.clone(), error.to_string()));
                    continue;
                }
            };

            for blob in self.store.list(&uri.key()).await? {
                if blob.content_type != JSON_CONTENT_TYPE {
                    continue;
                }
                match self.process_blob(&uri, &blob.name).await {
                    Ok(()) => documents_processed += 1,
                    Err(error) => {
                        warn!(blob = %blob.name, error = %error, "skipping document");
                        failures.push((blob.name, error.to_string()));
                    }
                }
            }
        }

        info!(
            processed = documents_processed,
            failed = failures.len(),
            "batch run finished"
        );

        Ok(RunSummary {
            run_id: Uuid::now_v7(),
            operation,
            documents_processed,
            failures,
            started_at,
            completed_at: Utc::now(),
        })
    }

    async fn process_blob(&self, destination: &BlobUri, name: &str) -> BatchResult<()> {
        let raw = self.store.download(name).await?;
        let mut doc: Value = serde_json::from_slice(&raw)?;

        let stats = self.refiner.refine(&mut doc)?;
        info!(
            blob = %name,
            entities = stats.entities_visited,
            rebuilt = stats.mentions_rebuilt,
            "document repaired"
        );

        let cleaned = serde_json::to_vec(&doc)?;
        self.store
            .upload(&cleaned_blob_name(destination, name), cleaned, JSON_CONTENT_TYPE)
            .await?;
        Ok(())
    }
}

/// Maps a raw output blob to its destination under the `_cleaned/` prefix,
/// tagging the filename with a `_cleaned` suffix.
fn cleaned_blob_name(destination: &BlobUri, name: &str) -> String {
    let base = destination.key();
    let relative = name
        .strip_prefix(base.trim_end_matches('/'))
        .unwrap_or(name)
        .trim_start_matches('/');
    let file = relative.strip_suffix(".json").map_or_else(
        || relative.to_string(),
        |stem| format!("{stem}_cleaned.json"),
    );
    format!("{}{}", destination.cleaned_prefix(), file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{OperationStatus, ServiceResult};
    use crate::store::MemoryBlobStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubService {
        outputs: Vec<String>,
    }

    #[async_trait]
    impl ExtractionService for StubService {
        async fn submit(&self, _request: &BatchRequest) -> ServiceResult<String> {
            Ok("operations/stub".into())
        }

        async fn status(&self, _operation: &str) -> ServiceResult<OperationStatus> {
            Ok(OperationStatus {
                state: OperationState::Succeeded,
                message: None,
                outputs: self.outputs.clone(),
            })
        }
    }

    fn raw_document() -> Value {
        json!({
            "text": "Policy Title",
            "pages": [ { "tokens": [] } ],
            "entities": [
                {
                    "type": "Title",
                    "textAnchor": { "textSegments": [ { "startIndex": "0", "endIndex": "12" } ] }
                }
            ]
        })
    }

    fn test_config() -> BatchConfig {
        BatchConfig {
            processor: "proc-1".into(),
            input_prefix: "gs://bucket/in/".into(),
            output_prefix: "gs://bucket/out/".into(),
            poll_interval_secs: 0,
            timeout_secs: 5,
            ..BatchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_repairs_and_uploads_cleaned_documents() {
        let store = MemoryBlobStore::new();
        store
            .upload(
                "bucket/out/doc-1/result.json",
                serde_json::to_vec(&raw_document()).unwrap(),
                JSON_CONTENT_TYPE,
            )
            .await
            .unwrap();
        store
            .upload("bucket/out/doc-1/page.bin", vec![0], "application/octet-stream")
            .await
            .unwrap();

        let service = StubService {
            outputs: vec!["gs://bucket/out/doc-1/".into()],
        };
        let runner = BatchRunner::new(&service, &store, test_config());

        let summary = runner.run().await.unwrap();

        assert_eq!(summary.documents_processed, 1);
        assert!(summary.failures.is_empty());

        let cleaned = store
            .download("bucket/out/doc-1_cleaned/result_cleaned.json")
            .await
            .unwrap();
        let doc: Value = serde_json::from_slice(&cleaned).unwrap();
        assert_eq!(doc["entities"][0]["mentionText"], json!("Policy Title"));
        assert!(doc["entities"][0].get("textAnchor").is_none());
        assert!(doc.get("pages").is_none());
    }

    #[tokio::test]
    async fn test_run_recovers_from_malformed_documents() {
        let store = MemoryBlobStore::new();
        store
            .upload("bucket/out/doc-1/bad.json", b"not json".to_vec(), JSON_CONTENT_TYPE)
            .await
            .unwrap();
        store
            .upload(
                "bucket/out/doc-1/good.json",
                serde_json::to_vec(&raw_document()).unwrap(),
                JSON_CONTENT_TYPE,
            )
            .await
            .unwrap();

        let service = StubService {
            outputs: vec!["gs://bucket/out/doc-1/".into()],
        };
        let runner = BatchRunner::new(&service, &store, test_config());

        let summary = runner.run().await.unwrap();

        assert_eq!(summary.documents_processed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "bucket/out/doc-1/bad.json");
    }

    #[tokio::test]
    async fn test_run_surfaces_operation_failure() {
        struct FailingService;

        #[async_trait]
        impl ExtractionService for FailingService {
            async fn submit(&self, _request: &BatchRequest) -> ServiceResult<String> {
                Ok("operations/fail".into())
            }

            async fn status(&self, _operation: &str) -> ServiceResult<OperationStatus> {
                Ok(OperationStatus {
                    state: OperationState::Failed,
                    message: Some("quota exceeded".into()),
                    outputs: Vec::new(),
                })
            }
        }

        let store = MemoryBlobStore::new();
        let runner = BatchRunner::new(&FailingService, &store, test_config());

        let error = runner.run().await.unwrap_err();

        assert!(matches!(error, BatchError::OperationFailed(message) if message == "quota exceeded"));
    }

    #[test]
    fn test_cleaned_blob_name() {
        let uri = BlobUri::parse("gs://bucket/out/doc-1/").unwrap();

        assert_eq!(
            cleaned_blob_name(&uri, "bucket/out/doc-1/result.json"),
            "bucket/out/doc-1_cleaned/result_cleaned.json"
        );
        assert_eq!(
            cleaned_blob_name(&uri, "bucket/out/doc-1/sub/result.json"),
            "bucket/out/doc-1_cleaned/sub/result_cleaned.json"
        );
    }
}
