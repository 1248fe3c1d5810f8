pub mod batch;
pub mod config;
pub mod export;
pub mod refine;
pub mod service;
pub mod store;

pub use batch::{BatchError, BatchResult, BatchRunner, RunSummary};
pub use config::{BatchConfig, ConfigError};
pub use export::{write_records, write_records_to_path, ExportError};
pub use refine::{
    flatten_entities, normalize_entities, prune_fields, reconstruct_text, DocumentRefiner,
    FlatRecord, FlattenError, RefineError, RefineStats, DEFAULT_PRUNED_FIELDS,
};
pub use service::{
    wait_until_done, BatchRequest, ExtractionService, HttpExtractionService, OperationState,
    OperationStatus, ServiceError,
};
pub use store::{BlobMeta, BlobStore, BlobUri, LocalBlobStore, MemoryBlobStore, StoreError};
