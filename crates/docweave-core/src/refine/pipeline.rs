use serde_json::Value;
use thiserror::Error;

use super::flatten::{flatten_entities, FlatRecord, FlattenError};
use super::normalize::{count_entities, normalize_entities};
use super::prune::{prune_fields, DEFAULT_PRUNED_FIELDS};

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

pub type RefineResult<T> = Result<T, RefineError>;

#[derive(Debug, Clone, Default)]
pub struct RefineStats {
    pub entities_visited: usize,
    pub mentions_rebuilt: usize,
    pub duration_ms: u64,
}

/// Repairs a raw extraction result in place: rebuilds every mention text
/// from its offset evidence, then strips the bulky layout fields. Refuses
/// structurally invalid input outright instead of producing a partial tree.
pub struct DocumentRefiner {
    pruned_fields: Vec<String>,
}

impl DocumentRefiner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pruned_fields: DEFAULT_PRUNED_FIELDS.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn with_pruned_fields(mut self, fields: Vec<String>) -> Self {
        self.pruned_fields = fields;
        self
    }

    pub fn refine(&self, doc: &mut Value) -> RefineResult<RefineStats> {
        let started = std::time::Instant::now();

        let object = doc
            .as_object_mut()
            .ok_or_else(|| RefineError::InvalidDocument("top-level value is not an object".into()))?;

        let doc_text = match object.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(_) => return Err(RefineError::InvalidDocument("`text` is not a string".into())),
            None => return Err(RefineError::InvalidDocument("missing `text` field".into())),
        };

        let entities = match object.get_mut("entities") {
            Some(Value::Array(entities)) if !entities.is_empty() => entities,
            Some(Value::Array(_)) => {
                return Err(RefineError::InvalidDocument("`entities` is empty".into()))
            }
            Some(_) => {
                return Err(RefineError::InvalidDocument("`entities` is not an array".into()))
            }
            None => return Err(RefineError::InvalidDocument("missing `entities` field".into())),
        };

        let entities_visited = count_entities(entities);
        let mentions_rebuilt = normalize_entities(&doc_text, entities);

        let fields: Vec<&str> = self.pruned_fields.iter().map(String::as_str).collect();
        prune_fields(doc, &fields);

        Ok(RefineStats {
            entities_visited,
            mentions_rebuilt,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    pub fn flatten(&self, doc: &Value) -> RefineResult<Vec<FlatRecord>> {
        let entities = document_entities(doc)?;
        Ok(flatten_entities(entities)?)
    }
}

impl Default for DocumentRefiner {
    fn default() -> Self {
        Self::new()
    }
}

fn document_entities(doc: &Value) -> RefineResult<&Vec<Value>> {
    let object = doc
        .as_object()
        .ok_or_else(|| RefineError::InvalidDocument("top-level value is not an object".into()))?;

    match object.get("text") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(RefineError::InvalidDocument("`text` is not a string".into())),
        None => return Err(RefineError::InvalidDocument("missing `text` field".into())),
    }

    match object.get("entities") {
        Some(Value::Array(entities)) if !entities.is_empty() => Ok(entities),
        Some(Value::Array(_)) => Err(RefineError::InvalidDocument("`entities` is empty".into())),
        Some(_) => Err(RefineError::InvalidDocument("`entities` is not an array".into())),
        None => Err(RefineError::InvalidDocument("missing `entities` field".into())),
    }
}
