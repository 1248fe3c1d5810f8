use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("entity nesting exceeds two property levels (entity type: {entity_type})")]
    NestingTooDeep { entity_type: String },
}

pub type FlattenResult<T> = Result<T, FlattenError>;

/// One row of the tabular export. Absent nesting levels are `None` across
/// the whole column group, so "no value" stays distinguishable from a
/// present-but-empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub entity_id: Option<String>,
    pub entity_type: Option<String>,
    pub entity_confidence: Option<f64>,
    #[serde(rename = "entity_mentionText")]
    pub entity_mention_text: Option<String>,
    pub prop1_id: Option<String>,
    pub prop1_type: Option<String>,
    pub prop1_confidence: Option<f64>,
    #[serde(rename = "prop1_mentionText")]
    pub prop1_mention_text: Option<String>,
    pub prop2_id: Option<String>,
    pub prop2_type: Option<String>,
    pub prop2_confidence: Option<f64>,
    #[serde(rename = "prop2_mentionText")]
    pub prop2_mention_text: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct LevelFields {
    id: Option<String>,
    kind: Option<String>,
    confidence: Option<f64>,
    mention_text: Option<String>,
}

impl FlatRecord {
    fn from_levels(entity: LevelFields, prop1: LevelFields, prop2: LevelFields) -> Self {
        Self {
            entity_id: entity.id,
            entity_type: entity.kind,
            entity_confidence: entity.confidence,
            entity_mention_text: entity.mention_text,
            prop1_id: prop1.id,
            prop1_type: prop1.kind,
            prop1_confidence: prop1.confidence,
            prop1_mention_text: prop1.mention_text,
            prop2_id: prop2.id,
            prop2_type: prop2.kind,
            prop2_confidence: prop2.confidence,
            prop2_mention_text: prop2.mention_text,
        }
    }
}

/// Converts a normalized entity tree into flat rows: one row per
/// deepest-populated property, one row for an entity with no properties.
/// Trees nested deeper than two property levels are rejected rather than
/// silently truncated.
pub fn flatten_entities(entities: &[Value]) -> FlattenResult<Vec<FlatRecord>> {
    let mut records = Vec::new();

    for entity in entities {
        let entity_fields = level_fields(entity);

        let Some(props1) = non_empty_properties(entity) else {
            records.push(FlatRecord::from_levels(
                entity_fields,
                LevelFields::default(),
                LevelFields::default(),
            ));
            continue;
        };

        for prop1 in props1 {
            let prop1_fields = level_fields(prop1);

            let Some(props2) = non_empty_properties(prop1) else {
                records.push(FlatRecord::from_levels(
                    entity_fields.clone(),
                    prop1_fields,
                    LevelFields::default(),
                ));
                continue;
            };

            for prop2 in props2 {
                if non_empty_properties(prop2).is_some() {
                    return Err(FlattenError::NestingTooDeep {
                        entity_type: entity_fields.kind.clone().unwrap_or_else(|| "unknown".into()),
                    });
                }
                records.push(FlatRecord::from_levels(
                    entity_fields.clone(),
                    prop1_fields.clone(),
                    level_fields(prop2),
                ));
            }
        }
    }

    Ok(records)
}

fn level_fields(node: &Value) -> LevelFields {
    LevelFields {
        id: node.get("id").and_then(scalar_text).as_deref().and_then(clean_text),
        kind: node.get("type").and_then(scalar_text).as_deref().and_then(clean_text),
        confidence: node.get("confidence").and_then(Value::as_f64),
        mention_text: node
            .get("mentionText")
            .and_then(scalar_text)
            .as_deref()
            .and_then(clean_text),
    }
}

fn non_empty_properties(node: &Value) -> Option<&Vec<Value>> {
    node.get("properties")
        .and_then(Value::as_array)
        .filter(|properties| !properties.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Trims, normalizes line breaks to `\n`, and maps empty strings to `None`.
fn clean_text(text: &str) -> Option<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
