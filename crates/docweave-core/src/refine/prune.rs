use serde_json::Value;

/// Layout and geometry fields stripped from a document before it is
/// persisted or exported. `mentionText` is never in this set; reconstruction
/// must run before pruning since it reads `textAnchor`.
pub const DEFAULT_PRUNED_FIELDS: &[&str] = &[
    "pageRefs",
    "textAnchor",
    "boundingPoly",
    "textSegments",
    "pageAnchor",
    "detectedLanguages",
    "layout",
    "detectedBreak",
    "dimension",
    "image",
    "tables",
    "blocks",
    "lines",
    "tokens",
    "pages",
    "documentLayout",
];

/// Removes every key named in `fields` from every object in the tree,
/// in place, at any depth. Arrays are traversed element-wise; scalar leaves
/// are left alone.
pub fn prune_fields(node: &mut Value, fields: &[&str]) {
    match node {
        Value::Object(map) => {
            for field in fields {
                map.remove(*field);
            }
            for value in map.values_mut() {
                prune_fields(value, fields);
            }
        }
        Value::Array(items) => {
            for item in items {
                prune_fields(item, fields);
            }
        }
        _ => {}
    }
}
