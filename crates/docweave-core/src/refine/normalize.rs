use serde_json::Value;

use super::segments::reconstruct_text;

/// Walks the entity tree depth-first and rebuilds `mentionText` from
/// `textAnchor.textSegments` wherever segments are present. Nodes without
/// segments (or when the document body is empty) keep whatever mention text
/// the upstream service supplied. Returns the number of mentions rebuilt.
pub fn normalize_entities(doc_text: &str, entities: &mut [Value]) -> usize {
    let mut rebuilt = 0;

    for entity in entities.iter_mut() {
        let mention = entity
            .get("textAnchor")
            .and_then(|anchor| anchor.get("textSegments"))
            .and_then(Value::as_array)
            .filter(|segments| !segments.is_empty() && !doc_text.is_empty())
            .map(|segments| reconstruct_text(doc_text, segments));

        if let Some(text) = mention {
            if let Some(object) = entity.as_object_mut() {
                object.insert("mentionText".to_string(), Value::String(text));
                rebuilt += 1;
            }
        }

        if let Some(properties) = entity.get_mut("properties").and_then(Value::as_array_mut) {
            rebuilt += normalize_entities(doc_text, properties);
        }
    }

    rebuilt
}

/// Counts every node in the entity tree, at any depth.
pub fn count_entities(entities: &[Value]) -> usize {
    entities
        .iter()
        .map(|entity| {
            1 + entity
                .get("properties")
                .and_then(Value::as_array)
                .map_or(0, |properties| count_entities(properties))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mention_text_overwritten_from_segments() {
        let mut entities = vec![json!({
            "type": "Title",
            "mentionText": "stale value",
            "textAnchor": { "textSegments": [ { "startIndex": "0", "endIndex": "5" } ] }
        })];

        let rebuilt = normalize_entities("fresh text", &mut entities);

        assert_eq!(rebuilt, 1);
        assert_eq!(entities[0]["mentionText"], json!("fresh"));
    }

    #[test]
    fn test_missing_anchor_leaves_mention_untouched() {
        let mut entities = vec![json!({ "type": "Logo", "mentionText": "provider value" })];

        let rebuilt = normalize_entities("document body", &mut entities);

        assert_eq!(rebuilt, 0);
        assert_eq!(entities[0]["mentionText"], json!("provider value"));
    }

    #[test]
    fn test_empty_segments_leave_mention_untouched() {
        let mut entities = vec![json!({
            "mentionText": "kept",
            "textAnchor": { "textSegments": [] }
        })];

        normalize_entities("document body", &mut entities);

        assert_eq!(entities[0]["mentionText"], json!("kept"));
    }

    #[test]
    fn test_empty_document_text_leaves_mention_untouched() {
        let mut entities = vec![json!({
            "mentionText": "kept",
            "textAnchor": { "textSegments": [ { "startIndex": "0", "endIndex": "4" } ] }
        })];

        let rebuilt = normalize_entities("", &mut entities);

        assert_eq!(rebuilt, 0);
        assert_eq!(entities[0]["mentionText"], json!("kept"));
    }

    #[test]
    fn test_nested_properties_visited_at_every_depth() {
        let mut entities = vec![json!({
            "type": "Benefit",
            "textAnchor": { "textSegments": [ { "startIndex": "0", "endIndex": "3" } ] },
            "properties": [
                {
                    "type": "Limit",
                    "textAnchor": { "textSegments": [ { "startIndex": "4", "endIndex": "7" } ] },
                    "properties": [
                        {
                            "type": "Amount",
                            "textAnchor": { "textSegments": [ { "startIndex": "8", "endIndex": "11" } ] }
                        }
                    ]
                }
            ]
        })];

        let rebuilt = normalize_entities("one two six", &mut entities);

        assert_eq!(rebuilt, 3);
        assert_eq!(entities[0]["mentionText"], json!("one"));
        assert_eq!(entities[0]["properties"][0]["mentionText"], json!("two"));
        assert_eq!(
            entities[0]["properties"][0]["properties"][0]["mentionText"],
            json!("six")
        );
    }

    #[test]
    fn test_count_entities_spans_all_depths() {
        let entities = vec![
            json!({ "type": "A", "properties": [ { "type": "B" }, { "type": "C", "properties": [ { "type": "D" } ] } ] }),
            json!({ "type": "E" }),
        ];

        assert_eq!(count_entities(&entities), 5);
    }
}
