use serde_json::Value;

/// Rebuilds the mention text for an entity from its raw offset segments.
///
/// Segments are sorted ascending by start offset before concatenation, so the
/// output is stable even when the upstream service emits multi-span mentions
/// out of order. Segments with unparseable or out-of-range offsets are
/// dropped; the result is trimmed of surrounding whitespace.
pub fn reconstruct_text(doc_text: &str, segments: &[Value]) -> String {
    let boundaries = char_boundaries(doc_text);
    let char_len = boundaries.len() - 1;

    let mut spans: Vec<(usize, usize)> = segments.iter().filter_map(segment_bounds).collect();
    spans.sort_by_key(|&(start, _)| start);

    let mut text = String::new();
    for (start, end) in spans {
        if start <= end && end <= char_len {
            text.push_str(&doc_text[boundaries[start]..boundaries[end]]);
        }
    }

    text.trim().to_string()
}

/// Byte offset of every character boundary, terminal boundary included.
/// Offsets in the wire format count characters, not bytes.
fn char_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(text.len());
    boundaries
}

fn segment_bounds(segment: &Value) -> Option<(usize, usize)> {
    let start = match segment.get("startIndex") {
        None => 0,
        Some(value) => parse_index(value)?,
    };
    let end = match segment.get("endIndex") {
        // Missing endIndex means a zero-length segment at the start offset.
        None => start,
        Some(value) => parse_index(value)?,
    };
    Some((start, end))
}

fn parse_index(value: &Value) -> Option<usize> {
    match value {
        // The wire format encodes offsets as decimal strings.
        Value::String(text) => text.parse::<usize>().ok(),
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        _ => None,
    }
}
