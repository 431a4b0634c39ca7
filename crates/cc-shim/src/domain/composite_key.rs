//! Composite key codec.
//!
//! A composite key is `objectType \0 attr1 \0 attr2 ...`. Range scans over one
//! object type (or over a leading run of attributes) become lexical prefix scans.

use crate::errors::{ShimError, ShimResult};

/// Reserved separator between the object type and each attribute.
pub const COMPOSITE_KEY_DELIMITER: char = '\u{0}';

/// Smallest character sorting after the delimiter; bounds prefix scans.
const PREFIX_SCAN_END: char = '\u{1}';

/// Encode `object_type` and `attributes` into one flat ledger key.
pub fn create_composite_key<S: AsRef<str>>(
    object_type: &str,
    attributes: &[S],
) -> ShimResult<String> {
    if object_type.is_empty() {
        return Err(ShimError::InvalidArgument(
            "object type cannot be empty".to_string(),
        ));
    }
    if object_type.contains(COMPOSITE_KEY_DELIMITER) {
        return Err(ShimError::InvalidArgument(
            "object type cannot contain the composite key delimiter".to_string(),
        ));
    }

    let mut key = String::with_capacity(
        object_type.len() + attributes.iter().map(|a| a.as_ref().len() + 1).sum::<usize>(),
    );
    key.push_str(object_type);
    for (index, attribute) in attributes.iter().enumerate() {
        let attribute = attribute.as_ref();
        if attribute.contains(COMPOSITE_KEY_DELIMITER) {
            return Err(ShimError::InvalidArgument(format!(
                "attribute {index} cannot contain the composite key delimiter"
            )));
        }
        key.push(COMPOSITE_KEY_DELIMITER);
        key.push_str(attribute);
    }
    Ok(key)
}

/// Decode a composite key back into its object type and attributes.
pub fn split_composite_key(key: &str) -> ShimResult<(String, Vec<String>)> {
    let mut parts = key.split(COMPOSITE_KEY_DELIMITER);
    let object_type = match parts.next() {
        Some(object_type) if !object_type.is_empty() => object_type.to_string(),
        _ => {
            return Err(ShimError::InvalidFormat(format!(
                "composite key {key:?} has no object type"
            )))
        }
    };
    Ok((object_type, parts.map(str::to_string).collect()))
}

/// Key range `[start, end)` covering every key that equals the encoded
/// prefix or extends it with further attributes.
pub fn partial_key_range<S: AsRef<str>>(
    object_type: &str,
    attributes: &[S],
) -> ShimResult<(String, String)> {
    let start = create_composite_key(object_type, attributes)?;
    let mut end = start.clone();
    end.push(PREFIX_SCAN_END);
    Ok((start, end))
}

/// True if `key` falls inside the partial-composite-key scan for `prefix`.
pub fn matches_partial_key(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(COMPOSITE_KEY_DELIMITER),
        None => false,
    }
}
