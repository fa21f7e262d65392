// filename -> tag set decomposition
use std::collections::HashMap;

use crate::core::manifest::BidsError;

/// Key under which the trailing keyless segment is stored. A BIDS filename
/// ends in a bare modality tag (`...T1w`, `...bold`), which has no explicit
/// `key-` prefix of its own.
pub const MODALITY_KEY: &str = "modality";

/// Decompose a BIDS filename into its tag set.
///
/// Segments are split on `_`; within a segment, the key is everything up to
/// the first `-` and the value everything after it. A segment with no `-` is
/// the implicit modality tag. A key occurring twice is an error: silently
/// keeping one of the two values would let a mis-typed filename through.
pub fn parse_tags(fname: &str) -> Result<HashMap<String, String>, BidsError> {
    let mut tags = HashMap::new();

    for segment in fname.split('_') {
        let (key, value) = match segment.split_once('-') {
            Some((key, value)) => (key, value),
            None => (MODALITY_KEY, segment),
        };

        if tags.insert(key.to_string(), value.to_string()).is_some() {
            return Err(BidsError::InvalidFilename {
                filename: fname.to_string(),
                reason: format!("duplicate tag key '{key}'"),
            });
        }
    }

    Ok(tags)
}
