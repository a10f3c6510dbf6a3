//! Appearance attachment maps and their serialized form
//!
//! A creature's look is described by slot → attachment id pairs. The map is
//! stored on items as a JSON object string.

use crate::error::Result;
use indexmap::IndexMap;

/// Attachment slot name → attachment id
pub type AttachmentMap = IndexMap<String, String>;

/// Serialize an attachment map to its stored JSON form
pub fn encode_attachments(attachments: &AttachmentMap) -> Result<String> {
    Ok(serde_json::to_string(attachments)?)
}

/// Parse a stored attachment JSON object
pub fn decode_attachments(json: &str) -> Result<AttachmentMap> {
    Ok(serde_json::from_str(json)?)
}

/// Check that every required pair appears in `actual` with the same value
///
/// An empty requirement never matches, so an override without attachment
/// constraints can't shadow the default icon.
pub fn matches_required(required: &AttachmentMap, actual: &AttachmentMap) -> bool {
    if required.is_empty() || actual.is_empty() {
        return false;
    }
    required
        .iter()
        .all(|(key, value)| actual.get(key).is_some_and(|found| found == value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> AttachmentMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_decode() {
        let original = map(&[("Color", "Red"), ("Horns", "Short")]);
        let json = encode_attachments(&original).unwrap();
        assert_eq!(json, r#"{"Color":"Red","Horns":"Short"}"#);
        assert_eq!(decode_attachments(&json).unwrap(), original);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_attachments("{not json").is_err());
        assert!(decode_attachments("[1,2]").is_err());
    }

    #[test]
    fn test_matches_required_subset() {
        let required = map(&[("Color", "Red")]);
        assert!(matches_required(&required, &map(&[("Color", "Red"), ("Size", "L")])));
        assert!(!matches_required(&required, &map(&[("Color", "Blue")])));
        assert!(!matches_required(&required, &map(&[("Size", "L")])));
    }

    #[test]
    fn test_matches_required_empty_sides() {
        assert!(!matches_required(&AttachmentMap::new(), &map(&[("Color", "Red")])));
        assert!(!matches_required(&map(&[("Color", "Red")]), &AttachmentMap::new()));
    }
}
