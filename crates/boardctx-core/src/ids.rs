//! Identifier hygiene shared by every context source.
//!
//! Values serialized as the text `"undefined"` or `"null"` have leaked
//! into URLs and stored records before. They are treated exactly like a
//! missing value, wherever they come from.

/// Literal strings that are never valid identifiers.
pub const SENTINEL_IDS: [&str; 2] = ["undefined", "null"];

/// Returns `true` when `raw` can be used as an identifier.
pub fn is_well_formed(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && !SENTINEL_IDS.contains(&trimmed)
}

/// Filters a borrowed id, returning an owned copy when it is well formed.
pub fn clean_id(raw: Option<&str>) -> Option<String> {
    raw.filter(|value| is_well_formed(value))
        .map(|value| value.trim().to_string())
}

/// Filters an owned id in place.
pub fn clean_owned(raw: Option<String>) -> Option<String> {
    clean_id(raw.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_absent() {
        assert_eq!(clean_id(Some("undefined")), None);
        assert_eq!(clean_id(Some("null")), None);
        assert_eq!(clean_id(Some("")), None);
        assert_eq!(clean_id(Some("   ")), None);
        assert_eq!(clean_id(None), None);
    }

    #[test]
    fn test_real_ids_pass_through() {
        assert_eq!(clean_id(Some("p1")), Some("p1".to_string()));
        assert_eq!(clean_id(Some(" t2 ")), Some("t2".to_string()));
        // Only the exact sentinel is rejected, not ids containing it.
        assert_eq!(clean_id(Some("nullable")), Some("nullable".to_string()));
    }
}
