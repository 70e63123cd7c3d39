//! Cursor storage trait.

use crate::StoreError;

/// Durable named progress markers (`name -> integer`).
///
/// Values are persisted as decimal text. Only the current frontier is kept.
pub trait CursorStore {
    /// Read a cursor. A missing row is [`StoreError::NotFound`].
    fn get_cursor(&self, name: &str) -> Result<u64, StoreError>;

    /// Unconditionally overwrite a cursor (creating it if absent).
    fn put_cursor(&self, name: &str, value: u64) -> Result<(), StoreError>;

    /// Whether a cursor row exists.
    fn has_cursor(&self, name: &str) -> Result<bool, StoreError> {
        match self.get_cursor(name) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Encode a cursor value as stored text.
pub fn encode_cursor(value: u64) -> String {
    value.to_string()
}

/// Decode stored cursor text.
pub fn decode_cursor(name: &str, raw: &[u8]) -> Result<u64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| StoreError::Serialization(format!("cursor '{name}' is not an integer")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stored_text() {
        assert_eq!(decode_cursor("k", b"42").unwrap(), 42);
        assert_eq!(decode_cursor("k", encode_cursor(7).as_bytes()).unwrap(), 7);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_cursor("k", b"seven"),
            Err(StoreError::Serialization(_))
        ));
    }
}
