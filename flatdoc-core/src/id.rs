//! `_id` generation: a time-ordered unique identifier with its separators
//! stripped, yielding a 32-character hex string. UUID version 7 is
//! time-ordered without embedding a host identifier, unlike the
//! MAC-address-based version 1.

use crate::document::DocumentId;
use uuid::Uuid;

/// Generate a fresh, time-ordered `_id`: a 32-character lowercase hex string.
pub fn generate_id() -> DocumentId {
    DocumentId::new(Uuid::now_v7().simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_is_32_hex_chars() {
        let id = generate_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn successive_ids_are_distinct_and_increasing() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.as_str() < b.as_str());
    }
}
