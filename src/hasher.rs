//! Content hashing of entities via their canonical encoding.

use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::error::Error;
use crate::types::ContentHash;

/// Compute the content hash of an entity.
///
/// Normalization: serialize the entity to compact JSON with keys in model
/// order, then SHA-256 hash the bytes. Formatting, comments, quoting style,
/// and the surface format of the source file do not contribute.
///
/// # Errors
///
/// Returns `Error::Encode` if the entity cannot be serialized.
pub fn hash_entity<T: Serialize>(path: &str, entity: &T) -> Result<ContentHash, Error> {
    let canonical = serde_json::to_vec(entity).map_err(|err| {
        return Error::Encode { path: path.to_string(), reason: err.to_string() };
    })?;
    return Ok(hash_bytes(&canonical));
}

/// SHA-256 of raw bytes as a lowercase hex `ContentHash`.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let digest = Sha256::digest(bytes);
    return ContentHash(format!("{digest:x}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codecs, Format};
    use crate::spec::PathItem;

    /// Decode a YAML path item and hash it.
    fn hash_yaml(source: &str) -> ContentHash {
        let item: PathItem = Codecs::default()
            .decode(Format::Yaml, "paths/x.yaml", source.as_bytes())
            .unwrap();
        return hash_entity("paths/x.yaml", &item).unwrap();
    }

    #[test]
    fn hash_is_64_lowercase_hex() {
        let hash = hash_bytes(b"abc");
        assert_eq!(hash.0.len(), 64);
        assert!(hash.0.chars().all(|c| return c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn stable_across_runs() {
        let source = "get:\n  summary: List users\n  responses:\n    '200':\n      description: ok\n";
        assert_eq!(hash_yaml(source), hash_yaml(source));
    }

    #[test]
    fn ignores_comments_and_quoting() {
        let plain = "get:\n  summary: List users\n  responses:\n    '200':\n      description: ok\n";
        let noisy = "# list endpoint\nget:\n  summary: \"List users\"   # trailing\n  responses:\n    200:\n      description: 'ok'\n";
        assert_eq!(hash_yaml(plain), hash_yaml(noisy));
    }

    #[test]
    fn ignores_surface_format() {
        let yaml = hash_yaml("get:\n  summary: List users\n");
        let item: PathItem = Codecs::default()
            .decode(Format::Json, "paths/x.json", br#"{"get": {"summary": "List users"}}"#)
            .unwrap();
        assert_eq!(yaml, hash_entity("paths/x.json", &item).unwrap());
    }

    #[test]
    fn changes_with_any_field_value() {
        let before = hash_yaml("get:\n  summary: List users\n");
        let after = hash_yaml("get:\n  summary: List all users\n");
        assert_ne!(before, after);
    }
}
