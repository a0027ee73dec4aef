use serde::Serialize;
use sha2::Digest;

use crate::error::{ModelError, Result};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Content id of a serializable value: SHA-256 of its JSON form.
///
/// Parameter maps are ordered (`BTreeMap`), so equal values always produce
/// the same JSON and therefore the same id.
pub fn content_id<T: Serialize>(kind: &'static str, value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value).map_err(|e| ModelError::Serialization {
        kind,
        message: e.to_string(),
    })?;
    Ok(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            sha256_hex(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }
}
