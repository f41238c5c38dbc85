use serde_json::Value;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the payload's JCS (RFC 8785) serialization.
pub fn payload_hash(payload: &Value) -> Result<String, serde_json::Error> {
    let canonical = serde_jcs::to_string(payload)?;
    Ok(Sha256::digest(canonical.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}
