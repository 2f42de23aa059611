//! Config fingerprinting
//!
//! A report carries the SHA-256 of the configuration that produced it, so two
//! reports can be compared knowing whether they came from the same inputs.

use crate::orchestrator::PipelineError;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

fn serialization_error(e: serde_json::Error) -> PipelineError {
    PipelineError::Serialization(format!("Config serialization failed: {}", e))
}

/// Rebuild every object with its keys in sorted order
fn sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, sorted_keys(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_keys).collect()),
        scalar => scalar,
    }
}

/// Hex SHA-256 of `config` serialized as JSON with sorted keys
///
/// Equal configs hash equal whatever order their maps were built in.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, PipelineError> {
    let canonical = sorted_keys(serde_json::to_value(config).map_err(serialization_error)?);
    let json = serde_json::to_vec(&canonical).map_err(serialization_error)?;
    Ok(format!("{:x}", Sha256::digest(&json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PipelineConfig;

    #[test]
    fn test_compute_config_hash_deterministic() {
        let hash1 = compute_config_hash(&PipelineConfig::default()).unwrap();
        let hash2 = compute_config_hash(&PipelineConfig::default()).unwrap();

        assert_eq!(hash1, hash2, "Same config should produce same hash");
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_compute_config_hash_different_for_different_configs() {
        let mut other = PipelineConfig::default();
        other.retention_factor = 5;

        let hash1 = compute_config_hash(&PipelineConfig::default()).unwrap();
        let hash2 = compute_config_hash(&other).unwrap();

        assert_ne!(
            hash1, hash2,
            "Different configs should produce different hashes"
        );
    }

    #[test]
    fn test_sorted_keys_nested() {
        let value = serde_json::json!({ "b": [{ "z": 1, "a": 2 }], "a": { "d": 0, "c": 1 } });
        let text = serde_json::to_string(&sorted_keys(value)).unwrap();
        assert_eq!(text, r#"{"a":{"c":1,"d":0},"b":[{"a":2,"z":1}]}"#);
    }
}
