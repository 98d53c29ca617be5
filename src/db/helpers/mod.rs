use anyhow::{Context, Result};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};

/// Decodes a stored JSON value, treating absent or malformed text as "no data".
///
/// Malformed values are logged and otherwise ignored; the next write replaces them.
pub fn decode_optional<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring malformed data stored under '{key}': {err}");
            None
        }
    }
}

pub fn decode_or_default<T: DeserializeOwned + Default>(key: &str, raw: Option<&str>) -> T {
    decode_optional(key, raw).unwrap_or_default()
}

pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("failed to serialize '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_malformed_fall_back_to_default() {
        let absent: Vec<u32> = decode_or_default("k", None);
        assert!(absent.is_empty());

        let garbage: Vec<u32> = decode_or_default("k", Some("{not json"));
        assert!(garbage.is_empty());

        let wrong_shape: Vec<u32> = decode_or_default("k", Some("{\"a\":1}"));
        assert!(wrong_shape.is_empty());
    }

    #[test]
    fn well_formed_value_decodes() {
        let values: Vec<u32> = decode_or_default("k", Some("[3,1,2]"));
        assert_eq!(values, vec![3, 1, 2]);
        assert_eq!(decode_optional::<u32>("k", Some("7")), Some(7));
    }
}
