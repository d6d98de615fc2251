//! Storage helpers over a [`KeyValueStore`]
//!
//! Values are stored JSON-encoded, so a token `abc` lives in the store as
//! `"abc"`. Every helper validates its input before touching the store.

use crate::ports::KeyValueStore;
use crate::{Error, Result};

/// Store `value` under `key` as a JSON-encoded string
pub fn set_storage_item(store: &dyn KeyValueStore, key: &str, value: &str) -> Result<()> {
    if key.is_empty() || value.is_empty() {
        return Err(Error::validation("Key and value are required"));
    }

    let encoded = serde_json::to_string(value)?;
    store.set_item(key, &encoded)
}

/// Read the string stored under `key`
///
/// Returns `None` when nothing (or an empty raw value) is stored. A raw value
/// that is not a JSON-encoded string is a validation error.
pub fn get_storage_item(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>> {
    let raw = match store.get_item(key)? {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };

    serde_json::from_str::<String>(&raw)
        .map(Some)
        .map_err(|_| Error::validation("Value must be a string."))
}

/// Remove the value stored under `key`
pub fn remove_storage_item(store: &dyn KeyValueStore, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::validation("Key is required"));
    }

    store.remove_item(key)
}

/// Remove every key in `keys`
pub fn remove_storage_items<S: AsRef<str>>(store: &dyn KeyValueStore, keys: &[S]) -> Result<()> {
    if keys.is_empty() {
        return Err(Error::validation("Key is required"));
    }

    for key in keys {
        remove_storage_item(store, key.as_ref())?;
    }
    Ok(())
}
