// Provider API key settings, persisted alongside the history.

use tracing::{info, warn};

use crate::backend::models::ApiKeys;
use crate::error::DeskError;
use crate::store::KeyValueStore;

pub const API_KEYS_KEY: &str = "settings.api_keys";

/// Saved keys, or defaults when nothing usable is stored.
pub async fn load_api_keys(store: &dyn KeyValueStore) -> ApiKeys {
    let raw = match store.get(API_KEYS_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return ApiKeys::default(),
        Err(e) => {
            warn!(error = %e, "Could not read saved API keys");
            return ApiKeys::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key = API_KEYS_KEY, error = %e, "Ignoring malformed API key settings");
        ApiKeys::default()
    })
}

pub async fn save_api_keys(store: &dyn KeyValueStore, keys: &ApiKeys) -> Result<(), DeskError> {
    let json = serde_json::to_string(keys)
        .map_err(|e| DeskError::Storage(format!("Failed to encode API keys: {e}")))?;
    store.set(API_KEYS_KEY, &json).await?;
    info!(configured = ?keys.configured(), "API keys saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_missing_keys_are_blank() {
        let store = MemoryStore::new();
        assert_eq!(load_api_keys(&store).await, ApiKeys::default());
    }

    #[tokio::test]
    async fn test_malformed_keys_fall_back_to_default() {
        let store = MemoryStore::new().with_value(API_KEYS_KEY, "[1, 2");
        assert_eq!(load_api_keys(&store).await, ApiKeys::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let keys = ApiKeys {
            virustotal: "vt-key".into(),
            ..ApiKeys::default()
        };
        save_api_keys(&store, &keys).await.unwrap();
        let loaded = load_api_keys(&store).await;
        assert_eq!(loaded, keys);
        assert_eq!(loaded.configured(), vec!["virustotal"]);
    }
}
