// MemoryStore: in-process KeyValueStore for tests and `--ephemeral` runs.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::traits::KeyValueStore;

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value before the store is shared.
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values
            .get_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.values.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut values = self.values.lock().await;
        for (key, value) in pairs {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}
