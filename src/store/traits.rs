// KeyValueStore trait: the durable-storage capability.
//
// Implementors: SqliteStore (wraps rusqlite), MemoryStore (tests and
// ephemeral sessions). Keys are fixed strings owned by the callers; values
// are opaque text, in practice JSON.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value (upsert).
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write related values together. The default writes them in order;
    /// backends with transactions should make this atomic.
    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        for (key, value) in pairs {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
