//! Settings Cache
//!
//! The settings record is read once at startup and served from memory;
//! every mutation writes through to the store before the cache is
//! updated. The only system-initiated write is the admission
//! controller closing reception, and nothing here ever reopens it.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::{Store, StoreResult};
use shared::models::{Settings, SettingsPatch};

/// Write-through settings cache
pub struct SettingsCache {
    store: Arc<dyn Store>,
    cached: RwLock<Settings>,
}

impl SettingsCache {
    /// Load the settings record and build the cache
    pub async fn load(store: Arc<dyn Store>) -> StoreResult<Self> {
        let settings = store.get_settings().await?;
        Ok(Self {
            store,
            cached: RwLock::new(settings),
        })
    }

    /// Current cached settings
    pub fn get(&self) -> Settings {
        self.cached.read().clone()
    }

    /// Operator save: write through, then refresh the cache
    pub async fn save(&self, patch: SettingsPatch) -> StoreResult<Settings> {
        let updated = self.store.update_settings(patch).await?;
        *self.cached.write() = updated.clone();
        Ok(updated)
    }

    /// Close reception (auto-stop). Idempotent: returns false when
    /// reception was already closed.
    pub async fn close_reception(&self) -> StoreResult<bool> {
        if !self.cached.read().reception_open {
            return Ok(false);
        }
        let patch = SettingsPatch {
            reception_open: Some(false),
            ..Default::default()
        };
        let updated = self.store.update_settings(patch).await?;
        *self.cached.write() = updated;
        Ok(true)
    }

    /// Re-read the settings record, discarding the cache
    pub async fn reload(&self) -> StoreResult<Settings> {
        let settings = self.store.get_settings().await?;
        *self.cached.write() = settings.clone();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_close_reception_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let cache = SettingsCache::load(store.clone()).await.unwrap();

        assert!(cache.get().reception_open);
        assert!(cache.close_reception().await.unwrap());
        assert!(!cache.get().reception_open);

        // Second close is a no-op
        assert!(!cache.close_reception().await.unwrap());
        assert!(!store.get_settings().await.unwrap().reception_open);
    }

    #[tokio::test]
    async fn test_save_writes_through() {
        let store = Arc::new(MemoryStore::new());
        let cache = SettingsCache::load(store.clone()).await.unwrap();

        cache
            .save(SettingsPatch {
                auto_stop_enabled: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!cache.get().auto_stop_enabled);
        assert!(!store.get_settings().await.unwrap().auto_stop_enabled);
    }
}
