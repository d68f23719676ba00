//! Persistence for settings, personal bests and activity metadata.
//!
//! Everything lives in a flat key-value space of JSON documents. Each key is
//! written as a whole, so replacing the personal-best map is a single atomic
//! put on the backing object store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, local::LocalFileSystem, memory::InMemory, path::Path};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    errors::AppError,
    models::{ActivityMetadata, MetadataMap, PersonalBests},
    settings::Settings,
};

pub const SETTINGS_KEY: &str = "vamSettings";
pub const PERSONAL_BESTS_KEY: &str = "vamPersonalBests";
pub const ACTIVITY_METADATA_KEY: &str = "activityMetadata";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), AppError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// [`KeyValueStore`] over any `object_store` backend, one object per key.
#[derive(Clone, Debug)]
pub struct ObjectStoreKv {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreKv {
    pub fn new_local(base_path: &str) -> Result<Self, AppError> {
        std::fs::create_dir_all(base_path)?;
        let store = Arc::new(LocalFileSystem::new_with_prefix(base_path)?);
        Ok(Self { store })
    }

    pub fn new_in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
        }
    }

    fn path(key: &str) -> Path {
        Path::from(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for ObjectStoreKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let result = match self.store.get(&Self::path(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        let content = Bytes::from(serde_json::to_vec(&value)?);
        self.store.put(&Self::path(key), content.into()).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        match self.store.delete(&Self::path(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Typed access to the documents the tracker keeps.
#[derive(Clone)]
pub struct VamStore {
    kv: Arc<dyn KeyValueStore>,
}

impl VamStore {
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self { kv: Arc::new(kv) }
    }

    pub fn in_memory() -> Self {
        Self::new(ObjectStoreKv::new_in_memory())
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.kv.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        self.kv.set(key, serde_json::to_value(value)?).await
    }

    /// Stored settings, or the built-in defaults when none were saved.
    pub async fn load_settings(&self) -> Result<Settings, AppError> {
        Ok(self.load(SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), AppError> {
        self.save(SETTINGS_KEY, settings).await
    }

    pub async fn reset_settings(&self) -> Result<Settings, AppError> {
        self.kv.remove(SETTINGS_KEY).await?;
        Ok(Settings::default())
    }

    pub async fn load_personal_bests(&self) -> Result<PersonalBests, AppError> {
        Ok(self.load(PERSONAL_BESTS_KEY).await?.unwrap_or_default())
    }

    /// Replaces the whole personal-best map.
    pub async fn save_personal_bests(&self, bests: &PersonalBests) -> Result<(), AppError> {
        self.save(PERSONAL_BESTS_KEY, bests).await
    }

    pub async fn clear_personal_bests(&self) -> Result<(), AppError> {
        self.kv.remove(PERSONAL_BESTS_KEY).await
    }

    pub async fn load_activity_metadata(&self) -> Result<MetadataMap, AppError> {
        Ok(self.load(ACTIVITY_METADATA_KEY).await?.unwrap_or_default())
    }

    pub async fn save_activity_metadata(
        &self,
        activity_id: &str,
        metadata: ActivityMetadata,
    ) -> Result<(), AppError> {
        let mut all = self.load_activity_metadata().await?;
        all.insert(activity_id.to_string(), metadata);
        self.save(ACTIVITY_METADATA_KEY, &all).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use time::macros::datetime;

    use super::*;
    use crate::models::{EffortResult, PersonalBestRecord, TrackingMode};

    fn sample_bests() -> PersonalBests {
        let record = PersonalBestRecord {
            effort: EffortResult {
                vam: 1350,
                elevation_gain: 112,
                duration: 300,
                distance: None,
                start_idx: Some(10),
                end_idx: Some(70),
            },
            activity_id: "1234".into(),
            date: datetime!(2024-06-01 08:30 UTC),
        };
        BTreeMap::from([(
            TrackingMode::Time,
            BTreeMap::from([("5 min".to_string(), record)]),
        )])
    }

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let store = VamStore::in_memory();
        assert_eq!(store.load_settings().await.unwrap(), Settings::default());
        assert!(store.load_personal_bests().await.unwrap().is_empty());
        assert!(store.load_activity_metadata().await.unwrap().is_empty());
        store.clear_personal_bests().await.unwrap();
    }

    #[tokio::test]
    async fn personal_bests_round_trip_and_clear() {
        let store = VamStore::in_memory();
        let bests = sample_bests();

        store.save_personal_bests(&bests).await.unwrap();
        assert_eq!(store.load_personal_bests().await.unwrap(), bests);

        store.clear_personal_bests().await.unwrap();
        assert!(store.load_personal_bests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_is_merged_per_activity() {
        let store = VamStore::in_memory();
        let meta = |name: &str| ActivityMetadata {
            name: name.into(),
            sport_type: "Ride".into(),
            date: datetime!(2024-06-01 08:30 UTC),
        };

        store.save_activity_metadata("1", meta("Col")).await.unwrap();
        store.save_activity_metadata("2", meta("Alpe")).await.unwrap();
        store.save_activity_metadata("1", meta("Col du Galibier")).await.unwrap();

        let all = store.load_activity_metadata().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["1"].name, "Col du Galibier");
        assert_eq!(all["2"].name, "Alpe");
    }

    #[tokio::test]
    async fn settings_reset_restores_defaults() {
        let store = VamStore::in_memory();
        let settings = Settings {
            tracking_modes: vec![TrackingMode::Ascent],
            ..Settings::default()
        };
        store.save_settings(&settings).await.unwrap();
        assert_eq!(store.load_settings().await.unwrap(), settings);

        assert_eq!(store.reset_settings().await.unwrap(), Settings::default());
        assert_eq!(store.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn local_files_survive_reopening() {
        let dir = std::env::temp_dir().join(format!("vam-store-{}", uuid::Uuid::new_v4()));
        let path = dir.to_string_lossy().to_string();

        let store = VamStore::new(ObjectStoreKv::new_local(&path).unwrap());
        store.save_personal_bests(&sample_bests()).await.unwrap();
        drop(store);

        let reopened = VamStore::new(ObjectStoreKv::new_local(&path).unwrap());
        assert_eq!(reopened.load_personal_bests().await.unwrap(), sample_bests());
        reopened.clear_personal_bests().await.unwrap();
        reopened.clear_personal_bests().await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }
}
