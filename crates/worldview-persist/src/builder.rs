use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::dbs::file::FileThreadStore;
use crate::dbs::memory::MemoryThreadStore;
use crate::error::{PersistError, Result};
use crate::trait_store::ThreadStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Mongodb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory for the file backend
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Database name for the MongoDB backend
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_path() -> PathBuf {
    PathBuf::from("data/threads")
}

fn default_database() -> String {
    "worldview".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
            database: default_database(),
        }
    }
}

pub struct ThreadStoreBuilder {
    config: StoreConfig,
    mongodb_uri: Option<String>,
}

impl ThreadStoreBuilder {
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            mongodb_uri: None,
        }
    }

    pub fn from_config(config: StoreConfig) -> Self {
        Self {
            config,
            mongodb_uri: None,
        }
    }

    pub fn backend(mut self, backend: StoreBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.config.database = db.into();
        self
    }

    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub async fn build(self) -> Result<Arc<dyn ThreadStore>> {
        match self.config.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryThreadStore::new())),
            StoreBackend::File => Ok(Arc::new(FileThreadStore::new(self.config.path))),
            StoreBackend::Mongodb => self.build_mongo().await,
        }
    }

    #[cfg(feature = "mongodb")]
    async fn build_mongo(self) -> Result<Arc<dyn ThreadStore>> {
        let uri = self
            .mongodb_uri
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let store = crate::dbs::mongo::MongoThreadStore::connect(&uri, &self.config.database).await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn build_mongo(self) -> Result<Arc<dyn ThreadStore>> {
        Err(PersistError::Unsupported(
            "mongodb (rebuild with the `mongodb` feature)".to_string(),
        ))
    }
}

/// Open the store described by `config`
pub async fn connect_store(
    config: &StoreConfig,
    mongodb_uri: Option<&str>,
) -> Result<Arc<dyn ThreadStore>> {
    let mut builder = ThreadStoreBuilder::from_config(config.clone());
    if let Some(uri) = mongodb_uri {
        builder = builder.mongodb_uri(uri);
    }
    builder.build().await
}

impl Default for ThreadStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
