use std::io;
use std::path::{Path, PathBuf};

use nexus_engine::{AppPaths, Product};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::atomic_io::{read_text_if_exists, remove_if_exists, write_bytes_atomic};
use super::settings::Settings;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// JSON files for the catalog and settings.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    products_file: PathBuf,
    settings_file: PathBuf,
}

impl Store {
    pub(crate) fn new(paths: &AppPaths) -> Self {
        Self {
            products_file: paths.products_file.clone(),
            settings_file: paths.settings_file.clone(),
        }
    }

    /// `Ok(None)` until the catalog has been saved once.
    pub(crate) fn load_products(&self) -> Result<Option<Vec<Product>>, StoreError> {
        load_json(&self.products_file)
    }

    pub(crate) fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        load_json(&self.settings_file)
    }

    pub(crate) fn save_products(&self, products: &[Product]) -> Result<(), StoreError> {
        save_json(&self.products_file, products)
    }

    pub(crate) fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        save_json(&self.settings_file, settings)
    }

    /// Deletes every persisted file. Returns how many existed.
    pub(crate) fn wipe(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for path in [&self.products_file, &self.settings_file] {
            if remove_if_exists(path).map_err(|source| StoreError::Remove {
                path: path.clone(),
                source,
            })? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let Some(raw) = read_text_if_exists(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?
    else {
        return Ok(None);
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map(Some)
        .map_err(|error| {
            let json_path = error.path().to_string();
            StoreError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        })
}

fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_bytes_atomic(path, &bytes).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
