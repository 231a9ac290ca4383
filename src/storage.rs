//! Sled-based storage for the user's options.
//!
//! Only one value is kept: the generative-language API key. Nothing from an
//! analysis cycle is ever persisted.

use std::path::Path;
use thiserror::Error;

/// Key under which the API credential is stored
const API_KEY: &str = "geminiApiKey";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("stored value is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Options store backed by sled.
#[derive(Clone)]
pub struct KeyStore {
    db: sled::Db,
}

impl KeyStore {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Read the stored API key, if one was saved
    pub fn api_key(&self) -> Result<Option<String>, StorageError> {
        match self.db.get(API_KEY)? {
            Some(data) => {
                let key = String::from_utf8(data.to_vec())?;
                Ok(Some(key).filter(|k| !k.is_empty()))
            }
            None => Ok(None),
        }
    }

    /// Save the API key. An empty key removes the stored value.
    pub fn set_api_key(&self, key: &str) -> Result<(), StorageError> {
        let key = key.trim();
        if key.is_empty() {
            self.clear()?;
            return Ok(());
        }
        self.db.insert(API_KEY, key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    /// Remove the stored API key. Returns whether a key was present.
    pub fn clear(&self) -> Result<bool, StorageError> {
        let existed = self.db.remove(API_KEY)?.is_some();
        self.db.flush()?;
        Ok(existed)
    }
}

/// Mask a credential for display, keeping only its last four characters
pub fn mask_key(key: &str) -> String {
    let visible: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let hidden = key.chars().count().saturating_sub(4);
    format!("{}{}", "•".repeat(hidden), visible)
}
