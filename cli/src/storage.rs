/*
    pixel-jumble | Guess the album from your own Spotify listening history.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use jumble_core::TimeRange;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_NAME: &str = "pixel-jumble";
const STORE_NAME: &str = "guessed";
const KEY_PREFIX: &str = "guessed_albums.";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not read or write the guessed-album file: {0}")]
    File(#[from] confy::ConfyError),
    #[error("Could not encode guessed albums: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key-value storage, the terminal stand-in for a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    entries: BTreeMap<String, String>,
}

/// A store persisted with `confy`; every write is flushed to disk immediately.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: StoreFile,
}

impl FileStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file: StoreFile = confy::load_path(&path)?;
        Ok(Self { path, file })
    }

    /// The per-user location, e.g. `~/.config/pixel-jumble/guessed.toml` on Linux.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        Ok(confy::get_configuration_file_path(APP_NAME, Some(STORE_NAME))?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        confy::store_path(&self.path, &self.file)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.file.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.file.entries.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.file.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Album IDs the player already solved or gave up on, one list per game mode.
#[derive(Debug)]
pub struct GuessedAlbums<S> {
    store: S,
}

impl<S: KeyValueStore> GuessedAlbums<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn key(mode: TimeRange) -> String {
        format!("{}{}", KEY_PREFIX, mode)
    }

    pub fn list(&self, mode: TimeRange) -> Vec<String> {
        let key = Self::key(mode);
        match self.store.get(&key) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable entry {}: {}", key, e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    /// Returns `false` when the album was already recorded.
    pub fn add(&mut self, mode: TimeRange, album_id: &str) -> Result<bool, StoreError> {
        let mut ids = self.list(mode);
        if ids.iter().any(|id| id == album_id) {
            return Ok(false);
        }
        ids.push(album_id.to_string());
        self.store.set(&Self::key(mode), serde_json::to_string(&ids)?)?;
        Ok(true)
    }

    pub fn clear(&mut self, mode: TimeRange) -> Result<(), StoreError> {
        self.store.remove(&Self::key(mode))
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
