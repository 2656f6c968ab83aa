//! Database: a directory of log collections.
//!
//! Each collection lives in its own sub-directory named after the collection.
//! Handles are cached and shared, so asking for the same collection twice
//! returns the same [`LogCollection`].

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::{DocumentStore, LogCollection, LOG_FILE};

/// Database instance managing collections stored under one directory.
pub struct Database {
    /// Path to the data directory
    data_dir: PathBuf,
    /// Open collections by name
    collections: RwLock<HashMap<String, Arc<LogCollection>>>,
}

impl Database {
    /// Opens or creates a database at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Connection` if the directory cannot be created or accessed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| Error::Connection {
            path: data_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::read_dir(&data_dir).map_err(|e| Error::Connection {
            path: data_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(data_dir = %data_dir.display(), "database opened");

        Ok(Self {
            data_dir,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Data directory of this database.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the named collection, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid directory name or the
    /// collection cannot be opened.
    pub fn collection(&self, name: &str) -> Result<Arc<LogCollection>> {
        if let Some(existing) = self.collections.read().get(name) {
            return Ok(Arc::clone(existing));
        }

        validate_name(name)?;
        let mut collections = self.collections.write();
        // Another caller may have opened it between the two locks
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }
        let collection = Arc::new(LogCollection::open(name, self.data_dir.join(name))?);
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }

    /// Returns an existing collection.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if no collection with that name exists.
    pub fn existing_collection(&self, name: &str) -> Result<Arc<LogCollection>> {
        if self.has_collection(name) {
            self.collection(name)
        } else {
            Err(Error::CollectionNotFound(name.to_string()))
        }
    }

    /// Returns true if the collection exists, open or on disk.
    #[must_use]
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
            || (validate_name(name).is_ok() && self.data_dir.join(name).join(LOG_FILE).exists())
    }

    /// Lists all collection names in the database, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be read.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.path().join(LOG_FILE).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes a collection and its files.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection does not exist.
    pub fn drop_collection(&self, name: &str) -> Result<()> {
        if !self.has_collection(name) {
            return Err(Error::CollectionNotFound(name.to_string()));
        }

        let mut collections = self.collections.write();
        collections.remove(name);
        let collection_path = self.data_dir.join(name);
        if collection_path.exists() {
            fs::remove_dir_all(collection_path)?;
        }

        tracing::info!(collection = %name, "collection dropped");
        Ok(())
    }

    /// Deletes every collection. Returns the dropped names.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection directory cannot be removed.
    pub fn drop_all(&self) -> Result<Vec<String>> {
        let names = self.list_collections()?;
        for name in &names {
            self.drop_collection(name)?;
        }
        Ok(names)
    }

    /// Writes every collection to `<dir>/<name>.json` as a pretty-printed
    /// array of documents, each carrying its id under `_id`.
    ///
    /// Returns the written file paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be read or a file written.
    pub fn export<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for name in self.list_collections()? {
            let collection = self.collection(&name)?;
            let documents: Vec<Value> = collection
                .scan()?
                .into_iter()
                .map(|doc| {
                    let mut body = Map::with_capacity(doc.body.len() + 1);
                    body.insert("_id".to_string(), Value::from(doc.id.0));
                    body.extend(doc.body);
                    Value::Object(body)
                })
                .collect();

            let path = dir.join(format!("{name}.json"));
            let file = fs::File::create(&path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &documents)?;
            tracing::info!(
                collection = %name,
                documents = documents.len(),
                file = %path.display(),
                "collection exported"
            );
            written.push(path);
        }
        Ok(written)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        for collection in self.collections.read().values() {
            if let Err(e) = collection.flush() {
                tracing::warn!(collection = %collection.name(), error = %e, "flush on close failed");
            }
        }
        tracing::debug!(data_dir = %self.data_dir.display(), "database closed");
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("open_collections", &self.collections.read().len())
            .finish()
    }
}

/// Collection names become directory names.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("invalid collection name '{name}'")))
    }
}
