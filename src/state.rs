//! Persistence of the labels this unit believes it has applied.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::errors::Error;
use crate::labels::LabelSet;
use crate::labels_and_annotations::CURRENT_LABELS_KEY;

pub trait LabelStore {
    /// The applied labels, empty if nothing was stored yet.
    fn load(&self) -> Result<LabelSet, Error>;
    fn save(&mut self, labels: &LabelSet) -> Result<(), Error>;
}

/// A JSON document of named entries on disk.
///
/// Only the `current_labels` entry is owned by this store; other entries are kept
/// as they are.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, document)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl LabelStore for FileStore {
    fn load(&self) -> Result<LabelSet, Error> {
        let document = self.read_document()?;
        match document.get(CURRENT_LABELS_KEY) {
            None | Some(Value::Null) => Ok(LabelSet::new()),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }

    #[instrument(skip(self, labels), fields(path = %self.path.display()))]
    fn save(&mut self, labels: &LabelSet) -> Result<(), Error> {
        let mut document = self.read_document()?;
        document.insert(String::from(CURRENT_LABELS_KEY), serde_json::to_value(labels)?);
        self.write_document(&document)?;
        debug!("stored {} labels", labels.len());
        Ok(())
    }
}

/// Keeps labels in memory and remembers every saved snapshot.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub labels: LabelSet,
    pub history: Vec<LabelSet>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_labels(labels: &[(&str, &str)]) -> Self {
        MemoryStore {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            history: Vec::new(),
        }
    }
}

#[cfg(test)]
impl LabelStore for MemoryStore {
    fn load(&self) -> Result<LabelSet, Error> {
        Ok(self.labels.clone())
    }

    fn save(&mut self, labels: &LabelSet) -> Result<(), Error> {
        self.labels = labels.clone();
        self.history.push(labels.clone());
        Ok(())
    }
}
