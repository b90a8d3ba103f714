//! Inventory document persistence.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    error::{InventoryError, InventoryResult},
    models::InventoryDocument,
    purchase_log::PurchaseLog,
};

/// How the document returned by [`InventoryStore::load`] came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Parsed from the existing file.
    Loaded,
    /// No file existed; a default document was written.
    Created,
    /// The file could not be parsed and was replaced with a default document.
    Recovered {
        /// Parser message describing the corruption.
        reason: String,
    },
}

/// Document plus the status of the load that produced it.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The freshly loaded document.
    pub document: InventoryDocument,
    /// Whether it was read, created or recovered.
    pub status: LoadStatus,
}

impl LoadOutcome {
    /// Message worth showing to the user, if the load needed attention.
    pub fn warning(&self) -> Option<String> {
        match &self.status {
            LoadStatus::Recovered { reason } => Some(format!(
                "Inventory file is corrupted ({reason}). Created blank inventory."
            )),
            _ => None,
        }
    }
}

/// Reads and writes the inventory document as a single JSON file.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    path: PathBuf,
    default_categories: Vec<String>,
}

impl InventoryStore {
    /// Create a store backed by `path`, seeding new files with `default_categories`.
    pub fn new(path: impl Into<PathBuf>, default_categories: Vec<String>) -> Self {
        Self {
            path: path.into(),
            default_categories,
        }
    }

    /// Location of the inventory file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fresh document with every default category empty.
    pub fn default_document(&self) -> InventoryDocument {
        InventoryDocument::with_categories(self.default_categories.iter().cloned())
    }

    /// Load the document, creating or recovering it when necessary.
    pub fn load(&self) -> InventoryResult<LoadOutcome> {
        if !self.path.exists() {
            let document = self.default_document();
            self.save(&document)?;
            info!(path = %self.path.display(), "Created default inventory");
            return Ok(LoadOutcome {
                document,
                status: LoadStatus::Created,
            });
        }

        let bytes = fs::read(&self.path).map_err(|err| InventoryError::io(&self.path, err))?;
        match serde_json::from_slice::<InventoryDocument>(&bytes) {
            Ok(document) => {
                info!(
                    path = %self.path.display(),
                    categories = document.categories().len(),
                    items = document.item_count(),
                    "Inventory loaded"
                );
                Ok(LoadOutcome {
                    document,
                    status: LoadStatus::Loaded,
                })
            }
            Err(err) => {
                warn!(path = %self.path.display(), "Inventory file is corrupted: {err}");
                let document = self.default_document();
                self.save(&document)?;
                Ok(LoadOutcome {
                    document,
                    status: LoadStatus::Recovered {
                        reason: err.to_string(),
                    },
                })
            }
        }
    }

    /// Overwrite the file with `document`. Readers see either the old or the
    /// new file, never a partial write.
    pub fn save(&self, document: &InventoryDocument) -> InventoryResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|err| InventoryError::io(&parent, err))?;

        let serialised = encode_pretty(document)?;
        let mut temp =
            NamedTempFile::new_in(&parent).map_err(|err| InventoryError::io(&parent, err))?;
        temp.write_all(&serialised)
            .map_err(|err| InventoryError::io(temp.path(), err))?;
        temp.persist(&self.path)
            .map_err(|err| InventoryError::io(&self.path, err.error))?;
        Ok(())
    }
}

fn encode_pretty(document: &InventoryDocument) -> InventoryResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// The inventory store and purchase log used by the domain operations.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Inventory document file.
    pub store: InventoryStore,
    /// Append-only purchase log.
    pub log: PurchaseLog,
}

impl Storage {
    /// Pair an explicit store and log.
    pub fn new(store: InventoryStore, log: PurchaseLog) -> Self {
        Self { store, log }
    }

    /// Build storage from configured paths.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            store: InventoryStore::new(config.inventory_path(), config.default_categories.clone()),
            log: PurchaseLog::new(config.log_path()),
        }
    }
}
