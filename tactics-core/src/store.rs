//! Named layout storage.
//!
//! Provides a thread-safe [`LayoutStore`] keyed by unique layout names. Saving
//! under an existing name replaces that layout. With a data directory, every
//! layout is mirrored to one JSON file and reloaded by [`LayoutStore::open`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::schema::{decode_layout_value, LayoutRecord};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No layout with the given name or id.
    #[error("Layout not found: {0}")]
    NotFound(String),
    /// Another layout already uses the name.
    #[error("Layout name already in use: {0}")]
    Conflict(String),
    /// The name is empty after trimming.
    #[error("Invalid layout name: {0:?}")]
    InvalidName(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Numeric identifier of a stored layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutId(pub u64);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A layout as kept in memory and on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLayout {
    /// Identifier, stable across renames and overwrites.
    pub id: LayoutId,
    /// Unique name.
    pub name: String,
    /// Last write, Unix milliseconds.
    #[serde(default)]
    pub updated_at_ms: u64,
    /// Elements in z-order.
    pub records: Vec<LayoutRecord>,
}

/// One row of [`LayoutStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutSummary {
    /// Identifier.
    pub id: LayoutId,
    /// Unique name.
    pub name: String,
    /// Number of stored elements.
    pub element_count: usize,
    /// Last write, Unix milliseconds.
    pub updated_at_ms: u64,
}

#[derive(Debug, Default)]
struct Layouts {
    by_id: BTreeMap<LayoutId, StoredLayout>,
    next_id: u64,
}

impl Layouts {
    fn id_of(&self, name: &str) -> Option<LayoutId> {
        self.by_id
            .values()
            .find(|layout| layout.name == name)
            .map(|layout| layout.id)
    }

    fn allocate_id(&mut self) -> LayoutId {
        self.next_id += 1;
        LayoutId(self.next_id)
    }
}

/// Thread-safe named layout storage.
///
/// # Example
///
/// ```
/// use tactics_core::store::LayoutStore;
///
/// let store = LayoutStore::new();
/// let id = store.save("4-4-2", &[]).expect("valid name");
/// assert_eq!(store.list()[0].id, id);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutStore {
    layouts: Arc<RwLock<Layouts>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl LayoutStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `data_dir`, loading every layout found there.
    ///
    /// The directory is created if it doesn't exist. Files that cannot be
    /// parsed, or that repeat a name already loaded, are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or read.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&data_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut layouts = Layouts::default();
        for path in paths {
            let layout = match read_layout_file(&path) {
                Ok(layout) => layout,
                Err(e) => {
                    tracing::warn!("Skipping layout file {}: {e}", path.display());
                    continue;
                }
            };
            if layouts.id_of(&layout.name).is_some() || layouts.by_id.contains_key(&layout.id) {
                tracing::warn!(
                    "Skipping layout file {}: duplicate name or id",
                    path.display()
                );
                continue;
            }
            layouts.next_id = layouts.next_id.max(layout.id.0);
            layouts.by_id.insert(layout.id, layout);
        }
        tracing::debug!(
            "Loaded {} layouts from {}",
            layouts.by_id.len(),
            data_dir.display()
        );

        Ok(Self {
            layouts: Arc::new(RwLock::new(layouts)),
            data_dir: Some(data_dir),
        })
    }

    /// The data directory, if the store persists to disk.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Save records under `name`, replacing any layout with that name.
    ///
    /// The name is trimmed. Overwriting keeps the existing id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] if the name is blank.
    pub fn save(&self, name: &str, records: &[LayoutRecord]) -> Result<LayoutId, StoreError> {
        let name = valid_name(name)?;
        let layout = {
            let mut layouts = self
                .layouts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let id = match layouts.id_of(&name) {
                Some(id) => id,
                None => layouts.allocate_id(),
            };
            let layout = StoredLayout {
                id,
                name,
                updated_at_ms: current_timestamp_ms(),
                records: records.to_vec(),
            };
            layouts.by_id.insert(id, layout.clone());
            layout
        };
        tracing::debug!(
            "Saved layout {} ({}) with {} elements",
            layout.id,
            layout.name,
            layout.records.len()
        );
        self.persist(&layout);
        Ok(layout.id)
    }

    /// Records of the layout called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such layout.
    pub fn load(&self, name: &str) -> Result<Vec<LayoutRecord>, StoreError> {
        let name = name.trim();
        let layouts = self.layouts.read().unwrap_or_else(PoisonError::into_inner);
        layouts
            .id_of(name)
            .and_then(|id| layouts.by_id.get(&id))
            .map(|layout| layout.records.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// The layout with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such layout.
    pub fn load_by_id(&self, id: LayoutId) -> Result<StoredLayout, StoreError> {
        let layouts = self.layouts.read().unwrap_or_else(PoisonError::into_inner);
        layouts
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// All layouts, ordered by name.
    #[must_use]
    pub fn list(&self) -> Vec<LayoutSummary> {
        let layouts = self.layouts.read().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<_> = layouts
            .by_id
            .values()
            .map(|layout| LayoutSummary {
                id: layout.id,
                name: layout.name.clone(),
                element_count: layout.records.len(),
                updated_at_ms: layout.updated_at_ms,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Number of stored layouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    /// Whether the store holds no layouts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a layout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such layout.
    pub fn delete(&self, id: LayoutId) -> Result<(), StoreError> {
        let removed = self
            .layouts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tracing::debug!("Deleted layout {id} ({})", removed.name);
        self.delete_file(id);
        Ok(())
    }

    /// Give a layout a new name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for a blank name,
    /// [`StoreError::NotFound`] for an unknown id, or [`StoreError::Conflict`]
    /// if another layout already has the name. Nothing changes on error.
    pub fn rename(&self, id: LayoutId, new_name: &str) -> Result<(), StoreError> {
        let new_name = valid_name(new_name)?;
        let layout = {
            let mut layouts = self
                .layouts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if layouts.id_of(&new_name).is_some_and(|owner| owner != id) {
                return Err(StoreError::Conflict(new_name));
            }
            let layout = layouts
                .by_id
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            layout.name = new_name;
            layout.updated_at_ms = current_timestamp_ms();
            layout.clone()
        };
        tracing::debug!("Renamed layout {id} to {}", layout.name);
        self.persist(&layout);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn layout_path(data_dir: &Path, id: LayoutId) -> PathBuf {
        data_dir.join(format!("layout-{id}.json"))
    }

    /// Write a layout to disk.
    ///
    /// No-op if the store was created without a data directory.
    fn persist(&self, layout: &StoredLayout) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let json = match serde_json::to_string_pretty(layout) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize layout {}: {e}", layout.id);
                return;
            }
        };
        let path = Self::layout_path(data_dir, layout.id);
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!(
                "Failed to persist layout {} to {}: {e}",
                layout.id,
                path.display()
            );
        }
    }

    /// Remove a layout's file from disk, if any.
    fn delete_file(&self, id: LayoutId) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let path = Self::layout_path(data_dir, id);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete layout file {}: {e}", path.display());
            }
        }
    }
}

/// Trim a layout or formation name, rejecting blank ones.
pub(crate) fn valid_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

/// On-disk shape of a layout; records are decoded one by one.
#[derive(Deserialize)]
struct LayoutFile {
    id: LayoutId,
    name: String,
    #[serde(default)]
    updated_at_ms: u64,
    records: serde_json::Value,
}

fn read_layout_file(path: &Path) -> Result<StoredLayout, StoreError> {
    let contents = std::fs::read_to_string(path)?;
    let file: LayoutFile =
        serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let name = valid_name(&file.name)?;
    let decoded = decode_layout_value(file.records);
    if decoded.skipped > 0 {
        tracing::warn!(
            "Skipped {} malformed records in {}",
            decoded.skipped,
            path.display()
        );
    }
    Ok(StoredLayout {
        id: file.id,
        name,
        updated_at_ms: file.updated_at_ms,
        records: decoded.records,
    })
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
