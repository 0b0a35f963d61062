//! Manifest loading: category -> names JSON into a flat FIFO work queue.

mod category;

pub use category::Category;

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{PreloadError, PreloadResult};

/// One `(category, name)` pair awaiting fetch.
///
/// The category is kept as the raw manifest key; keys outside [`Category::ALL`] survive loading
/// and are skipped at dispatch time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkItem {
    category: String,
    name: String,
}

impl WorkItem {
    /// Create a work item.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Raw manifest category key.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Resource name (no folder, no extension).
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered queue of work items, drained by destructive pop-front.
#[derive(Clone, Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the front item.
    pub fn pop_front(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    /// Number of items still queued.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate queued items front to back without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }
}

impl FromIterator<WorkItem> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Parsed preload manifest: categories in declaration order, names in list order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, Vec<String>)>,
}

impl Manifest {
    /// Strictly parse a manifest from an already-parsed JSON value.
    ///
    /// The root must be an object whose values are arrays of strings.
    pub fn from_value(value: &serde_json::Value) -> PreloadResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| PreloadError::manifest("manifest root must be a JSON object"))?;

        let mut entries = Vec::with_capacity(obj.len());
        for (key, names) in obj {
            let list = names.as_array().ok_or_else(|| {
                PreloadError::manifest(format!("category '{key}' must map to a list of names"))
            })?;
            let mut out = Vec::with_capacity(list.len());
            for n in list {
                let name = n.as_str().ok_or_else(|| {
                    PreloadError::manifest(format!("category '{key}' contains a non-string name"))
                })?;
                out.push(name.to_string());
            }
            entries.push((key.clone(), out));
        }
        Ok(Self { entries })
    }

    /// Parse a manifest from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PreloadResult<Self> {
        let value: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| PreloadError::serde(format!("parse manifest JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Parse a manifest from a JSON file on disk.
    #[tracing::instrument]
    pub fn from_path(path: &Path) -> PreloadResult<Self> {
        let f = File::open(path).map_err(|e| {
            PreloadError::manifest(format!("open manifest '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Category entries in declaration order.
    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    /// Total number of names across all categories.
    pub fn item_count(&self) -> usize {
        self.entries.iter().map(|(_, names)| names.len()).sum()
    }

    /// Flatten into a work queue: category-then-list order.
    pub fn into_queue(self) -> WorkQueue {
        self.entries
            .into_iter()
            .flat_map(|(category, names)| {
                names
                    .into_iter()
                    .map(move |name| WorkItem::new(category.clone(), name))
            })
            .collect()
    }
}

/// Build the scheduler's queue from a JSON value, degrading to an empty queue when malformed.
pub fn work_queue_from_value(value: &serde_json::Value) -> WorkQueue {
    degrade(Manifest::from_value(value))
}

/// Build the scheduler's queue from a manifest file, degrading to an empty queue when the file
/// is missing or malformed.
pub fn load_work_queue(path: &Path) -> WorkQueue {
    degrade(Manifest::from_path(path))
}

fn degrade(parsed: PreloadResult<Manifest>) -> WorkQueue {
    match parsed {
        Ok(m) => {
            let queue = m.into_queue();
            tracing::debug!(items = queue.len(), "preload queue built");
            queue
        }
        Err(e) => {
            tracing::warn!(error = %e, "manifest unusable, preload queue left empty");
            WorkQueue::new()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/loader.rs"]
mod tests;
