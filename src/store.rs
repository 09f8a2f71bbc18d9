//! Process-wide inference registry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::InferenceRecord;

/// Append-only record list plus the id-to-artifact index, shared across
/// concurrent requests behind one lock.
///
/// An index entry only appears once background annotation finishes, so a
/// `get` returning `None` shortly after the boxes were returned is normal.
#[derive(Debug, Default)]
pub struct InferenceStore {
    inner: Mutex<Inner>,
    history_limit: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<InferenceRecord>,
    artifacts: HashMap<String, PathBuf>,
}

impl InferenceStore {
    /// `history_limit` caps the record list; when set, the oldest records
    /// are evicted on append. `None` keeps the full history for the process
    /// lifetime.
    pub fn new(history_limit: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            history_limit,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, record: InferenceRecord) {
        let mut inner = self.lock();
        inner.records.push(record);
        if let Some(limit) = self.history_limit {
            let len = inner.records.len();
            if len > limit {
                inner.records.drain(..len - limit);
            }
        }
    }

    pub fn records(&self) -> Vec<InferenceRecord> {
        self.lock().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<PathBuf> {
        self.lock().artifacts.get(id).cloned()
    }

    pub fn set(&self, id: &str, path: PathBuf) {
        self.lock().artifacts.insert(id.to_string(), path);
    }
}
