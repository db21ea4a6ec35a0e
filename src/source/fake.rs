//! In-memory data source used by repository tests.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::traits::{CatalogEntity, DataSource};

/// Test double for either side of the repository.
///
/// `None` models a backend that cannot produce a list at all. Cloning shares
/// the underlying state, so tests can keep a handle to inspect a source
/// after handing it to a repository.
#[derive(Clone)]
pub(crate) struct FakeSource<T: CatalogEntity> {
  entries: Arc<Mutex<Option<Vec<T>>>>,
  fetches: Arc<AtomicUsize>,
}

impl<T: CatalogEntity> FakeSource<T> {
  pub fn new(entries: Vec<T>) -> Self {
    Self {
      entries: Arc::new(Mutex::new(Some(entries))),
      fetches: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn unavailable() -> Self {
    Self {
      entries: Arc::new(Mutex::new(None)),
      fetches: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn set_entries(&self, entries: Vec<T>) {
    *self.entries.lock().unwrap() = Some(entries);
  }

  pub fn make_unavailable(&self) {
    *self.entries.lock().unwrap() = None;
  }

  /// Current contents, or `None` when unavailable.
  pub fn entries(&self) -> Option<Vec<T>> {
    self.entries.lock().unwrap().clone()
  }

  /// Number of `fetch_all` calls this source has seen.
  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl<T: CatalogEntity> DataSource<T> for FakeSource<T> {
  fn watch(&self) -> Result<watch::Receiver<Vec<T>>> {
    Err(eyre!("fake source has no live sequence"))
  }

  async fn fetch_all(&self) -> Result<Vec<T>> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    match &*self.entries.lock().unwrap() {
      Some(entries) => Ok(entries.clone()),
      None => Err(eyre!("{} not found", T::collection())),
    }
  }

  async fn refresh(&self) -> Result<()> {
    Ok(())
  }

  async fn save(&self, entry: &T) -> Result<()> {
    if let Some(entries) = self.entries.lock().unwrap().as_mut() {
      match entries.iter_mut().find(|e| e.entity_id() == entry.entity_id()) {
        Some(existing) => *existing = entry.clone(),
        None => entries.push(entry.clone()),
      }
    }
    Ok(())
  }

  async fn delete_all(&self) -> Result<()> {
    if let Some(entries) = self.entries.lock().unwrap().as_mut() {
      entries.clear();
    }
    Ok(())
  }
}
