//! Persisted local catalog source backed by SQLite.

use async_trait::async_trait;
use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::db::Database;

use super::traits::{CatalogEntity, DataSource};

/// The device-resident catalog store.
///
/// Acts as the read cache in front of the remote catalog. Every mutation
/// re-reads the store and publishes a fresh full-list snapshot to live
/// subscribers; a subscriber that falls behind only ever sees the latest
/// state.
pub struct LocalSource<T: CatalogEntity> {
  db: Arc<Database>,
  snapshots: watch::Sender<Vec<T>>,
}

impl<T: CatalogEntity> LocalSource<T> {
  /// Create a source over the given database, seeding the live snapshot
  /// from the current store contents.
  pub fn new(db: Arc<Database>) -> Result<Self> {
    let initial = db.list::<T>()?;
    let (snapshots, _) = watch::channel(initial);

    Ok(Self { db, snapshots })
  }

  /// Re-read the store and push the result to live subscribers.
  fn publish(&self) -> Result<()> {
    let entries = self.db.list::<T>()?;
    debug!(
      collection = T::collection(),
      entries = entries.len(),
      "publishing snapshot"
    );
    self.snapshots.send_replace(entries);
    Ok(())
  }
}

#[async_trait]
impl<T: CatalogEntity> DataSource<T> for LocalSource<T> {
  fn watch(&self) -> Result<watch::Receiver<Vec<T>>> {
    Ok(self.snapshots.subscribe())
  }

  async fn fetch_all(&self) -> Result<Vec<T>> {
    self.db.list()
  }

  async fn refresh(&self) -> Result<()> {
    // The store itself has nothing to pull from; refreshing re-publishes its
    // current state so subscribers catch writes made through another handle.
    self.publish()
  }

  async fn save(&self, entry: &T) -> Result<()> {
    self.db.upsert(entry)?;
    self.publish()
  }

  async fn delete_all(&self) -> Result<()> {
    self.db.clear(T::collection())?;
    self.publish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Podcast;

  fn source() -> LocalSource<Podcast> {
    let db = Arc::new(Database::open_in_memory().unwrap());
    LocalSource::new(db).unwrap()
  }

  #[tokio::test]
  async fn save_publishes_a_snapshot() {
    let source = source();
    let mut rx = source.watch().unwrap();
    assert!(rx.borrow().is_empty());

    let podcast = Podcast::new(1001, "Title1", "Author1", 0);
    source.save(&podcast).await.unwrap();

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), vec![podcast]);
  }

  #[tokio::test]
  async fn delete_all_publishes_an_empty_snapshot() {
    let source = source();
    source
      .save(&Podcast::new(1001, "Title1", "Author1", 0))
      .await
      .unwrap();

    let mut rx = source.watch().unwrap();
    source.delete_all().await.unwrap();

    rx.changed().await.unwrap();
    assert!(rx.borrow().is_empty());
  }

  #[tokio::test]
  async fn refresh_republishes_writes_from_another_handle() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let writer: LocalSource<Podcast> = LocalSource::new(Arc::clone(&db)).unwrap();
    let reader: LocalSource<Podcast> = LocalSource::new(Arc::clone(&db)).unwrap();

    let mut rx = reader.watch().unwrap();
    writer
      .save(&Podcast::new(1001, "Title1", "Author1", 0))
      .await
      .unwrap();

    // The reader's channel has not seen the write yet.
    assert!(rx.borrow().is_empty());

    reader.refresh().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().len(), 1);
  }

  #[tokio::test]
  async fn fetch_all_reads_the_store() {
    let source = source();
    let podcast = Podcast::new(1001, "Title1", "Author1", 0);
    source.save(&podcast).await.unwrap();

    assert_eq!(source.fetch_all().await.unwrap(), vec![podcast]);
  }
}
