//! Core traits for catalog data sources.

use async_trait::async_trait;
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;

/// Trait for entities a catalog source can hold.
///
/// Implementors carry a caller-assigned integer identity, unique within
/// their collection, and name the collection they belong to.
pub trait CatalogEntity:
  Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
  /// Stable identity within the collection (e.g. podcast id)
  fn entity_id(&self) -> i64;

  /// Collection name used for storage and remote routing (e.g. "podcasts")
  fn collection() -> &'static str;
}

/// Uniform contract over podcast catalog backends.
///
/// Implemented by the persisted local store, the network-backed remote
/// client, and in-memory fakes in tests.
#[async_trait]
pub trait DataSource<T: CatalogEntity>: Send + Sync {
  /// Subscribe to live full-list snapshots.
  ///
  /// The receiver holds the latest snapshot and is updated whenever the
  /// backing store changes, with at-least-the-latest-state delivery;
  /// intermediate states may be skipped. Dropping the receiver tears the
  /// subscription down. Sources without live-push capability (the remote
  /// client) return an error here.
  fn watch(&self) -> Result<watch::Receiver<Vec<T>>>;

  /// One-shot fetch of the current full list.
  ///
  /// `Ok` with the list (possibly empty), or `Err` when the backend cannot
  /// produce a list at all.
  async fn fetch_all(&self) -> Result<Vec<T>>;

  /// Ask the source to update itself. Side-effecting only.
  async fn refresh(&self) -> Result<()>;

  /// Upsert by id: replace the record with `entry`'s id in full, or append.
  async fn save(&self, entry: &T) -> Result<()>;

  /// Clear the source's entire collection for this entity type.
  async fn delete_all(&self) -> Result<()>;
}
