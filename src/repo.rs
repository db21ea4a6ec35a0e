//! The catalog repository: one local source, one remote source, and the
//! policy that coordinates them.
//!
//! Reads trust the local store unconditionally unless the caller forces an
//! update; a forced update replaces the local contents with the remote's
//! current list before answering. There is no staleness tracking: every
//! forced call re-syncs from scratch, and every unforced call serves the
//! cache regardless of age.

use color_eyre::Result;
use std::marker::PhantomData;
use tokio::sync::watch;
use tracing::debug;

use crate::model::{Episode, Podcast};
use crate::source::{CatalogEntity, DataSource, LocalSource, RemoteSource};

/// Repository over podcasts in the default source configuration.
pub type PodcastRepository =
  CatalogRepository<Podcast, LocalSource<Podcast>, RemoteSource<Podcast>>;

/// Repository over episodes in the default source configuration.
pub type EpisodeRepository =
  CatalogRepository<Episode, LocalSource<Episode>, RemoteSource<Episode>>;

/// Coordinates a local and a remote [`DataSource`] over one entity type.
pub struct CatalogRepository<T, L, R>
where
  T: CatalogEntity,
  L: DataSource<T>,
  R: DataSource<T>,
{
  local: L,
  remote: R,
  _entity: PhantomData<T>,
}

impl<T, L, R> CatalogRepository<T, L, R>
where
  T: CatalogEntity,
  L: DataSource<T>,
  R: DataSource<T>,
{
  pub fn new(local: L, remote: R) -> Self {
    Self {
      local,
      remote,
      _entity: PhantomData,
    }
  }

  /// Subscribe to live full-list snapshots from the local store.
  ///
  /// Delegates directly to the local source; the remote is never consulted
  /// here.
  pub fn watch(&self) -> Result<watch::Receiver<Vec<T>>> {
    self.local.watch()
  }

  /// Get the current full list.
  ///
  /// With `force_update` false, this returns the local source's one-shot
  /// result verbatim without touching the remote. With `force_update` true,
  /// the local store is first replaced from the remote; if that sync fails,
  /// the failure becomes this call's error and the stale cache is not served
  /// as a fallback.
  pub async fn fetch_all(&self, force_update: bool) -> Result<Vec<T>> {
    if force_update {
      self.sync_from_remote().await?;
    }
    self.local.fetch_all().await
  }

  /// Replace the local store from the remote, discarding the fetched list.
  pub async fn refresh(&self) -> Result<()> {
    self.sync_from_remote().await
  }

  /// Save to the local store, then to the remote, in that order.
  ///
  /// The first failure propagates; the other side is not rolled back.
  pub async fn save(&self, entry: &T) -> Result<()> {
    self.local.save(entry).await?;
    self.remote.save(entry).await
  }

  /// Clear the local store, then the remote, in that order.
  ///
  /// Same ordering and failure policy as [`save`](Self::save).
  pub async fn delete_all(&self) -> Result<()> {
    self.local.delete_all().await?;
    self.remote.delete_all().await
  }

  /// Replace the local contents with the remote's current list.
  ///
  /// No diffing: the local collection is cleared and every remote entry is
  /// saved in list order. A remote failure leaves the local store untouched.
  async fn sync_from_remote(&self) -> Result<()> {
    let entries = self.remote.fetch_all().await?;

    self.local.delete_all().await?;
    for entry in &entries {
      self.local.save(entry).await?;
    }

    debug!(
      collection = T::collection(),
      entries = entries.len(),
      "replaced local store from remote"
    );
    Ok(())
  }
}
