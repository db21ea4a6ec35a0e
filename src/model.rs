//! Catalog entity types shared by every data source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::CatalogEntity;

/// A followed podcast.
///
/// Identity is assigned by the caller and must be unique within the catalog;
/// saving a podcast with an existing id replaces the prior record in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
  pub id: i64,
  pub title: String,
  pub author: String,
  /// Reference to a cached artwork asset
  pub image_cache_id: i64,
  pub followed_date: DateTime<Utc>,
}

impl Podcast {
  /// Create a podcast followed right now.
  pub fn new(
    id: i64,
    title: impl Into<String>,
    author: impl Into<String>,
    image_cache_id: i64,
  ) -> Self {
    Self {
      id,
      title: title.into(),
      author: author.into(),
      image_cache_id,
      followed_date: Utc::now(),
    }
  }
}

/// A single episode of a podcast.
///
/// `podcast_id` is a logical reference to [`Podcast::id`]; the catalog does
/// not enforce it. `duration` carries whatever unit the caller uses
/// (milliseconds or seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
  pub id: i64,
  pub code: String,
  pub podcast_id: i64,
  pub title: String,
  pub description: String,
  pub duration: i64,
  /// Reference to a cached audio asset
  pub audio_cache_id: i64,
  pub release_date: DateTime<Utc>,
  pub is_completed: bool,
  pub download_status: DownloadStatus,
  /// Percent, 0-100
  pub download_progress: u8,
  pub playback_position: i64,
  pub is_prohibited: bool,
}

impl Episode {
  /// Create an episode with the remaining fields at their defaults.
  pub fn new(
    id: i64,
    podcast_id: i64,
    code: impl Into<String>,
    title: impl Into<String>,
    release_date: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      code: code.into(),
      podcast_id,
      title: title.into(),
      description: String::new(),
      duration: 0,
      audio_cache_id: 0,
      release_date,
      is_completed: false,
      download_status: DownloadStatus::default(),
      download_progress: 0,
      playback_position: 0,
      is_prohibited: false,
    }
  }
}

/// Download state of an episode's audio asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
  #[default]
  Requested,
  InProgress,
  Downloaded,
}

impl CatalogEntity for Podcast {
  fn entity_id(&self) -> i64 {
    self.id
  }

  fn collection() -> &'static str {
    "podcasts"
  }
}

impl CatalogEntity for Episode {
  fn entity_id(&self) -> i64 {
    self.id
  }

  fn collection() -> &'static str {
    "episodes"
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_podcast_is_followed_now() {
    let before = Utc::now();
    let podcast = Podcast::new(1001, "Title1", "Author1", 0);
    let after = Utc::now();

    assert!(podcast.followed_date >= before);
    assert!(podcast.followed_date <= after);
  }

  #[test]
  fn episode_wire_names_are_camel_case() {
    let episode = Episode::new(7, 1001, "S01E07", "Seventh", Utc::now());
    let value = serde_json::to_value(&episode).unwrap();

    // The remote API and the blob store share these field names.
    assert!(value.get("podcastId").is_some());
    assert!(value.get("downloadStatus").is_some());
    assert!(value.get("releaseDate").is_some());
    assert_eq!(value["downloadStatus"], "Requested");
  }
}
