//! Network-backed catalog source over the catalog service's REST API.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::Method;
use std::marker::PhantomData;
use tokio::sync::watch;
use url::Url;

use crate::config::Config;

use super::traits::{CatalogEntity, DataSource};

/// HTTP client for the remote catalog service.
///
/// The service is the source of truth on forced refresh. It exposes one
/// collection per entity type: `GET {base}/{collection}` returns the full
/// list, `PUT {base}/{collection}/{id}` upserts one record, and
/// `DELETE {base}/{collection}` clears the collection.
#[derive(Clone)]
pub struct RemoteSource<T: CatalogEntity> {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
  _entity: PhantomData<T>,
}

impl<T: CatalogEntity> RemoteSource<T> {
  pub fn new(config: &Config) -> Result<Self> {
    Self::from_url(&config.catalog.url, Config::api_token())
  }

  /// Create a client against the given base URL.
  pub fn from_url(url: &str, token: Option<String>) -> Result<Self> {
    let base = normalize_base(url)?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("podsync/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token,
      _entity: PhantomData,
    })
  }

  fn collection_url(&self) -> Result<Url> {
    self
      .base
      .join(T::collection())
      .map_err(|e| eyre!("Invalid collection URL: {}", e))
  }

  fn entry_url(&self, id: i64) -> Result<Url> {
    self
      .base
      .join(&format!("{}/{}", T::collection(), id))
      .map_err(|e| eyre!("Invalid entry URL: {}", e))
  }

  fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
    let request = self.http.request(method, url);
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

#[async_trait]
impl<T: CatalogEntity> DataSource<T> for RemoteSource<T> {
  fn watch(&self) -> Result<watch::Receiver<Vec<T>>> {
    // The catalog service has no push channel; callers poll via refresh.
    Err(eyre!(
      "Live updates are not supported by the remote catalog"
    ))
  }

  async fn fetch_all(&self) -> Result<Vec<T>> {
    let response = self
      .request(Method::GET, self.collection_url()?)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach remote catalog: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Failed to fetch {}: {}", T::collection(), e))?;

    let entries: Vec<T> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse {}: {}", T::collection(), e))?;

    Ok(entries)
  }

  async fn refresh(&self) -> Result<()> {
    // The service is authoritative; there is nothing upstream to pull from.
    Ok(())
  }

  async fn save(&self, entry: &T) -> Result<()> {
    self
      .request(Method::PUT, self.entry_url(entry.entity_id())?)
      .json(entry)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach remote catalog: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Failed to save {} entry: {}", T::collection(), e))?;

    Ok(())
  }

  async fn delete_all(&self) -> Result<()> {
    self
      .request(Method::DELETE, self.collection_url()?)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach remote catalog: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Failed to clear {}: {}", T::collection(), e))?;

    Ok(())
  }
}

/// Ensure the base path ends with a slash so `Url::join` appends collection
/// segments instead of replacing the last one.
fn normalize_base(url: &str) -> Result<Url> {
  let mut base = Url::parse(url).map_err(|e| eyre!("Invalid catalog URL {}: {}", url, e))?;

  if !base.path().ends_with('/') {
    base.set_path(&format!("{}/", base.path()));
  }

  Ok(base)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Podcast;

  #[test]
  fn urls_keep_the_base_path() {
    let source: RemoteSource<Podcast> =
      RemoteSource::from_url("https://api.example.com/v1", None).unwrap();

    assert_eq!(
      source.collection_url().unwrap().as_str(),
      "https://api.example.com/v1/podcasts"
    );
    assert_eq!(
      source.entry_url(1001).unwrap().as_str(),
      "https://api.example.com/v1/podcasts/1001"
    );
  }

  #[test]
  fn trailing_slash_base_is_equivalent() {
    let source: RemoteSource<Podcast> =
      RemoteSource::from_url("https://api.example.com/v1/", None).unwrap();

    assert_eq!(
      source.collection_url().unwrap().as_str(),
      "https://api.example.com/v1/podcasts"
    );
  }

  #[test]
  fn watch_is_unsupported() {
    let source: RemoteSource<Podcast> =
      RemoteSource::from_url("https://api.example.com/v1", None).unwrap();

    assert!(source.watch().is_err());
  }
}
