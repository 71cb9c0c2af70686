//! HTTP client for the hosted document platform.
//!
//! Speaks the platform's JSON REST surface:
//!
//! ```text
//! POST   /v1/{collection}                  create, returns {"id": "..."}
//! GET    /v1/{collection}/{id}             fetch one, {"id": .., "fields": {..}}
//! PUT    /v1/{collection}/{id}             create or replace
//! PATCH  /v1/{collection}/{id}             merge fields (404 when missing)
//! DELETE /v1/{collection}/{id}             delete (404 tolerated)
//! GET    /v1/{collection}                  list, {"documents": [..]}
//! GET    /v1/{collection}?field=&contains= array-membership query
//! POST   /v1/{collection}/{id}:increment   {"field": .., "delta": ..}
//! POST   /v1/{collection}/{id}:array-union {"field": .., "value": ..}
//! POST   /v1/{collection}/{id}:array-remove
//! GET    /v1/{collection}:version          {"version": N}
//! GET    /v1/ping                          readiness
//! ```
//!
//! The platform has no push channel, so `watch` is backed by one background
//! task per watched collection that polls the version endpoint and fans the
//! observed version out through a `tokio::sync::watch` channel. Consumers
//! still see push semantics: the channel fires once per observed change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::PlatformConfig;

use super::store::{Document, DocumentStore};
use super::StoreError;

/// Maximum response-body length kept in error values and logs.
const MAX_ERROR_BODY: usize = 500;

/// Client for the hosted document platform.
#[derive(Clone)]
pub struct HttpStore {
    inner: Arc<HttpStoreInner>,
}

struct HttpStoreInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    watchers: Mutex<HashMap<String, CollectionWatcher>>,
}

struct CollectionWatcher {
    tx: watch::Sender<u64>,
    task: JoinHandle<()>,
}

impl Drop for HttpStoreInner {
    fn drop(&mut self) {
        if let Ok(watchers) = self.watchers.lock() {
            for watcher in watchers.values() {
                watcher.task.abort();
            }
        }
    }
}

/// Wire shape of a single document.
#[derive(serde::Deserialize)]
struct WireDocument {
    id: String,
    fields: Value,
}

#[derive(serde::Deserialize)]
struct WireDocumentList {
    documents: Vec<WireDocument>,
}

#[derive(serde::Deserialize)]
struct WireCreated {
    id: String,
}

#[derive(serde::Deserialize)]
struct WireVersion {
    version: u64,
}

impl From<WireDocument> for Document {
    fn from(doc: WireDocument) -> Self {
        Self {
            id: doc.id,
            fields: doc.fields,
        }
    }
}

impl HttpStore {
    /// Create a new platform client.
    #[must_use]
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            inner: Arc::new(HttpStoreInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                api_key: config.api_key.expose_secret().to_owned(),
                poll_interval: config.watch_poll_interval,
                watchers: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{collection}", self.inner.base_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/v1/{collection}/{id}", self.inner.base_url)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("X-Platform-Key", &self.inner.api_key)
    }

    /// Read the response body and surface non-success statuses as errors.
    ///
    /// `tolerated` statuses are returned to the caller instead, so `get`
    /// can map 404 to `None` and `delete` can stay idempotent.
    async fn read_response(
        response: reqwest::Response,
        tolerated: &[StatusCode],
    ) -> Result<(StatusCode, String), StoreError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() || tolerated.contains(&status) {
            return Ok((status, body));
        }

        let truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
        tracing::error!(
            status = %status,
            body = %truncated,
            "document platform returned non-success status"
        );
        Err(StoreError::Status {
            status: status.as_u16(),
            body: truncated,
        })
    }

    /// Run a field operation (`:increment`, `:array-union`, `:array-remove`)
    /// against an existing document.
    async fn field_op(
        &self,
        collection: &str,
        id: &str,
        op: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        let url = format!("{}:{op}", self.document_url(collection, id));
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&body)
            .send()
            .await?;

        let (status, _) = Self::read_response(response, &[StatusCode::NOT_FOUND]).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }

    /// Spawn the poller that feeds a collection's change channel.
    fn spawn_watcher(&self, collection: &str) -> CollectionWatcher {
        let (tx, _rx) = watch::channel(0);
        let poller_tx = tx.clone();
        let client = self.inner.client.clone();
        let api_key = self.inner.api_key.clone();
        let url = format!("{}:version", self.collection_url(collection));
        let interval = self.inner.poll_interval;
        let collection = collection.to_owned();

        let task = tokio::spawn(async move {
            let mut last: Option<u64> = None;
            loop {
                tokio::time::sleep(interval).await;

                let response = client
                    .get(&url)
                    .header("X-Platform-Key", &api_key)
                    .send()
                    .await;
                let version = match response {
                    Ok(response) if response.status().is_success() => {
                        match response.json::<WireVersion>().await {
                            Ok(wire) => wire.version,
                            Err(err) => {
                                tracing::debug!(%collection, error = %err, "version poll parse failed");
                                continue;
                            }
                        }
                    }
                    Ok(response) => {
                        tracing::debug!(
                            %collection,
                            status = %response.status(),
                            "version poll returned non-success status"
                        );
                        continue;
                    }
                    Err(err) => {
                        tracing::debug!(%collection, error = %err, "version poll failed");
                        continue;
                    }
                };

                if last != Some(version) {
                    last = Some(version);
                    poller_tx.send_replace(version);
                }
            }
        });

        CollectionWatcher { tx, task }
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    #[instrument(skip(self, fields))]
    async fn insert(&self, collection: &str, fields: Value) -> Result<String, StoreError> {
        let response = self
            .request(reqwest::Method::POST, &self.collection_url(collection))
            .json(&fields)
            .send()
            .await?;

        let (_, body) = Self::read_response(response, &[]).await?;
        let created: WireCreated = serde_json::from_str(&body)?;
        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.document_url(collection, id))
            .send()
            .await?;

        let (status, body) = Self::read_response(response, &[StatusCode::NOT_FOUND]).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: WireDocument = serde_json::from_str(&body)?;
        Ok(Some(doc.into()))
    }

    #[instrument(skip(self, fields))]
    async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PUT, &self.document_url(collection, id))
            .json(&fields)
            .send()
            .await?;

        Self::read_response(response, &[]).await?;
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PATCH, &self.document_url(collection, id))
            .json(&fields)
            .send()
            .await?;

        let (status, _) = Self::read_response(response, &[StatusCode::NOT_FOUND]).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, &self.document_url(collection, id))
            .send()
            .await?;

        // 404 tolerated: deleting a missing document is a no-op.
        Self::read_response(response, &[StatusCode::NOT_FOUND]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.collection_url(collection))
            .send()
            .await?;

        let (_, body) = Self::read_response(response, &[]).await?;
        let list: WireDocumentList = serde_json::from_str(&body)?;
        Ok(list.documents.into_iter().map(Document::from).collect())
    }

    #[instrument(skip(self))]
    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.collection_url(collection))
            .query(&[("field", field), ("contains", value)])
            .send()
            .await?;

        let (_, body) = Self::read_response(response, &[]).await?;
        let list: WireDocumentList = serde_json::from_str(&body)?;
        Ok(list.documents.into_iter().map(Document::from).collect())
    }

    #[instrument(skip(self))]
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.field_op(collection, id, "increment", json!({"field": field, "delta": delta}))
            .await
    }

    #[instrument(skip(self))]
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.field_op(collection, id, "array-union", json!({"field": field, "value": value}))
            .await
    }

    #[instrument(skip(self))]
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.field_op(collection, id, "array-remove", json!({"field": field, "value": value}))
            .await
    }

    fn watch(&self, collection: &str) -> watch::Receiver<u64> {
        // A poisoned lock means a watcher-spawning panic; there is no
        // recovery that keeps the channel map coherent.
        #[allow(clippy::unwrap_used)]
        let mut watchers = self.inner.watchers.lock().unwrap();
        watchers
            .entry(collection.to_owned())
            .or_insert_with(|| self.spawn_watcher(collection))
            .tx
            .subscribe()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let url = format!("{}/v1/ping", self.inner.base_url);
        let response = self.request(reqwest::Method::GET, &url).send().await?;
        Self::read_response(response, &[]).await?;
        Ok(())
    }
}
