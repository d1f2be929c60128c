//! HTTP document store client.
//!
//! Speaks a plain JSON REST shape against the hosted document database:
//! `POST {base}/{collection}` to insert, `GET {base}/{collection}?ownerId=`
//! to query, `DELETE {base}/{collection}/{id}` to delete. Each operation is
//! a single request with no retry; failures carry the service's
//! `error.message` when one is present.

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::entry::JournalEntry;
use crate::error::{Error, Result};
use crate::session::service_error_message;
use crate::store::DocumentStore;

/// Response body of an insert call.
#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

/// JSON-over-HTTP [`DocumentStore`] client.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentStore {
    /// Create a client for the given store base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store endpoint is not configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_store()?;
        Ok(Self::new(&config.store.base_url))
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.base_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.base_url)
    }

    /// Read a response, mapping failures with `fail`.
    async fn read_body(
        response: reqwest::Response,
        fail: fn(String) -> Error,
    ) -> Result<(reqwest::StatusCode, String)> {
        let status = response.status();
        let body = response.text().await.map_err(|err| fail(err.to_string()))?;
        if status.is_success() {
            Ok((status, body))
        } else {
            let message =
                service_error_message(&body).unwrap_or_else(|| format!("store returned {status}"));
            Err(fail(message))
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn insert(&self, collection: &str, entry: &JournalEntry) -> Result<String> {
        let url = self.collection_url(collection);
        debug!("inserting entry into {url}");

        let response = self
            .client
            .post(&url)
            .json(entry)
            .send()
            .await
            .map_err(|err| Error::write_failed(err.to_string()))?;

        let (_, body) = Self::read_body(response, Error::write_failed).await?;
        let parsed: InsertResponse = serde_json::from_str(&body)
            .map_err(|err| Error::write_failed(format!("malformed response: {err}")))?;
        Ok(parsed.id)
    }

    async fn query_by_owner(&self, collection: &str, owner: &str) -> Result<Vec<JournalEntry>> {
        let url = self.collection_url(collection);
        debug!("querying {url} for owner {owner}");

        let response = self
            .client
            .get(&url)
            .query(&[("ownerId", owner)])
            .send()
            .await
            .map_err(|err| Error::query_failed(err.to_string()))?;

        let (_, body) = Self::read_body(response, Error::query_failed).await?;
        serde_json::from_str(&body)
            .map_err(|err| Error::query_failed(format!("malformed response: {err}")))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.document_url(collection, id);
        debug!("deleting {url}");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|err| Error::delete_failed(err.to_string()))?;

        Self::read_body(response, Error::delete_failed).await?;
        Ok(())
    }
}
