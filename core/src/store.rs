//! Document store client.
//!
//! Thin wrapper over an Elasticsearch-compatible `PUT /{index}/_doc/{id}`
//! upsert API. Upserts are keyed by the record's stable id, so replaying the
//! same file leaves the store in the same state.

use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

pub struct StoreClient {
    http: HttpClient,
    base_url: String,
}

impl StoreClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let http = HttpClient::builder().build()?;
        Ok(StoreClient { http, base_url })
    }

    /// Create-or-replace the record under the given id.
    ///
    /// An optional server-side ingest pipeline derives extra fields (e.g.
    /// extracted text) before indexing. Any status other than 200/201 fails
    /// the call.
    pub async fn upsert(
        &self,
        index: &str,
        id: &str,
        pipeline: Option<&str>,
        record: &Value,
    ) -> Result<()> {
        let url = format!("{}{index}/_doc/{}", self.base_url, urlencoding::encode(id));
        let mut request = self.http.put(url).json(record);
        if let Some(pipeline) = pipeline {
            request = request.query(&[("pipeline", pipeline)]);
        }
        let response = request.send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                debug!(id, index, "upserted record");
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Import {
                    id: id.to_string(),
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
