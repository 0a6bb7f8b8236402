//! OData Web API store client
//!
//! Talks to a Dynamics-style organization Web API. Collection queries use
//! `$select`/`$filter`, view queries pass FetchXML through the `fetchXml`
//! query parameter, and every request asks for display annotations so
//! formatted values arrive alongside raw ones.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::store::{RemoteStore, StoreError};
use crate::record::RecordBag;

const DEFAULT_API_VERSION: &str = "v9.2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Annotation header; `*` includes the formatted-value annotations the
/// display rule depends on.
const INCLUDE_ANNOTATIONS: &str = "odata.include-annotations=\"*\"";

/// Connection settings for [`WebApiStore`].
#[derive(Debug, Clone)]
pub struct WebApiConfig {
    /// Organization root, e.g. `https://org.example.com`.
    pub base_url: String,
    pub api_version: String,
    /// Bearer token; omitted when the host environment injects auth.
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl WebApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        WebApiConfig {
            base_url: base_url.into(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            access_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// `RemoteStore` over the organization Web API.
pub struct WebApiStore {
    client: reqwest::Client,
    config: WebApiConfig,
}

#[derive(Deserialize)]
struct CollectionResponse {
    value: Vec<RecordBag>,
}

impl WebApiStore {
    pub fn new(config: WebApiConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(WebApiStore { client, config })
    }

    fn api_url(&self, path: &str) -> Result<Url, StoreError> {
        let raw = format!(
            "{}/api/data/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            path
        );
        Url::parse(&raw).map_err(|err| StoreError::Url(err.to_string()))
    }

    fn collection_query_url(
        &self,
        collection: &str,
        filter: &str,
        columns: &[&str],
    ) -> Result<Url, StoreError> {
        let mut url = self.api_url(&entity_set_name(collection))?;
        {
            let mut pairs = url.query_pairs_mut();
            if !columns.is_empty() {
                pairs.append_pair("$select", &columns.join(","));
            }
            if !filter.is_empty() {
                pairs.append_pair("$filter", filter);
            }
        }
        Ok(url)
    }

    fn fetch_query_url(&self, entity: &str, fetch_xml: &str) -> Result<Url, StoreError> {
        let mut url = self.api_url(&entity_set_name(entity))?;
        url.query_pairs_mut().append_pair("fetchXml", fetch_xml);
        Ok(url)
    }

    async fn get_body(&self, url: Url) -> Result<(reqwest::StatusCode, String), StoreError> {
        debug!(%url, "store get");
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .header("Prefer", INCLUDE_ANNOTATIONS);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok((status, body))
    }

    async fn get_rows(&self, url: Url) -> Result<Vec<RecordBag>, StoreError> {
        let (status, body) = self.get_body(url).await?;
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        let parsed: CollectionResponse = serde_json::from_str(&body)?;
        Ok(parsed.value)
    }
}

#[async_trait]
impl RemoteStore for WebApiStore {
    async fn list_collection(
        &self,
        collection: &str,
        filter: &str,
        columns: &[&str],
    ) -> Result<Vec<RecordBag>, StoreError> {
        let url = self.collection_query_url(collection, filter, columns)?;
        self.get_rows(url).await
    }

    async fn query_by_fetch(
        &self,
        entity: &str,
        fetch_xml: &str,
    ) -> Result<Vec<RecordBag>, StoreError> {
        let url = self.fetch_query_url(entity, fetch_xml)?;
        self.get_rows(url).await
    }

    async fn retrieve_by_id(&self, entity: &str, id: &str) -> Result<RecordBag, StoreError> {
        let url = self.api_url(&format!("{}({})", entity_set_name(entity), id))?;
        let (status, body) = self.get_body(url).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                entity: entity.to_owned(),
                id: id.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        let row: RecordBag = serde_json::from_str(&body)?;
        Ok(row)
    }
}

/// Entity-set segment for a logical name, per the platform's plural naming
/// convention (`savedquery` → `savedqueries`, `systemform` → `systemforms`).
fn entity_set_name(logical: &str) -> String {
    if logical.is_empty() {
        return String::new();
    }
    if let Some(stem) = logical.strip_suffix('y') {
        let ends_in_vowel = stem
            .chars()
            .last()
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if !stem.is_empty() && !ends_in_vowel {
            return format!("{stem}ies");
        }
    }
    if logical.ends_with('s')
        || logical.ends_with('x')
        || logical.ends_with('z')
        || logical.ends_with("ch")
        || logical.ends_with("sh")
    {
        return format!("{logical}es");
    }
    format!("{logical}s")
}

/// Pull the platform error message out of a failure body, falling back to a
/// truncated snippet.
fn error_detail(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error")?.get("message")?.as_str())
        .map(str::to_owned)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
