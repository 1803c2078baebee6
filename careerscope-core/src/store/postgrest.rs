//! HTTP client for PostgREST-compatible row stores
//!
//! Queries become `GET {url}/rest/v1/{table}?select=...&column=op.value`.
//! Exact counts are requested with `Prefer: count=exact` and read back from
//! the `Content-Range` header; head-only queries use `HEAD`. Row queries with
//! a count are paged with `offset=` until every counted row has arrived.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE};

use super::query::{Query, QueryResult};
use super::RowStore;
use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Row store backed by a PostgREST API
pub struct PostgrestStore {
    http_client: reqwest::Client,
    base_url: String,
}

impl PostgrestStore {
    /// Create a client from configuration
    ///
    /// Returns an error if the URL or API key is missing.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let base_url = config
            .url
            .clone()
            .ok_or_else(|| Error::Config("store.url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| Error::Config("store.api_key is required".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(&api_key)
                .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
        );

        // Row-level security keys off the user's token; the anon key is the fallback
        let bearer = config.resolved_access_token().unwrap_or(api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|e| Error::Config(format!("invalid access_token: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Base project URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for a query
    pub fn query_url(&self, query: &Query) -> String {
        let mut url = format!(
            "{}/rest/v1/{}?select={}",
            self.base_url,
            query.table.as_str(),
            urlencoding::encode(&query.projection())
        );
        for filter in &query.filters {
            url.push('&');
            url.push_str(&filter.column);
            url.push('=');
            url.push_str(filter.op.postgrest());
            url.push('.');
            url.push_str(&urlencoding::encode(&filter.value.to_text()));
        }
        url
    }

    fn page_url(&self, query: &Query, offset: usize) -> String {
        let url = self.query_url(query);
        if offset == 0 {
            url
        } else {
            format!("{}&offset={}", url, offset)
        }
    }

    /// One request: the parsed count, if requested, and the returned rows.
    async fn send(
        &self,
        query: &Query,
        offset: usize,
    ) -> Result<(Option<u64>, Vec<serde_json::Value>)> {
        let url = self.page_url(query, offset);

        let mut request = if query.head {
            self.http_client.head(&url)
        } else {
            self.http_client.get(&url)
        };
        if query.count {
            request = request.header("Prefer", "count=exact");
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Store(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Store(format!(
                "API error ({}) on {}: {}",
                status,
                query.table.as_str(),
                error_text
            )));
        }

        let count = if query.count {
            let header = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range);
            if header.is_none() {
                tracing::warn!(
                    table = query.table.as_str(),
                    "count requested but no Content-Range returned"
                );
            }
            header
        } else {
            None
        };

        let rows = if query.head {
            Vec::new()
        } else {
            response
                .json::<Vec<serde_json::Value>>()
                .await
                .map_err(|e| Error::Store(format!("failed to parse response: {}", e)))?
        };

        Ok((count, rows))
    }
}

#[async_trait]
impl RowStore for PostgrestStore {
    async fn fetch(&self, query: &Query) -> Result<QueryResult> {
        query.validate()?;
        let (count, mut rows) = self.send(query, 0).await?;

        // The server's max-rows setting caps each response
        if let (false, Some(total)) = (query.head, count) {
            while (rows.len() as u64) < total {
                let (_, page) = self.send(query, rows.len()).await?;
                if page.is_empty() {
                    tracing::warn!(
                        table = query.table.as_str(),
                        fetched = rows.len(),
                        total,
                        "PostgREST returned fewer rows than it counted"
                    );
                    break;
                }
                rows.extend(page);
            }
        }

        tracing::debug!(
            table = query.table.as_str(),
            rows = rows.len(),
            count = ?count,
            "PostgREST query complete"
        );

        Ok(QueryResult { rows, count })
    }
}

/// Parse the total from `Content-Range: 0-24/573` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}
