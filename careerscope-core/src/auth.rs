//! Authentication collaborators
//!
//! An [`AuthProvider`] answers one question: who is signed in? The dashboard
//! treats the time until it answers as its auth-loading phase.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::types::UserIdentity;

/// Source of the current user identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the signed-in user, or `None` when signed out.
    async fn current_user(&self) -> Result<Option<UserIdentity>>;
}

/// Identity fixed at construction time (from config or tests).
pub struct StaticAuth {
    identity: Option<UserIdentity>,
}

impl StaticAuth {
    pub fn new(identity: Option<UserIdentity>) -> Self {
        Self { identity }
    }

    pub fn signed_out() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.identity.clone())
    }
}

/// Resolves the user behind an access token via `GET {url}/auth/v1/user`.
pub struct SupabaseAuth {
    http_client: reqwest::Client,
    user_url: String,
}

#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseAuth {
    pub fn new(
        base_url: &str,
        api_key: &str,
        access_token: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|e| Error::Config(format!("invalid access_token: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            user_url: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        let response = self
            .http_client
            .get(&self.user_url)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::info!(%status, "Access token rejected; treating as signed out");
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Auth(format!("API error ({}): {}", status, error_text)));
        }

        let user: AuthUserResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("failed to parse response: {}", e)))?;

        Ok(Some(UserIdentity {
            id: user.id,
            email: user.email,
        }))
    }
}

/// Pick the auth provider implied by configuration.
///
/// A configured `user.id` wins. Otherwise a PostgREST store with an access
/// token resolves the user remotely. Anything else is signed out.
pub fn from_config(config: &Config) -> Result<Box<dyn AuthProvider>> {
    if let Some(id) = config.user.id.clone().filter(|id| !id.is_empty()) {
        return Ok(Box::new(StaticAuth::new(Some(UserIdentity {
            id,
            email: config.user.email.clone(),
        }))));
    }

    let store = &config.store;
    if store.backend == StoreBackend::Postgrest {
        if let (Some(url), Some(api_key), Some(token)) = (
            store.url.as_deref(),
            store.resolved_api_key(),
            store.resolved_access_token(),
        ) {
            return Ok(Box::new(SupabaseAuth::new(
                url,
                &api_key,
                &token,
                store.timeout_secs,
            )?));
        }
    }

    tracing::warn!("No user configured; dashboard will run signed out");
    Ok(Box::new(StaticAuth::signed_out()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;

    #[tokio::test]
    async fn test_static_user_from_config() {
        let config = Config {
            user: UserConfig {
                id: Some("user-1".to_string()),
                email: Some("ada@example.com".to_string()),
            },
            ..Default::default()
        };
        let auth = from_config(&config).unwrap();
        let user = auth.current_user().await.unwrap().unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_empty_user_id_is_signed_out() {
        let config = Config {
            user: UserConfig {
                id: Some(String::new()),
                email: None,
            },
            store: crate::config::StoreConfig {
                backend: StoreBackend::Sqlite,
                ..Default::default()
            },
            ..Default::default()
        };
        let auth = from_config(&config).unwrap();
        assert!(auth.current_user().await.unwrap().is_none());
    }
}
