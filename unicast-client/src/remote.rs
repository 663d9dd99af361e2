//! HTTP transport to the remote alert service
//!
//! Endpoints:
//! - `POST /register/` registration and language/location updates
//! - `GET /alerts/me/{device_token}` alerts for this device (404 = unknown device)
//! - `POST /translate` batch translation of static text

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::RemoteError;
use crate::models::{AlertRecord, RegistrationRequest, TranslationRequest, TranslationResponse};
use crate::session::DeviceToken;

/// Calls the client makes against the remote service
#[async_trait]
pub trait AlertService: Send + Sync {
    async fn register(&self, request: &RegistrationRequest) -> Result<serde_json::Value, RemoteError>;

    async fn alerts_for(&self, token: &DeviceToken) -> Result<Vec<AlertRecord>, RemoteError>;

    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse, RemoteError>;
}

/// `reqwest` implementation of [`AlertService`]
#[derive(Clone)]
pub struct HttpAlertService {
    client: Client,
    base_url: Url,
}

impl HttpAlertService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid service base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Service base URL cannot carry a path: {}", config.base_url);
        }

        let mut builder = Client::builder()
            .user_agent(concat!("unicast-client/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl AlertService for HttpAlertService {
    async fn register(&self, request: &RegistrationRequest) -> Result<serde_json::Value, RemoteError> {
        // Trailing slash is part of the route
        let url = self.endpoint(&["register", ""]);
        debug!("POST {}", url);
        let response = self.client.post(url).json(request).send().await?;
        let status = check_status(&response)?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            debug!("Registration returned {} with an empty body", status);
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn alerts_for(&self, token: &DeviceToken) -> Result<Vec<AlertRecord>, RemoteError> {
        let url = self.endpoint(&["alerts", "me", token.as_str()]);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse, RemoteError> {
        let url = self.endpoint(&["translate"]);
        debug!("POST {} ({} texts)", url, request.texts.len());
        let response = self.client.post(url).json(request).send().await?;
        read_json(response).await
    }
}

fn check_status(response: &Response) -> Result<u16, RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(RemoteError::from_status(status.as_u16()))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    check_status(&response)?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> HttpAlertService {
        HttpAlertService::new(&ServiceConfig {
            base_url: base_url.to_string(),
            timeout_secs: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let svc = service("https://alerts.example.org");
        assert_eq!(svc.endpoint(&["register", ""]).as_str(), "https://alerts.example.org/register/");
        assert_eq!(
            svc.endpoint(&["alerts", "me", "web-1700000000-ab12cd3ef"]).as_str(),
            "https://alerts.example.org/alerts/me/web-1700000000-ab12cd3ef"
        );
        assert_eq!(svc.endpoint(&["translate"]).as_str(), "https://alerts.example.org/translate");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let svc = service("http://127.0.0.1:8000/api/");
        assert_eq!(svc.endpoint(&["translate"]).as_str(), "http://127.0.0.1:8000/api/translate");
    }

    #[test]
    fn test_token_segment_is_encoded() {
        let svc = service("https://alerts.example.org");
        let url = svc.endpoint(&["alerts", "me", "odd/token value"]);
        assert_eq!(url.path(), "/alerts/me/odd%2Ftoken%20value");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpAlertService::new(&ServiceConfig {
            base_url: "mailto:alerts@example.org".to_string(),
            timeout_secs: None,
        });
        assert!(result.is_err());
        assert!(HttpAlertService::new(&ServiceConfig {
            base_url: "not a url".to_string(),
            timeout_secs: Some(3),
        })
        .is_err());
    }
}
