//! Device-configuration API client

use crate::error::ApiError;
use async_trait::async_trait;
use hearth_core::RemoteSettings;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the device's remote configuration
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Fetch the device settings document
    async fn find_setting(&self) -> Result<Map<String, Value>, ApiError>;

    /// Fetch the device location, if one is configured
    async fn find_location(&self) -> Result<Option<Value>, ApiError>;
}

/// `DeviceApi` over HTTP
///
/// Endpoints are `{url}/{version}/device/{uuid}/{setting,location}`.
pub struct HttpDeviceApi {
    client: reqwest::Client,
    base_url: String,
    version: String,
    uuid: String,
    token: Option<String>,
}

impl HttpDeviceApi {
    pub fn new(settings: &RemoteSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            version: settings.version.clone(),
            uuid: settings.uuid.clone(),
            token: settings.token.clone(),
        })
    }

    /// Full URL of a device endpoint
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/device/{}/{}", self.base_url, self.version, self.uuid, name)
    }

    /// GET a device endpoint; `None` for 404 or an empty body
    async fn get(&self, name: &str) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(name);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!(url = %url, "fetching device {}", name);
        let response = request.send().await?;
        let status = response.status().as_u16();

        match status {
            200..=299 => {
                let body = response.text().await?;
                if body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
            }
            401 => Err(ApiError::Unauthorized),
            404 => Ok(None),
            _ => Err(ApiError::Status { status, url }),
        }
    }
}

#[async_trait]
impl DeviceApi for HttpDeviceApi {
    async fn find_setting(&self) -> Result<Map<String, Value>, ApiError> {
        match self.get("setting").await? {
            Some(Value::Object(settings)) => Ok(settings),
            Some(_) => Err(ApiError::InvalidResponse(
                "device settings must be a JSON object".to_string(),
            )),
            None => Err(ApiError::InvalidResponse(
                "no settings returned for device".to_string(),
            )),
        }
    }

    async fn find_location(&self) -> Result<Option<Value>, ApiError> {
        Ok(self.get("location").await?.filter(|location| !location.is_null()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> RemoteSettings {
        RemoteSettings {
            url: url.to_string(),
            version: "v1".to_string(),
            uuid: "1234".to_string(),
            token: Some("secret".to_string()),
            max_delay_secs: 60,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let api = HttpDeviceApi::new(&remote("https://api.example.com")).unwrap();
        assert_eq!(
            api.endpoint("setting"),
            "https://api.example.com/v1/device/1234/setting"
        );
        assert_eq!(
            api.endpoint("location"),
            "https://api.example.com/v1/device/1234/location"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let api = HttpDeviceApi::new(&remote("https://api.example.com/")).unwrap();
        assert_eq!(
            api.endpoint("setting"),
            "https://api.example.com/v1/device/1234/setting"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let api = HttpDeviceApi::new(&remote("http://127.0.0.1:9")).unwrap();
        let err = api.find_setting().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!err.is_unauthorized());
    }
}
