use crate::{error::Result, request::ProcessRequest};
use std::future::Future;

#[cfg(feature = "api")]
use crate::{
    auth::{CredentialExchange, TokenManager},
    error::HubError,
    settings::HubSettings,
};
#[cfg(feature = "api")]
use log::{debug, warn};
#[cfg(feature = "api")]
use reqwest::{header::ACCEPT, Client, StatusCode};
#[cfg(feature = "api")]
use std::{sync::Arc, time::Duration};

/// Anything that can turn a process request into raw mask bytes.
pub trait WaterMaskSource {
    fn fetch_mask(&self, request: &ProcessRequest) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Process API client authenticating through a shared token manager.
#[cfg(feature = "api")]
pub struct ProcessApiClient<E> {
    client: Client,
    process_url: String,
    timeout: Duration,
    tokens: Arc<TokenManager<E>>,
}

#[cfg(feature = "api")]
impl<E: CredentialExchange> ProcessApiClient<E> {
    pub fn new(client: Client, settings: &HubSettings, tokens: Arc<TokenManager<E>>) -> Self {
        ProcessApiClient {
            client,
            process_url: settings.process_url.clone(),
            timeout: settings.process_timeout,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager<E>> {
        &self.tokens
    }
}

#[cfg(feature = "api")]
impl<E: CredentialExchange + Send + Sync> WaterMaskSource for ProcessApiClient<E> {
    async fn fetch_mask(&self, request: &ProcessRequest) -> Result<Vec<u8>> {
        let token = self.tokens.get_token().await?;
        debug!("POST {}", self.process_url);
        let response = self
            .client
            .post(&self.process_url)
            .bearer_auth(token)
            .header(ACCEPT, "application/tar")
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HubError::from_transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            if status == StatusCode::UNAUTHORIZED {
                warn!("Process API rejected the access token, dropping cached token");
                self.tokens.invalidate().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::ProcessApi {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await.map_err(HubError::from_transport)?;
        debug!("Received {} byte mask payload", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(all(test, feature = "api"))]
mod tests {
    use super::*;
    use crate::{
        auth::{Credential, TokenGrant},
        request::{build_request, RequestOptions},
        stub::StubServer,
    };
    use chrono::{NaiveDate, TimeDelta, Utc};
    use wsc_core::Geometry;

    struct NoExchange;

    impl CredentialExchange for NoExchange {
        async fn exchange(&self) -> Result<TokenGrant> {
            Err(HubError::Authentication {
                status: 400,
                body: "unexpected exchange".to_string(),
            })
        }
    }

    fn client(url: &str) -> ProcessApiClient<NoExchange> {
        let settings = HubSettings {
            process_url: url.to_string(),
            ..HubSettings::default()
        };
        let cached = Credential {
            token: "cached-token".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        };
        let tokens = Arc::new(TokenManager::with_cached(NoExchange, cached));
        ProcessApiClient::new(Client::new(), &settings, tokens)
    }

    fn request() -> ProcessRequest {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        build_request(
            &Geometry::rectangle(-114.8, 36.0, -114.2, 36.5),
            &day,
            &day,
            &RequestOptions::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_mask_request_carries_token_and_accept() {
        let server = StubServer::respond("200 OK", b"TARBYTES").await;
        let bytes = client(&server.url).fetch_mask(&request()).await.unwrap();
        assert_eq!(bytes, b"TARBYTES");

        let raw = server.request().await;
        let lower = raw.to_ascii_lowercase();
        assert!(lower.contains("authorization: bearer cached-token"));
        assert!(lower.contains("accept: application/tar"));
        assert!(lower.contains("content-type: application/json"));
        assert!(raw.contains("\"evalscript\""));
    }

    #[tokio::test]
    async fn test_unauthorized_drops_cached_token() {
        let server = StubServer::respond("401 Unauthorized", b"token expired").await;
        let api = client(&server.url);
        let err = api.fetch_mask(&request()).await.unwrap_err();
        assert!(matches!(err, HubError::ProcessApi { status: 401, .. }));
        assert!(api.tokens().expires_at().await.is_none());
    }

    #[tokio::test]
    async fn test_server_error_keeps_token() {
        let server = StubServer::respond("503 Service Unavailable", b"busy").await;
        let api = client(&server.url);
        let err = api.fetch_mask(&request()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(api.tokens().expires_at().await.is_some());
    }
}
