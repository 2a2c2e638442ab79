use crate::error::{HubError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use futures::lock::Mutex;
use log::{debug, info};
use serde::Deserialize;
use std::{fmt, future::Future};

#[cfg(feature = "api")]
use crate::settings::{Credentials, HubSettings};
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "api")]
use std::time::Duration;

/// A cached token is refreshed once it is within this many seconds of expiry.
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Lifetime assumed when the identity service omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 600;

/// Bearer token with its absolute expiry.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - TimeDelta::seconds(REFRESH_MARGIN_SECS)
    }

    fn from_grant(grant: TokenGrant, now: DateTime<Utc>) -> Self {
        let default = TimeDelta::seconds(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = grant
            .expires_in
            .and_then(|secs| TimeDelta::try_seconds(secs.max(0)))
            .unwrap_or(default);
        Credential {
            token: grant.access_token,
            expires_at: now.checked_add_signed(lifetime).unwrap_or(now + default),
        }
    }
}

/// Successful answer of the identity service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Trades configured credentials for a fresh bearer token.
pub trait CredentialExchange {
    fn exchange(&self) -> impl Future<Output = Result<TokenGrant>> + Send;
}

/// Caches one bearer token and refreshes it shortly before expiry.
///
/// The slot stays locked across check-then-refresh, so concurrent callers
/// wait on a single exchange instead of issuing their own. Share one
/// instance per process through an `Arc`.
pub struct TokenManager<E> {
    exchange: E,
    slot: Mutex<Option<Credential>>,
}

impl<E: CredentialExchange> TokenManager<E> {
    pub fn new(exchange: E) -> Self {
        TokenManager {
            exchange,
            slot: Mutex::new(None),
        }
    }

    pub fn with_cached(exchange: E, credential: Credential) -> Self {
        TokenManager {
            exchange,
            slot: Mutex::new(Some(credential)),
        }
    }

    pub async fn get_token(&self) -> Result<String> {
        let mut slot = self.slot.lock().await;
        if let Some(credential) = slot.as_ref() {
            if credential.is_fresh(Utc::now()) {
                return Ok(credential.token.clone());
            }
            debug!("Access token expires at {}, refreshing", credential.expires_at);
        }
        let grant = self.exchange.exchange().await?;
        let credential = Credential::from_grant(grant, Utc::now());
        info!("Obtained access token valid until {}", credential.expires_at);
        let token = credential.token.clone();
        *slot = Some(credential);
        Ok(token)
    }

    /// Drops the cached token so the next call exchanges again.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot.lock().await.as_ref().map(|c| c.expires_at)
    }
}

/// OAuth password grant against the identity service.
#[cfg(feature = "api")]
pub struct PasswordGrant {
    client: Client,
    token_url: String,
    client_id: String,
    timeout: Duration,
    credentials: Credentials,
}

#[cfg(feature = "api")]
impl PasswordGrant {
    pub fn new(client: Client, settings: &HubSettings, credentials: Credentials) -> Self {
        PasswordGrant {
            client,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            timeout: settings.auth_timeout,
            credentials,
        }
    }
}

#[cfg(feature = "api")]
impl CredentialExchange for PasswordGrant {
    async fn exchange(&self) -> Result<TokenGrant> {
        let params = [
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        debug!("Requesting access token from {}", self.token_url);
        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HubError::from_transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::Authentication {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| HubError::InvalidResponse(e.to_string()))
    }
}
