use std::{fmt, time::Duration};
use wsc_core::ConfigError;

pub const DEFAULT_TOKEN_URL: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";
pub const DEFAULT_PROCESS_URL: &str = "https://sh.dataspace.copernicus.eu/api/v1/process";
pub const DEFAULT_CLIENT_ID: &str = "cdse-public";

pub const USERNAME_VAR: &str = "COPERNICUS_USERNAME";
pub const PASSWORD_VAR: &str = "COPERNICUS_PASSWORD";

/// Endpoints and deadlines for the identity and processing services.
#[derive(Debug, Clone, PartialEq)]
pub struct HubSettings {
    pub token_url: String,
    pub process_url: String,
    pub client_id: String,
    pub auth_timeout: Duration,
    pub process_timeout: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        HubSettings {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            process_url: DEFAULT_PROCESS_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            auth_timeout: Duration::from_secs(30),
            process_timeout: Duration::from_secs(60),
        }
    }
}

impl HubSettings {
    /// Defaults with optional endpoint overrides.
    pub fn with_urls(token_url: Option<String>, process_url: Option<String>) -> Self {
        let defaults = HubSettings::default();
        HubSettings {
            token_url: token_url.unwrap_or(defaults.token_url),
            process_url: process_url.unwrap_or(defaults.process_url),
            ..defaults
        }
    }
}

/// Account used for the password grant.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Result<Self, ConfigError> {
        let username = username
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingCredentials(USERNAME_VAR))?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingCredentials(PASSWORD_VAR))?;
        Ok(Credentials { username, password })
    }
}
