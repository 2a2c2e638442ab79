//! Client side of the Copernicus Data Space processing service.
//!
//! The token manager and request builder are always available; the HTTP
//! implementations live behind the `api` feature.

pub mod auth;
pub mod error;
pub mod evalscript;
pub mod process_api;
pub mod request;
pub mod settings;

#[cfg(all(test, feature = "api"))]
mod stub;

pub use auth::{Credential, CredentialExchange, TokenGrant, TokenManager};
pub use error::{HubError, Result};
pub use process_api::WaterMaskSource;
pub use request::{build_request, ProcessRequest, RequestOptions};
pub use settings::{Credentials, HubSettings};

#[cfg(feature = "api")]
pub use auth::PasswordGrant;
#[cfg(feature = "api")]
pub use process_api::ProcessApiClient;
