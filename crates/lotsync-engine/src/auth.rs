//! Credentials for the source and destination services.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// Credentials applied to outbound requests.
///
/// The source catalog uses Basic authentication; the destination content
/// service uses a Bearer token. The [`Debug`] impl redacts secrets to
/// prevent accidental credential exposure in log output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Credentials {
    /// HTTP Basic authentication.
    Basic { username: String, password: String },

    /// Bearer token authentication.
    Bearer { token: String },
}

impl Credentials {
    /// Basic credentials from a username/password pair.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer credentials from a static token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Apply authentication to a request builder.
    #[must_use]
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Self::Bearer { token } => builder.bearer_auth(token),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}
