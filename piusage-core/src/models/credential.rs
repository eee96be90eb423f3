//! Stored credential entries.
//!
//! One entry per key in the agent's `auth.json`. The key (`anthropic`,
//! `anthropic-1`, `openai-codex-3`) is the identity; the entry carries no
//! id of its own.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of stored credential, serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// OAuth access/refresh token pair.
    #[default]
    Oauth,
    /// Raw API key.
    ApiKey,
}

impl CredentialKind {
    /// The serialized `type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oauth => "oauth",
            Self::ApiKey => "api_key",
        }
    }
}

/// One stored OAuth token or API key.
///
/// Fields the agent host writes that this crate does not model are kept in
/// `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// Credential kind.
    #[serde(rename = "type", default)]
    pub kind: CredentialKind,
    /// OAuth access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    /// OAuth refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    /// Raw API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Access token expiry, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    /// Provider account id (ChatGPT account for Codex).
    #[serde(
        rename = "accountId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub account_id: Option<String>,
    /// Cached account email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Unmodelled fields, preserved on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialEntry {
    /// Creates an OAuth entry.
    pub fn oauth(access: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::Oauth,
            access: Some(access.into()),
            ..Self::default()
        }
    }

    /// Creates an API-key entry.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::ApiKey,
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// True if the entry holds an access token or a key.
    pub fn is_usable(&self) -> bool {
        self.access.as_deref().is_some_and(|s| !s.is_empty())
            || self.key.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The secret to send as a bearer token: access token, else API key.
    pub fn bearer(&self) -> Option<&str> {
        self.access
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.key.as_deref().filter(|s| !s.is_empty()))
    }
}
