//! Provider types.
//!
//! - [`ProviderKind`] - The providers that expose a usage endpoint
//! - [`LoginMethod`] - How credentials for a provider are obtained

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// A provider with a usage or quota endpoint.
///
/// Each provider groups any number of stored accounts under one credential
/// key prefix (`anthropic`, `anthropic-1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude (OAuth subscription).
    Claude,
    /// OpenAI Codex (ChatGPT subscription).
    Codex,
    /// Z.AI coding plan (API key).
    Zai,
}

impl ProviderKind {
    /// Returns all provider kinds in display order.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Claude, Self::Codex, Self::Zai]
    }

    /// Credential store key prefix for this provider.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Claude => "anthropic",
            Self::Codex => "openai-codex",
            Self::Zai => "zai",
        }
    }

    /// Human-readable provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Codex => "Codex",
            Self::Zai => "Z.AI",
        }
    }

    /// Short name used on the command line and in config files.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Zai => "zai",
        }
    }

    /// statuspage.io endpoint for this provider, if it has one.
    pub fn status_page_url(&self) -> Option<&'static str> {
        match self {
            Self::Claude => Some("https://status.anthropic.com/api/v2/status.json"),
            Self::Codex => Some("https://status.openai.com/api/v2/status.json"),
            Self::Zai => None,
        }
    }

    /// How accounts for this provider authenticate.
    pub fn login_method(&self) -> LoginMethod {
        match self {
            Self::Claude | Self::Codex => LoginMethod::OAuth,
            Self::Zai => LoginMethod::ApiKey,
        }
    }

    /// Whether several stored accounts can be switched between.
    pub fn supports_account_switching(&self) -> bool {
        matches!(self, Self::Claude | Self::Codex)
    }

    /// Finds the provider that owns a credential key, if any.
    pub fn from_credential_key(key: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| match_prefix(key, kind.key_prefix()).is_some())
    }
}

// ============================================================================
// Credential Keys
// ============================================================================

/// How a credential key relates to a provider prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMatch {
    /// The key is the prefix itself.
    Selected,
    /// The key is `prefix-<n>`.
    Numbered(u64),
}

/// Matches `key` against `prefix`.
///
/// The suffix must be a positive integer without leading zeros, so
/// `openai-codex` is not an entry of the `openai` prefix and neither
/// `anthropic-0` nor `anthropic-01` belongs to `anthropic`.
pub fn match_prefix(key: &str, prefix: &str) -> Option<PrefixMatch> {
    if key == prefix {
        return Some(PrefixMatch::Selected);
    }
    let suffix = key.strip_prefix(prefix)?.strip_prefix('-')?;
    if suffix.is_empty() || suffix.starts_with('0') || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().map(PrefixMatch::Numbered)
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "codex" | "openai-codex" => Ok(Self::Codex),
            "zai" | "z.ai" => Ok(Self::Zai),
            other => Err(CoreError::ProviderNotFound(other.to_string())),
        }
    }
}

// ============================================================================
// Login Method
// ============================================================================

/// How the user authenticated with a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    /// OAuth 2.0 access/refresh tokens.
    OAuth,
    /// Raw API key.
    #[default]
    ApiKey,
}

impl LoginMethod {
    /// Message used when no credential of this kind is configured.
    pub fn missing_message(&self) -> &'static str {
        match self {
            Self::OAuth => super::usage::NO_CREDENTIALS,
            Self::ApiKey => super::usage::NO_API_KEY,
        }
    }
}
