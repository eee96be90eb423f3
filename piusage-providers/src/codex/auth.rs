//! Codex credential helpers.
//!
//! Reads the Codex CLI's own `auth.json` as a fallback when the agent store
//! has no `openai-codex` entry, and extracts the email claim from OpenAI
//! JWTs.
//!
//! # CLI auth.json Format
//!
//! ```json
//! {
//!   "OPENAI_API_KEY": null,
//!   "tokens": {
//!     "id_token": "eyJ...",
//!     "access_token": "eyJ...",
//!     "refresh_token": "...",
//!     "account_id": "..."
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use base64::prelude::*;
use piusage_core::CredentialEntry;
use serde::Deserialize;
use tracing::{debug, instrument, trace};

/// Environment variable overriding the Codex CLI home.
pub const CODEX_HOME_ENV: &str = "CODEX_HOME";

// ============================================================================
// Auth File Structures
// ============================================================================

/// Root of the Codex CLI `auth.json`.
#[derive(Debug, Default, Deserialize)]
pub struct CliAuthFile {
    /// Token container.
    #[serde(default)]
    pub tokens: Option<CliTokens>,
}

/// Tokens written by the Codex CLI.
#[derive(Debug, Default, Deserialize)]
pub struct CliTokens {
    /// OpenID token carrying the email claim.
    #[serde(default, alias = "idToken")]
    pub id_token: Option<String>,
    /// Bearer token for the ChatGPT backend.
    #[serde(default, alias = "accessToken")]
    pub access_token: Option<String>,
    /// Refresh token.
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    /// ChatGPT account id.
    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,
}

impl CliAuthFile {
    /// Converts the file into a credential entry, if it holds a token.
    pub fn into_entry(self) -> Option<CredentialEntry> {
        let tokens = self.tokens?;
        let access = tokens.access_token.filter(|t| !t.is_empty())?;
        let email = tokens
            .id_token
            .as_deref()
            .and_then(email_from_jwt)
            .or_else(|| email_from_jwt(&access));

        let mut entry = CredentialEntry::oauth(access);
        entry.refresh = tokens.refresh_token;
        entry.account_id = tokens.account_id;
        entry.email = email;
        Some(entry)
    }
}

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims read from an OpenAI JWT payload.
#[derive(Debug, Default, Deserialize)]
struct JwtClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "https://api.openai.com/profile")]
    profile: Option<ProfileClaim>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileClaim {
    #[serde(default)]
    email: Option<String>,
}

/// Extracts the email claim from a JWT without verifying it.
///
/// Looks at the top-level `email` claim, then at the OpenAI profile claim.
pub fn email_from_jwt(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let decoded = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .or_else(|_| BASE64_STANDARD.decode(payload))
        .ok()?;
    let claims: JwtClaims = serde_json::from_slice(&decoded)
        .inspect_err(|e| trace!(error = %e, "JWT payload is not JSON"))
        .ok()?;

    claims
        .email
        .or_else(|| claims.profile.and_then(|p| p.email))
        .filter(|e| !e.is_empty())
}

// ============================================================================
// CLI Fallback
// ============================================================================

/// Directory of the Codex CLI: `$CODEX_HOME`, else `~/.codex`.
pub fn codex_home() -> Option<PathBuf> {
    match std::env::var_os(CODEX_HOME_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|home| home.join(".codex")),
    }
}

/// Reads the Codex CLI credential, if any.
pub fn read_cli_credential() -> Option<CredentialEntry> {
    read_cli_credential_from(&codex_home()?.join("auth.json"))
}

/// Reads a Codex CLI `auth.json` at `path`.
#[instrument]
pub fn read_cli_credential_from(path: &Path) -> Option<CredentialEntry> {
    let content = std::fs::read_to_string(path)
        .inspect_err(|e| debug!(path = %path.display(), error = %e, "No Codex CLI auth"))
        .ok()?;
    let file: CliAuthFile = serde_json::from_str(&content)
        .inspect_err(|e| debug!(path = %path.display(), error = %e, "Unreadable Codex CLI auth"))
        .ok()?;
    file.into_entry()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            BASE64_URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_email_from_top_level_claim() {
        let token = jwt(r#"{"sub":"u1","email":"dev@example.com"}"#);
        assert_eq!(email_from_jwt(&token).as_deref(), Some("dev@example.com"));
    }

    #[test]
    fn test_email_from_profile_claim() {
        let token = jwt(r#"{"https://api.openai.com/profile":{"email":"p@example.com"}}"#);
        assert_eq!(email_from_jwt(&token).as_deref(), Some("p@example.com"));
    }

    #[test]
    fn test_email_from_bad_tokens() {
        assert_eq!(email_from_jwt("not-a-jwt"), None);
        assert_eq!(email_from_jwt("a.!!!.c"), None);
        assert_eq!(email_from_jwt(&jwt(r#"{"sub":"u1"}"#)), None);
        assert_eq!(email_from_jwt(&jwt(r#"{"email":""}"#)), None);
    }

    #[test]
    fn test_cli_file_into_entry() {
        let id_token = jwt(r#"{"email":"cli@example.com"}"#);
        let json = format!(
            r#"{{
                "OPENAI_API_KEY": null,
                "tokens": {{
                    "id_token": "{id_token}",
                    "access_token": "at-1",
                    "refresh_token": "rt-1",
                    "account_id": "acct-9"
                }},
                "last_refresh": "2026-01-01T00:00:00Z"
            }}"#
        );
        let file: CliAuthFile = serde_json::from_str(&json).unwrap();
        let entry = file.into_entry().unwrap();
        assert_eq!(entry.access.as_deref(), Some("at-1"));
        assert_eq!(entry.account_id.as_deref(), Some("acct-9"));
        assert_eq!(entry.email.as_deref(), Some("cli@example.com"));
    }

    #[test]
    fn test_cli_file_without_tokens() {
        let file: CliAuthFile = serde_json::from_str(r#"{"OPENAI_API_KEY":"sk-1"}"#).unwrap();
        assert!(file.into_entry().is_none());
    }

    #[test]
    fn test_read_cli_credential_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        assert!(read_cli_credential_from(&path).is_none());

        std::fs::write(&path, r#"{"tokens": {"accessToken": "at-2", "accountId": "a"}}"#).unwrap();
        let entry = read_cli_credential_from(&path).unwrap();
        assert_eq!(entry.access.as_deref(), Some("at-2"));

        std::fs::write(&path, "not json").unwrap();
        assert!(read_cli_credential_from(&path).is_none());
    }
}
