//! Access credential for the document service
//!
//! A single shared credential is stored for the whole process. Tokens are
//! kept in [`SecretString`] so they are zeroized on drop and never printed by
//! `Debug`.

use crate::config::{secret_string, SecretString};
use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// OAuth token endpoint response
///
/// Field names follow the authorization server's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(rename = "userName", default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,

    /// Absolute expiry, RFC 2822 in GMT
    #[serde(rename = ".expires", default)]
    pub expires: Option<String>,
}

/// The stored access credential
#[derive(Clone)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub scope: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("user_name", &self.user_name)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Credential {
    /// Builds a credential from a token response received at `now`
    ///
    /// The absolute `.expires` field wins over `expires_in`. A response with
    /// neither is treated as already expired.
    pub fn from_token_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = response
            .expires
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| response.expires_in.map(|secs| now + Duration::seconds(secs)))
            .unwrap_or(now);

        Self {
            access_token: secret_string(response.access_token),
            refresh_token: response.refresh_token.map(secret_string),
            expires_at,
            user_name: response.user_name,
            scope: response.scope,
        }
    }

    /// Whether the credential is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret().as_ref()
    }

    /// Plain form used for encrypted persistence
    pub fn to_stored(&self) -> StoredCredential {
        StoredCredential {
            access_token: self.access_token.expose_secret().to_string(),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            expires_at: self.expires_at,
            user_name: self.user_name.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Serialized credential, only ever written in encrypted form
#[derive(Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub scope: Option<String>,
}

impl From<StoredCredential> for Credential {
    fn from(stored: StoredCredential) -> Self {
        Self {
            access_token: secret_string(stored.access_token),
            refresh_token: stored.refresh_token.map(secret_string),
            expires_at: stored.expires_at,
            user_name: stored.user_name,
            scope: stored.scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn response() -> TokenResponse {
        serde_json::from_value(serde_json::json!({
            "access_token": "fake_token",
            "refresh_token": "fake_refresh",
            "token_type": "bearer",
            "expires_in": 3599,
            "userName": "fake_user@user.com",
            "scope": "full_user",
            ".issued": "Thu, 30 Jan 2020 22:08:47 GMT",
            ".expires": "Thu, 30 Jan 2020 23:08:47 GMT"
        }))
        .unwrap()
    }

    #[test]
    fn test_absolute_expiry_wins() {
        let now = Utc.with_ymd_and_hms(2020, 1, 30, 22, 8, 47).unwrap();
        let cred = Credential::from_token_response(response(), now);

        assert_eq!(
            cred.expires_at,
            Utc.with_ymd_and_hms(2020, 1, 30, 23, 8, 47).unwrap()
        );
        assert_eq!(cred.user_name.as_deref(), Some("fake_user@user.com"));
        assert_eq!(cred.bearer(), "fake_token");
        assert!(!cred.is_expired_at(now));
        assert!(cred.is_expired_at(now + Duration::hours(2)));
    }

    #[test]
    fn test_relative_expiry_fallback() {
        let mut resp = response();
        resp.expires = None;
        let now = Utc::now();
        let cred = Credential::from_token_response(resp, now);
        assert_eq!(cred.expires_at, now + Duration::seconds(3599));
    }

    #[test]
    fn test_missing_expiry_is_expired() {
        let mut resp = response();
        resp.expires = None;
        resp.expires_in = None;
        let cred = Credential::from_token_response(resp, Utc::now());
        assert!(cred.is_expired());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let cred = Credential::from_token_response(response(), Utc::now());
        let debug = format!("{cred:?}");
        assert!(!debug.contains("fake_token"));
        assert!(!debug.contains("fake_refresh"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_stored_roundtrip_keeps_tokens() {
        let cred = Credential::from_token_response(response(), Utc::now());
        let json = serde_json::to_string(&cred.to_stored()).unwrap();
        let restored: Credential = serde_json::from_str::<StoredCredential>(&json).unwrap().into();
        assert_eq!(restored.bearer(), "fake_token");
        assert_eq!(restored.expires_at, cred.expires_at);
    }
}
