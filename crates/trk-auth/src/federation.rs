//! Google OAuth2 federation bridge
//!
//! Two-step authorization-code flow: `begin_authorization` produces the
//! provider redirect with a fresh anti-replay state, and
//! `complete_authorization` exchanges the code, fetches the userinfo
//! profile, and returns the verified email + display name. The caller maps
//! the profile onto a local user.

use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use trk_core::config::GoogleOAuthConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

// outbound provider calls must not hang a request handler indefinitely
const PROVIDER_TIMEOUT_SECS: u64 = 10;
const STATE_TTL_MINUTES: i64 = 10;

/// Federation failures; none of these may leave a half-formed user behind
#[derive(Debug, Error)]
pub enum FederationError {
    #[error("Federation not configured: {0}")]
    Config(String),
    #[error("Authorization state missing or expired")]
    StateMismatch,
    #[error("Code exchange failed: {0}")]
    Exchange(String),
    #[error("Provider request failed: {0}")]
    Provider(String),
    #[error("Provider profile missing field: {0}")]
    Profile(&'static str),
}

/// The subset of the userinfo response this service consumes
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
}

/// Derive a local username candidate from a provider display name:
/// whitespace stripped, lowercased. Collisions with existing usernames are
/// not resolved here; the unique constraint reports them.
pub fn derive_username(display_name: &str) -> String {
    display_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Driver for the external authorization-code exchange
pub struct GoogleFederation {
    client: BasicClient,
    http: reqwest::Client,
    userinfo_url: String,
    /// Outstanding anti-replay states awaiting a callback
    pending_states: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl GoogleFederation {
    pub fn new(config: &GoogleOAuthConfig) -> Result<Self, FederationError> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                .map_err(|e| FederationError::Config(e.to_string()))?,
            Some(
                TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
                    .map_err(|e| FederationError::Config(e.to_string()))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_url.clone())
                .map_err(|e| FederationError::Config(e.to_string()))?,
        );

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .map_err(|e| FederationError::Config(e.to_string()))?;

        Ok(Self {
            client,
            http,
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            pending_states: RwLock::new(HashMap::new()),
        })
    }

    /// Build the provider authorization URL and register its state
    pub fn begin_authorization(&self) -> String {
        let (url, csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        if let Ok(mut pending) = self.pending_states.write() {
            let now = Utc::now();
            pending.retain(|_, expires| *expires > now);
            pending.insert(
                csrf.secret().clone(),
                now + Duration::minutes(STATE_TTL_MINUTES),
            );
        }

        url.to_string()
    }

    /// Exchange the callback code for the provider profile.
    ///
    /// The state must match one issued by `begin_authorization` and still be
    /// within its TTL; each state is single-use.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<GoogleProfile, FederationError> {
        let valid = {
            let mut pending = self
                .pending_states
                .write()
                .map_err(|_| FederationError::Provider("state store unavailable".into()))?;
            match pending.remove(state) {
                Some(expires) => expires > Utc::now(),
                None => false,
            }
        };
        if !valid {
            return Err(FederationError::StateMismatch);
        }

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| FederationError::Exchange(e.to_string()))?;

        self.fetch_profile(token.access_token().secret()).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, FederationError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FederationError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| FederationError::Provider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FederationError::Provider(e.to_string()))?;

        let email = body
            .get("email")
            .and_then(|v| v.as_str())
            .ok_or(FederationError::Profile("email"))?
            .to_string();
        let name = body
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or(FederationError::Profile("name"))?
            .to_string();

        Ok(GoogleProfile { email, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "test-client-id".into(),
            client_secret: "test-client-secret".into(),
            redirect_url: "http://localhost:8080/google-callback".into(),
        }
    }

    #[test]
    fn test_derive_username() {
        assert_eq!(derive_username("Ada Lovelace"), "adalovelace");
        assert_eq!(derive_username("  Grace  Hopper "), "gracehopper");
        assert_eq!(derive_username("单名"), "单名");
    }

    #[test]
    fn test_authorize_url_contains_required_parameters() {
        let federation = GoogleFederation::new(&config()).unwrap();
        let url = federation.begin_authorization();

        let parsed = url::Url::parse(&url).unwrap();
        let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert_eq!(params.get("client_id"), Some(&"test-client-id".to_string()));
        assert_eq!(params.get("response_type"), Some(&"code".to_string()));
        assert_eq!(
            params.get("redirect_uri"),
            Some(&"http://localhost:8080/google-callback".to_string())
        );
        assert_eq!(params.get("scope"), Some(&"openid email profile".to_string()));
        assert!(params.get("state").map(|s| !s.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_each_authorization_gets_fresh_state() {
        let federation = GoogleFederation::new(&config()).unwrap();
        let first = url::Url::parse(&federation.begin_authorization()).unwrap();
        let second = url::Url::parse(&federation.begin_authorization()).unwrap();

        let state_of = |u: &url::Url| {
            u.query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned())
                .unwrap()
        };
        assert_ne!(state_of(&first), state_of(&second));
    }

    #[tokio::test]
    async fn test_unknown_state_is_rejected_before_exchange() {
        let federation = GoogleFederation::new(&config()).unwrap();
        // no network call happens: the state check fails first
        let result = federation.complete_authorization("code", "never-issued").await;
        assert!(matches!(result, Err(FederationError::StateMismatch)));
    }
}
