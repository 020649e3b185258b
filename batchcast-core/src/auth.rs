use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Credentials;

/// Seconds subtracted from the platform-reported expiry so a token is
/// refreshed before it can expire mid-request.
const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("token exchange rejected with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// A bearer token and its absolute expiry. `expires_at` already embeds the
/// safety margin, so freshness is a plain `now >= expires_at` comparison.
#[derive(Debug, Clone)]
pub struct BearerToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn from_exchange(access_token: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        Self {
            value: access_token,
            expires_at: now + Duration::seconds(expires_in - TOKEN_SAFETY_MARGIN_SECS),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Caches one bearer token for the configured OAuth client and refreshes it
/// via a client-credentials exchange when absent or inside the safety
/// margin. A rejected exchange is fatal and never retried.
#[derive(Debug, Clone)]
pub struct TokenCache {
    http: Client,
    token_url: String,
    credentials: Credentials,
    current: Option<BearerToken>,
}

impl TokenCache {
    pub fn new(http: Client, token_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            current: None,
        }
    }

    /// The `Authorization` header value, refreshing the token first if
    /// needed.
    pub async fn authorization(&mut self) -> AuthResult<String> {
        let now = Utc::now();
        if let Some(token) = &self.current {
            if !token.is_expired_at(now) {
                return Ok(token.header_value());
            }
        }
        let token = self.refresh(now).await?;
        Ok(token.header_value())
    }

    async fn refresh(&mut self, now: DateTime<Utc>) -> AuthResult<&BearerToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }
        let exchange: TokenResponse = response.json().await?;
        debug!(expires_in = exchange.expires_in, "bearer token refreshed");
        let token = BearerToken::from_exchange(exchange.access_token, exchange.expires_in, now);
        Ok(self.current.insert(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn token_expires_one_margin_early() {
        let issued = at(1_000);
        let token = BearerToken::from_exchange("abc".into(), 300, issued);
        assert!(!token.is_expired_at(at(1_000 + 239)));
        assert!(token.is_expired_at(at(1_000 + 240)));
        assert!(token.is_expired_at(at(1_000 + 300)));
    }

    #[test]
    fn header_value_carries_bearer_scheme() {
        let token = BearerToken::from_exchange("abc".into(), 300, at(0));
        assert_eq!(token.header_value(), "Bearer abc");
    }

    #[test]
    fn exchange_response_parses() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"Bearer","expires_in":300}"#,
        )
        .unwrap();
        assert_eq!(parsed.access_token, "tok");
        assert_eq!(parsed.expires_in, 300);
    }
}
