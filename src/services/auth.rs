//! Platform authorization.
//!
//! Exchanges script-app credentials for a bearer token. Tokens are not
//! cached: the publisher authorizes before every publish, which is at most
//! once per cooldown interval.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::utils::http::{BodyMode, HttpClient};

/// Script-app credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Headers identifying the account on authenticated calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub authorization: String,
    pub user_agent: String,
}

/// OAuth password-grant client.
pub struct Authorizer {
    http: Arc<HttpClient>,
    token_url: String,
    user_agent: String,
    credentials: Credentials,
}

impl Authorizer {
    pub fn new(
        http: Arc<HttpClient>,
        token_url: impl Into<String>,
        user_agent: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            user_agent: user_agent.into(),
            credentials,
        }
    }

    /// Request a fresh bearer token.
    pub async fn authorize(&self) -> Result<AuthHeaders> {
        let form = [
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];
        let request = self
            .http
            .client()
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&form);

        let fetched = self.http.fetch_once(request, BodyMode::Read).await;
        let payload = fetched
            .json()
            .ok_or_else(|| AppError::auth("token endpoint returned no usable response"))?;

        let token = Self::access_token(&payload)?;
        Ok(AuthHeaders {
            authorization: format!("bearer {token}"),
            user_agent: self.user_agent.clone(),
        })
    }

    fn access_token(payload: &Value) -> Result<&str> {
        if let Some(token) = payload.get("access_token").and_then(Value::as_str) {
            return Ok(token);
        }
        let reason = payload
            .get("error")
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no access_token in response".to_string());
        Err(AppError::auth(reason))
    }
}
