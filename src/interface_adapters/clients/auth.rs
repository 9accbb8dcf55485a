use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Guest session returned by the auth service; the token rides on the ws Join.
#[derive(Debug, Clone, Deserialize)]
pub struct GuestSession {
    pub guest_id: u64,
    pub display_name: String,
    pub session_token: String,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
struct GuestLoginRequest<'a> {
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug)]
pub enum AuthError {
    Rejected(String),
    UpstreamUnavailable,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Rejected(message) => write!(f, "login rejected: {message}"),
            AuthError::UpstreamUnavailable => write!(f, "auth service unavailable"),
        }
    }
}

impl std::error::Error for AuthError {}

// Thin reqwest client for guest login.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn guest_login(&self, display_name: &str) -> Result<GuestSession, AuthError> {
        let url = format!("{}/auth/guest-login", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&GuestLoginRequest { display_name })
            .send()
            .await
            .map_err(|_| AuthError::UpstreamUnavailable)?;

        if response.status().is_success() {
            return response
                .json::<GuestSession>()
                .await
                .map_err(|_| AuthError::UpstreamUnavailable);
        }

        if response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNAUTHORIZED
        {
            let error = response
                .json::<ErrorResponse>()
                .await
                .map_err(|_| AuthError::UpstreamUnavailable)?;
            return Err(AuthError::Rejected(error.message));
        }

        Err(AuthError::UpstreamUnavailable)
    }
}
