//! HTTP Basic authentication gate.
//!
//! Every request under `/orders` must carry `Authorization: Basic
//! <base64(user:pass)>` matching the configured pair. Nothing is kept
//! server-side between requests. All failures produce the same empty 401;
//! the specific reason is only logged.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use super::dto::LoginResponse;
use super::error::ApiError;
use crate::config::AuthConfig;

/// Why a request failed authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("authorization scheme is not Basic")]
    InvalidScheme,
    #[error("credentials are not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("credentials are not valid UTF-8")]
    InvalidUtf8,
    #[error("credentials have no ':' separator")]
    MissingSeparator,
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// A decoded `user:pass` pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Parse the value of an `Authorization` header.
    ///
    /// The scheme is case-insensitive. The password may contain `:`.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let (scheme, encoded) = value.trim().split_once(' ').ok_or(AuthError::InvalidScheme)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::InvalidScheme);
        }

        let decoded = STANDARD.decode(encoded.trim())?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidUtf8)?;
        let (username, password) = decoded.split_once(':').ok_or(AuthError::MissingSeparator)?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Parse the `Authorization` header of a request.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidUtf8)?;
        Self::parse(value)
    }
}

/// Checks Basic credentials against a single configured pair.
#[derive(Debug, Clone)]
pub struct BasicAuthenticator {
    expected: AuthConfig,
}

impl BasicAuthenticator {
    pub fn new(expected: AuthConfig) -> Self {
        Self { expected }
    }

    /// Verify the request headers and return the authenticated username.
    pub fn verify(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let credentials = Credentials::from_headers(headers)?;

        let user_ok = constant_time_eq(
            credentials.username.as_bytes(),
            self.expected.username.as_bytes(),
        );
        let pass_ok = constant_time_eq(
            credentials.password.as_bytes(),
            self.expected.password.as_bytes(),
        );
        if user_ok & pass_ok {
            Ok(credentials.username)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Route layer rejecting unauthenticated requests with 401.
pub async fn require_basic_auth(
    State(auth): State<Arc<BasicAuthenticator>>,
    request: Request,
    next: Next,
) -> Response {
    match auth.verify(request.headers()) {
        Ok(username) => {
            debug!(%username, path = %request.uri().path(), "authenticated");
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "authentication failed");
            ApiError::Unauthorized.into_response()
        }
    }
}

/// `POST /login` - validate credentials and echo the username.
pub async fn login(
    State(auth): State<Arc<BasicAuthenticator>>,
    headers: HeaderMap,
) -> Result<Json<LoginResponse>, ApiError> {
    match auth.verify(&headers) {
        Ok(username) => {
            info!(%username, "login succeeded");
            Ok(Json(LoginResponse {
                username,
                message: "Login successful",
            }))
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            Err(ApiError::Unauthorized)
        }
    }
}
