//! Request authentication.
//!
//! In `firebase` mode every request carries a Firebase ID token as a Bearer
//! token, verified against Google's published signing keys. In `development`
//! mode the caller names itself with `X-User-Id`, falling back to
//! `DEV_USER_ID`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, AuthMode};
use crate::error::ApiError;
use crate::handlers::is_valid_id;
use crate::state::AppState;

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Google rotates keys daily; an hour keeps us well inside that.
const JWKS_TTL: Duration = Duration::from_secs(3600);

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, as established by token verification or development mode.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FirebaseClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Cache of Firebase token signing keys, fetched lazily.
pub struct JwksCache {
    http: reqwest::Client,
    url: String,
    cached: RwLock<Option<CachedKeys>>,
}

impl Default for JwksCache {
    fn default() -> Self {
        Self::new()
    }
}

impl JwksCache {
    pub fn new() -> Self {
        Self::with_url(FIREBASE_JWKS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.into(),
            cached: RwLock::new(None),
        }
    }

    async fn fetch(&self) -> Result<HashMap<String, DecodingKey>, ApiError> {
        let set: JwkSet = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::Unavailable(format!("Failed to fetch signing keys: {}", e)))?
            .json()
            .await
            .map_err(|e| ApiError::Unavailable(format!("Invalid signing key set: {}", e)))?;

        let keys: HashMap<String, DecodingKey> = set
            .keys
            .iter()
            .filter_map(|jwk| {
                let kid = jwk.common.key_id.clone()?;
                match DecodingKey::from_jwk(jwk) {
                    Ok(key) => Some((kid, key)),
                    Err(e) => {
                        warn!(kid = %kid, error = %e, "Skipping unusable signing key");
                        None
                    }
                }
            })
            .collect();
        info!(count = keys.len(), "Fetched token signing keys");
        Ok(keys)
    }

    async fn key(&self, kid: &str) -> Result<DecodingKey, ApiError> {
        {
            let cached = self.cached.read().await;
            if let Some(ref c) = *cached {
                if c.fetched_at.elapsed() < JWKS_TTL {
                    if let Some(key) = c.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Stale, empty, or a key we have not seen yet
        let keys = self.fetch().await?;
        let key = keys.get(kid).cloned();
        *self.cached.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        key.ok_or_else(|| ApiError::unauthorized("Unknown token signing key"))
    }

    /// Verify a Firebase ID token issued for `project_id`.
    pub async fn verify(&self, token: &str, project_id: &str) -> Result<FirebaseClaims, ApiError> {
        let header = decode_header(token).map_err(|_| ApiError::unauthorized("Malformed token"))?;
        let kid = header
            .kid
            .ok_or_else(|| ApiError::unauthorized("Token has no key id"))?;
        let key = self.key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", project_id)]);

        let data = decode::<FirebaseClaims>(token, &key, &validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            ApiError::unauthorized("Invalid or expired token")
        })?;
        if data.claims.sub.is_empty() {
            return Err(ApiError::unauthorized("Token has no subject"));
        }
        Ok(data.claims)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Expected: Bearer <token>"))
}

fn development_user(parts: &Parts, config: &ApiConfig) -> Result<AuthUser, ApiError> {
    let header = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let uid = match header {
        Some(uid) if is_valid_id(uid) => uid.to_string(),
        Some(_) => return Err(ApiError::unauthorized("Invalid X-User-Id")),
        None => config
            .dev_user_id
            .clone()
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?,
    };
    Ok(AuthUser { uid, email: None })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match state.config.auth_mode {
            AuthMode::Development => development_user(parts, &state.config),
            AuthMode::Firebase => {
                let token = bearer_token(parts)?;
                let project_id = state
                    .config
                    .firebase_project_id
                    .as_deref()
                    .ok_or_else(|| ApiError::internal("FIREBASE_PROJECT_ID is not configured"))?;
                let claims = state.jwks.verify(token, project_id).await?;
                Ok(AuthUser {
                    uid: claims.sub,
                    email: claims.email,
                })
            }
        }
    }
}
