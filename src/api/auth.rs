//! Caller identity for endpoints that require a signed-in user.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::collections::HashMap;

use crate::config::AuthConfig;

use super::routes::ApiError;
use super::state::AppState;

/// An identified caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub name: String,
}

/// Resolves a bearer token to a caller
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    fn identify(&self, token: &str) -> Option<Caller>;
}

/// Fixed token table loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    callers: HashMap<String, String>,
}

impl StaticTokenIdentity {
    /// Build from `(token, caller name)` pairs. Blank tokens are ignored.
    pub fn new<I, T, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, N)>,
        T: Into<String>,
        N: Into<String>,
    {
        let callers = pairs
            .into_iter()
            .map(|(token, name)| (token.into(), name.into()))
            .filter(|(token, _)| !token.trim().is_empty())
            .collect();
        Self { callers }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let identity = Self::new(
            config
                .callers
                .iter()
                .map(|c| (c.token.clone(), c.name.clone())),
        );
        if identity.callers.is_empty() {
            tracing::warn!("No callers configured; /api/search/all will reject every request");
        }
        identity
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn identify(&self, token: &str) -> Option<Caller> {
        self.callers.get(token).map(|name| Caller { name: name.clone() })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = bearer_token(parts).and_then(|token| state.identity.identify(token));
        match caller {
            Some(caller) => Ok(caller),
            None => Err(ApiError::unauthorized()),
        }
    }
}
