//! Bearer-token caller resolution
//!
//! The REST surface only needs one fact about a caller: whether they are an
//! admin. [`CallerResolver`] is the seam where a real identity provider plugs
//! in; [`StaticTokenResolver`] serves a fixed token table from configuration.

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use std::collections::HashMap;

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub is_admin: bool,
}

/// Resolves a bearer token to a caller.
#[async_trait]
pub trait CallerResolver: Send + Sync {
    /// `None` when the token is not recognized.
    async fn resolve(&self, token: &str) -> Option<Caller>;
}

/// Fixed token → admin-flag table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, bool>,
}

impl StaticTokenResolver {
    pub fn new(tokens: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, is_admin: bool) -> Self {
        self.tokens.insert(token.into(), is_admin);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl CallerResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> Option<Caller> {
        self.tokens
            .get(token)
            .map(|&is_admin| Caller { is_admin })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
