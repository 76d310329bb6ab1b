//! Bearer-token cache in front of a pluggable issuer.

use crate::{AiError, AiResult};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token: String,
    /// `None` means the token never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Source of fresh bearer tokens.
pub trait TokenIssuer: Send {
    fn issue(&mut self, now: DateTime<Utc>) -> AiResult<IssuedToken>;
}

/// Personal access token configured up front.
#[derive(Debug, Clone)]
pub struct StaticTokenIssuer {
    token: String,
}

impl StaticTokenIssuer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenIssuer for StaticTokenIssuer {
    fn issue(&mut self, _now: DateTime<Utc>) -> AiResult<IssuedToken> {
        if self.token.trim().is_empty() {
            return Err(AiError::Auth("access token is empty".to_string()));
        }
        Ok(IssuedToken {
            token: self.token.clone(),
            expires_at: None,
        })
    }
}

/// Re-reads a session token file on every refresh. The platform rotates the
/// file, so each read is trusted for `lifetime`.
#[derive(Debug, Clone)]
pub struct FileTokenIssuer {
    path: PathBuf,
    lifetime: Duration,
}

impl FileTokenIssuer {
    pub fn new(path: impl Into<PathBuf>, lifetime: Duration) -> Self {
        Self {
            path: path.into(),
            lifetime,
        }
    }
}

impl TokenIssuer for FileTokenIssuer {
    fn issue(&mut self, now: DateTime<Utc>) -> AiResult<IssuedToken> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AiError::Auth(format!("cannot read token file {}: {e}", self.path.display()))
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(AiError::Auth(format!(
                "token file {} is empty",
                self.path.display()
            )));
        }
        Ok(IssuedToken {
            token: token.to_string(),
            expires_at: Some(now + self.lifetime),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenState {
    Unauthenticated,
    Valid {
        token: String,
        expires_at: Option<DateTime<Utc>>,
    },
    Expired {
        last_expired_at: DateTime<Utc>,
    },
}

pub struct TokenCache<I> {
    issuer: I,
    state: TokenState,
    skew: Duration,
}

impl<I: TokenIssuer> TokenCache<I> {
    pub fn new(issuer: I, skew: Duration) -> Self {
        Self {
            issuer,
            state: TokenState::Unauthenticated,
            skew,
        }
    }

    pub fn state(&self) -> &TokenState {
        &self.state
    }

    /// Returns a usable bearer token, refreshing when the cached one is
    /// within `skew` of its expiry.
    pub fn bearer(&mut self, now: DateTime<Utc>) -> AiResult<String> {
        let cached = match &self.state {
            TokenState::Valid { token, expires_at } => Some((token.clone(), *expires_at)),
            _ => None,
        };
        match cached {
            Some((token, None)) => return Ok(token),
            Some((token, Some(exp))) if now < exp - self.skew => return Ok(token),
            Some((_, Some(exp))) => {
                debug!(expires_at = %exp, "bearer token near expiry");
                self.state = TokenState::Expired {
                    last_expired_at: exp,
                };
            }
            None => {}
        }
        self.refresh(now)
    }

    /// Drops the cached token, e.g. after the service rejected it.
    pub fn invalidate(&mut self, now: DateTime<Utc>) {
        if matches!(self.state, TokenState::Valid { .. }) {
            self.state = TokenState::Expired {
                last_expired_at: now,
            };
        }
    }

    fn refresh(&mut self, now: DateTime<Utc>) -> AiResult<String> {
        match self.issuer.issue(now) {
            Ok(issued) => {
                debug!(expires_at = ?issued.expires_at, "issued bearer token");
                let token = issued.token.clone();
                self.state = TokenState::Valid {
                    token: issued.token,
                    expires_at: issued.expires_at,
                };
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                self.state = TokenState::Unauthenticated;
                Err(match err {
                    AiError::Auth(msg) => AiError::Auth(msg),
                    other => AiError::Auth(other.to_string()),
                })
            }
        }
    }
}
