//! The authentication seam.
//!
//! Token minting, password hashing, and account storage live outside
//! the core. The websocket upgrade hands the query token to an
//! [`Authenticator`]; a rejection becomes a 401 before the duplex
//! channel ever exists, so the rest of the server only sees resolved
//! identities.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ServerError;
use crate::types::{Identity, UserId};

/// Resolves a connection token to an authenticated identity.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve `token`, or fail with [`ServerError::AuthenticationFailed`].
    async fn authenticate(&self, token: &str) -> Result<Identity, ServerError>;
}

/// A fixed token table, for tests.
#[derive(Debug, Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, Identity>,
}

impl StaticAuthenticator {
    /// An empty table that rejects everyone.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token mapping.
    #[must_use]
    pub fn with_user(mut self, token: &str, identity: Identity) -> Self {
        self.users.insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, ServerError> {
        self.users
            .get(token)
            .copied()
            .ok_or(ServerError::AuthenticationFailed)
    }
}

/// Development stand-in for the external identity provider: accepts
/// any token that is a bare numeric user id and grants the default
/// rating. Never deploy this.
#[derive(Debug, Default)]
pub struct DevAuthenticator;

#[async_trait]
impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, ServerError> {
        let raw: u64 = token
            .parse()
            .map_err(|_| ServerError::AuthenticationFailed)?;
        Ok(Identity::new(UserId::new(raw)))
    }
}
