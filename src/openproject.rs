//! Entry point tying the connection registry, the token provider, the
//! response cache and the HTTP client together.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::cache::{CacheOptions, ResponseCache};
use crate::cached_client::CachedClient;
use crate::client::ApiClient;
use crate::config::{Connection, ConnectionRegistry, TokenProvider};
use crate::error::{OpenProjectError, Result};
use crate::types::UserAvatar;

/// Keeps a slow backend from pinning a caller forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of an avatar lookup. "Not authorized" and "no such image" are
/// ordinary states the caller renders, not failures.
pub enum AvatarLookup {
    Found(UserAvatar),
    NotFound,
    Unauthorized,
}

pub struct OpenProject {
    registry: ConnectionRegistry,
    tokens: Arc<dyn TokenProvider>,
    http: Client,
    cache: Arc<ResponseCache>,
}

impl OpenProject {
    pub fn new(registry: ConnectionRegistry, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::with_cache_options(registry, tokens, CacheOptions::default())
    }

    pub fn with_cache_options(
        registry: ConnectionRegistry,
        tokens: Arc<dyn TokenProvider>,
        options: CacheOptions,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| OpenProjectError::HttpClient { source })?;
        Ok(Self {
            registry,
            tokens,
            http,
            cache: Arc::new(ResponseCache::new(options)),
        })
    }

    /// A ready-to-use client for a named connection.
    ///
    /// `None` covers every expected "cannot talk to the backend right now"
    /// state: the connection is not configured, or the token provider has no
    /// usable token for it. Callers render these as a needs-authorization
    /// state, so none of them is an error.
    pub fn client_for(&self, connection: &str) -> Option<CachedClient> {
        let Some(record) = self.registry.connection(connection) else {
            tracing::warn!(connection, "requested a client for an unknown connection");
            return None;
        };
        let token = self
            .tokens
            .access_token(connection)
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            tracing::warn!(connection, "no usable access token for the connection");
            return None;
        };
        match ApiClient::new(self.http.clone(), &record.server_url, token) {
            Ok(client) => Some(CachedClient::new(client, record.name, Arc::clone(&self.cache))),
            Err(error) => {
                tracing::warn!(connection, %error, "cannot build a client for the connection");
                None
            }
        }
    }

    /// Starts the authorization handshake for a connection.
    pub fn authorize(&self, connection: &str, redirect_url: &str) -> Result<()> {
        self.tokens
            .authorize(connection, redirect_url)
            .map_err(|source| OpenProjectError::Authentication {
                connection: connection.to_string(),
                source,
            })
    }

    /// Fetches a user's avatar, folding the expected miss states into
    /// [`AvatarLookup`] and keeping real failures as errors.
    pub async fn user_avatar(&self, connection: &str, user_id: &str) -> Result<AvatarLookup> {
        let Some(client) = self.client_for(connection) else {
            return Ok(AvatarLookup::Unauthorized);
        };
        match client.user_avatar(user_id).await {
            Ok(avatar) => Ok(AvatarLookup::Found(avatar)),
            Err(OpenProjectError::AvatarNotFound(_)) => Ok(AvatarLookup::NotFound),
            Err(error) => Err(error),
        }
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.registry.connections()
    }

    pub fn connection(&self, name: &str) -> Option<Connection> {
        self.registry.connection(name)
    }

    /// Registers a new connection. Cached pages are dropped since they may
    /// not reflect the new configuration.
    pub fn add_connection(&self, connection: Connection) -> Result<()> {
        self.registry.add(connection)?;
        self.cache.clear();
        Ok(())
    }

    /// Creates or replaces a connection, dropping cached pages.
    pub fn upsert_connection(&self, connection: Connection) {
        self.registry.upsert(connection);
        self.cache.clear();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
