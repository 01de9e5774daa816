//! Named OpenProject connections and the token seam used to reach them.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{OpenProjectError, Result};

/// One configured OpenProject instance. The field names follow the wire
/// format of the connection administration UI.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    #[serde(rename = "connectionName")]
    pub name: String,
    #[serde(rename = "serverURL")]
    pub server_url: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

impl Connection {
    pub fn new(
        name: impl Into<String>,
        server_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            server_url: server_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[derive(Deserialize)]
struct ConnectionsFile {
    #[serde(default)]
    connections: Vec<Connection>,
}

/// The set of configured connections, keyed by their unique name.
///
/// Reads vastly outnumber writes; updates only arrive through the
/// administration surface.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<IndexMap<String, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from existing records. A later record with an
    /// already-seen name replaces the earlier one.
    pub fn from_connections(connections: impl IntoIterator<Item = Connection>) -> Self {
        let registry = Self::new();
        for connection in connections {
            registry.upsert(connection);
        }
        registry
    }

    /// Loads connections from a TOML file holding a `[[connections]]` list.
    /// A missing file is an empty registry, not an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| OpenProjectError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: ConnectionsFile =
            toml::from_str(&contents).map_err(|e| OpenProjectError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self::from_connections(file.connections))
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> Vec<Connection> {
        self.read().values().cloned().collect()
    }

    pub fn connection(&self, name: &str) -> Option<Connection> {
        self.read().get(name).cloned()
    }

    /// Registers a new connection. Names are unique keys; adding a name
    /// that is already taken is rejected.
    pub fn add(&self, connection: Connection) -> Result<()> {
        let mut connections = self.write();
        if connections.contains_key(&connection.name) {
            return Err(OpenProjectError::DuplicateConnection(connection.name));
        }
        connections.insert(connection.name.clone(), connection);
        Ok(())
    }

    /// Creates or replaces a connection.
    pub fn upsert(&self, connection: Connection) {
        self.write().insert(connection.name.clone(), connection);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<String, Connection>> {
        self.connections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<String, Connection>> {
        self.connections.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Source of access tokens for configured connections. The OAuth handshake
/// itself lives outside this crate; implementations typically delegate to
/// the host's identity layer.
pub trait TokenProvider: Send + Sync {
    /// A current access token for the connection, or `None` when the user
    /// has not authorized it yet or the grant has lapsed.
    fn access_token(&self, connection: &str) -> Option<String>;

    /// Starts the authorization handshake for a connection, sending the
    /// user back to `redirect_url` afterwards.
    fn authorize(
        &self,
        connection: &str,
        redirect_url: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
