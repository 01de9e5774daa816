use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenProjectError {
    /// The backend rejected the request as malformed (HTTP 400), usually a
    /// filter or sort expression it could not parse.
    #[error("OpenProject rejected the request to {url}: {body}")]
    BadRequest { url: String, body: String },

    #[error("Failed to retrieve {url}: {message}")]
    Retrieval {
        url: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Authorization failed for connection {connection}: {source}")]
    Authentication {
        connection: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A filter or sort expression could not be converted to or from its
    /// JSON wire form.
    #[error("Failed to translate {what}: {source}")]
    Translation {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("No avatar for user {0}")]
    AvatarNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    #[error("A connection named {0} already exists")]
    DuplicateConnection(String),

    #[error("Failed to read connections file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse connections file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, OpenProjectError>;
