use futures::{Stream, StreamExt};

use crate::error::{OpenProjectError, Result};

/// A user's avatar image, held as an undrained HTTP response so callers can
/// forward it without buffering.
#[derive(Debug)]
pub struct UserAvatar {
    content_type: String,
    response: reqwest::Response,
}

impl UserAvatar {
    pub(crate) fn new(content_type: String, response: reqwest::Response) -> Self {
        Self {
            content_type,
            response,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Read the whole image into memory.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let url = self.response.url().to_string();
        let bytes = self
            .response
            .bytes()
            .await
            .map_err(|e| OpenProjectError::Retrieval {
                url,
                message: "failed to read the avatar body".to_string(),
                source: Some(e),
            })?;
        Ok(bytes.to_vec())
    }

    /// Stream the image chunk by chunk.
    pub fn bytes_stream(self) -> impl Stream<Item = Result<Vec<u8>>> {
        let url = self.response.url().to_string();
        self.response.bytes_stream().map(move |chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| OpenProjectError::Retrieval {
                    url: url.clone(),
                    message: "failed to read the avatar body".to_string(),
                    source: Some(e),
                })
        })
    }
}
