use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::Client;

use crate::core::error::{SyncError, SyncResult};

/// Chunks of an artifact body as they arrive.
pub type ByteStream = BoxStream<'static, SyncResult<Vec<u8>>>;

/// Where artifact bytes come from.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Start a download and return its body as a stream.
    async fn open(&self, url: &str) -> SyncResult<ByteStream>;
}

/// Streams artifacts over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtifactSource for HttpSource {
    async fn open(&self, url: &str) -> SyncResult<ByteStream> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(SyncError::from))
            .boxed())
    }
}
