use std::path::Path;

use futures_util::StreamExt;
use log::{debug, warn};
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::checksum::Crc32;
use crate::error::{PatchError, Result};

const USER_AGENT: &str = concat!("pod-patcher/", env!("CARGO_PKG_VERSION"));

/// A file written to disk along with what was received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downloaded {
    pub bytes: u64,
    pub checksum: String,
}

#[derive(Clone)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }

    /// Fetch a document and return its body as text.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PatchError::network(url, e))?
            .error_for_status()
            .map_err(|e| PatchError::network(url, e))?;
        let text = resp.text().await.map_err(|e| PatchError::network(url, e))?;
        debug!("fetched {} ({} bytes)", url, text.len());
        Ok(text)
    }

    /// Stream `url` into `dest`, computing the CRC-32 of the body as it is written.
    pub async fn download_to_path(&self, url: &str, dest: &Path) -> Result<Downloaded> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PatchError::network(url, e))?
            .error_for_status()
            .map_err(|e| PatchError::network(url, e))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PatchError::fs("create download directory", parent, e))?;
        }
        let mut file = File::create(dest)
            .await
            .map_err(|e| PatchError::fs("create", dest, e))?;

        let mut crc = Crc32::new();
        let mut bytes: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PatchError::network(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| PatchError::fs("write", dest, e))?;
            crc.update(&chunk);
            bytes += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| PatchError::fs("flush", dest, e))?;

        Ok(Downloaded {
            bytes,
            checksum: crc.finish(),
        })
    }
}
