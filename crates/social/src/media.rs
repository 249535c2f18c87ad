use std::path::Path;

use {futures::future::try_join_all, tracing::debug};

use crate::{
    error::{Error, Result},
    types::{MediaAttachment, MediaData},
};

const DEFAULT_MEDIA_TYPE: &str = "image/png";

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Load every attachment's bytes, downloading URLs and reading local paths.
/// The first attachment that cannot be resolved fails the whole batch.
pub async fn fetch_media_data(
    client: &reqwest::Client,
    attachments: &[MediaAttachment],
) -> Result<Vec<MediaData>> {
    try_join_all(attachments.iter().map(|a| fetch_one(client, a))).await
}

async fn fetch_one(client: &reqwest::Client, attachment: &MediaAttachment) -> Result<MediaData> {
    let url = attachment.url.as_str();
    let data = if is_remote(url) {
        download(client, url).await?
    } else {
        read_local(url).await?
    };
    debug!(url, bytes = data.len(), "resolved media attachment");
    Ok(MediaData {
        data,
        media_type: attachment
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
    })
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::media(url, e.to_string()))?;
    if !resp.status().is_success() {
        return Err(Error::media(url, format!("HTTP {}", resp.status())));
    }
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| Error::media(url, e.to_string()))?;
    Ok(bytes.to_vec())
}

async fn read_local(path: &str) -> Result<Vec<u8>> {
    let exists = tokio::fs::try_exists(Path::new(path)).await.unwrap_or(false);
    if !exists {
        return Err(Error::media(
            path,
            "file not found, make sure the path is correct",
        ));
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::media(path, e.to_string()))
}
