//! Streaming download of the helper archive.

use crate::core::UpdateError;
use crate::utils::progress::StepProgress;
use anyhow::{Context, Result};
use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fetch `url` into a new temporary file.
///
/// Progress is reported as transferred / total bytes; without a `Content-Length`
/// it stays at `0` until the transfer completes. The temporary file is deleted
/// when the returned handle is dropped.
///
/// # Errors
///
/// Any connection failure, non-success status or broken body stream is reported
/// as [`UpdateError::Transport`]. Nothing is retried.
pub async fn download_archive(
    url: &str,
    user_agent: &str,
    progress: &mut StepProgress,
) -> Result<NamedTempFile> {
    let transport = |reason: String| UpdateError::Transport {
        url: url.to_string(),
        reason,
    };

    progress.start();
    info!("Downloading update helper from {}", url);

    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| transport(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| transport(e.to_string()))?;

    let total = response.content_length();
    let archive = NamedTempFile::new().context("Failed to create temporary archive file")?;
    let mut file = tokio::fs::File::from_std(
        archive.as_file().try_clone().context("Failed to open temporary archive file")?,
    );

    let mut stream = response.bytes_stream();
    let mut transferred: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| transport(e.to_string()))?;
        file.write_all(&chunk).await.with_context(|| {
            format!("Failed to write archive to {}", archive.path().display())
        })?;
        transferred += chunk.len() as u64;
        progress.ratio(transferred, total);
    }
    file.flush().await?;
    file.sync_all().await?;

    debug!("Downloaded {} bytes to {}", transferred, archive.path().display());
    progress.finish();

    Ok(archive)
}
