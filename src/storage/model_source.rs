//! Locating or fetching the model file
//!
//! Three strategies are supported: a local file that must already exist, a
//! download when the file is missing, and a download decided by an HTTP HEAD
//! probe comparing the remote size with the local one.

use crate::storage::huggingface::resolve_model_url;
use reqwest::header::CONTENT_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Model file not found: {0}")]
    Missing(String),
    #[error("Invalid model URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Download incomplete: got {got} bytes, expected {expected}")]
    Incomplete { got: u64, expected: u64 },
}

/// Where the model comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ModelSource {
    /// Use the file at `path`; never download
    Local { path: PathBuf },
    /// Download `url` to `path` unless a non-empty file is already there
    DownloadIfMissing { path: PathBuf, url: String },
    /// HEAD `url` first and download unless the local size matches
    ProbeThenDownload { path: PathBuf, url: String },
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::DownloadIfMissing {
            path: PathBuf::from("models/llama-2-7b-chat.gguf"),
            url: "TheBloke/Llama-2-7B-Chat-GGUF/llama-2-7b-chat.Q4_K_M.gguf".to_string(),
        }
    }
}

impl ModelSource {
    pub fn path(&self) -> &Path {
        match self {
            ModelSource::Local { path }
            | ModelSource::DownloadIfMissing { path, .. }
            | ModelSource::ProbeThenDownload { path, .. } => path,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ModelSource::Local { .. } => None,
            ModelSource::DownloadIfMissing { url, .. }
            | ModelSource::ProbeThenDownload { url, .. } => Some(url),
        }
    }
}

/// Make sure the model file is available locally and return its path.
///
/// `progress` receives `(downloaded, total)` after every chunk written.
pub async fn ensure_model(
    source: &ModelSource,
    progress: impl FnMut(u64, Option<u64>),
) -> Result<PathBuf, DownloadError> {
    let client = http_client()?;
    ensure_model_with(&client, source, progress).await
}

/// Same as [`ensure_model`] with a caller-provided HTTP client
pub async fn ensure_model_with(
    client: &reqwest::Client,
    source: &ModelSource,
    progress: impl FnMut(u64, Option<u64>),
) -> Result<PathBuf, DownloadError> {
    match source {
        ModelSource::Local { path } => {
            if local_size(path).await.unwrap_or(0) > 0 {
                Ok(path.clone())
            } else {
                Err(DownloadError::Missing(path.display().to_string()))
            }
        }
        ModelSource::DownloadIfMissing { path, url } => {
            if local_size(path).await.unwrap_or(0) > 0 {
                tracing::info!("Model already exists: {}", path.display());
                return Ok(path.clone());
            }
            let url = resolve_model_url(url)?;
            download_file(client, &url, path, progress).await?;
            Ok(path.clone())
        }
        ModelSource::ProbeThenDownload { path, url } => {
            let url = resolve_model_url(url)?;
            let remote = probe(client, &url).await?;

            if let Some(local) = local_size(path).await {
                let up_to_date = match remote {
                    Some(remote) => remote == local,
                    None => local > 0,
                };
                if up_to_date {
                    tracing::info!("Model is up to date: {}", path.display());
                    return Ok(path.clone());
                }
                tracing::info!(
                    "Local model has {} bytes, remote has {:?}; downloading again",
                    local,
                    remote
                );
            }

            download_file(client, &url, path, progress).await?;
            Ok(path.clone())
        }
    }
}

pub fn http_client() -> Result<reqwest::Client, DownloadError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(3600)) // multi-GB models
        .user_agent(concat!("LlamaFaq/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

async fn local_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// Send a HEAD request and return the advertised size
pub async fn probe(client: &reqwest::Client, url: &str) -> Result<Option<u64>, DownloadError> {
    let response = client.head(url).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    // content_length() reports the (empty) body of a HEAD response, read the header
    let size = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    tracing::debug!("HEAD {} -> {:?} bytes", url, size);
    Ok(size)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Stream `url` into `dest`, going through a `.part` file
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    mut progress: impl FnMut(u64, Option<u64>),
) -> Result<u64, DownloadError> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    tracing::info!("Downloading from: {}", url);
    let mut response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let total = response.content_length();
    if let Some(total) = total {
        tracing::info!("File size: {} bytes ({} MB)", total, total / 1024 / 1024);
    }

    let part = part_path(dest);
    let mut file = File::create(&part).await?;
    let mut downloaded = 0u64;

    let written: Result<(), DownloadError> = async {
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                // the connection closed before the advertised length arrived
                Err(e) => match total.filter(|&expected| downloaded < expected) {
                    Some(expected) => {
                        tracing::warn!("Download cut short: {}", e);
                        return Err(DownloadError::Incomplete {
                            got: downloaded,
                            expected,
                        });
                    }
                    None => return Err(e.into()),
                },
            };
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress(downloaded, total);
        }
        file.flush().await?;
        Ok::<(), DownloadError>(())
    }
    .await;
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&part).await;
        return Err(e);
    }
    if let Some(expected) = total.filter(|&t| t != downloaded) {
        let _ = fs::remove_file(&part).await;
        return Err(DownloadError::Incomplete {
            got: downloaded,
            expected,
        });
    }

    if fs::metadata(dest).await.is_ok() {
        fs::remove_file(dest).await?;
    }
    fs::rename(&part, dest).await?;
    tracing::info!("Download complete: {}", dest.display());
    Ok(downloaded)
}
