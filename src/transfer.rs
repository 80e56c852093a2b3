//! File transfer for Blender builds.
//!
//! Downloads stream to a `.part` file that is renamed on success. Progress is
//! reported as [`TransferProgress`] events keyed by an [`OperationId`], so the
//! transfer knows nothing about whatever renders it.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// User agent for build server requests
pub const USER_AGENT: &str = concat!("Blendio/", env!("CARGO_PKG_VERSION"));

/// Identifies one transfer for progress reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        OperationId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Progress of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub operation: OperationId,
    pub sent: u64,
    pub total: u64,
    pub speed: u64, // bytes/sec
}

impl TransferProgress {
    /// Progress as a fraction (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.sent as f32 / self.total as f32).min(1.0)
        }
    }

    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).floor() as u32
    }
}

pub type ProgressSink = mpsc::UnboundedSender<TransferProgress>;

#[async_trait]
pub trait Transfer: Send + Sync {
    /// Fetch `url` into `destination`, returning the number of bytes written
    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        operation: OperationId,
        progress: ProgressSink,
    ) -> Result<u64>;
}

/// HTTP transfer backed by reqwest
#[derive(Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
    progress_interval: Duration,
}

impl HttpTransfer {
    pub fn new(progress_interval_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            progress_interval: Duration::from_millis(progress_interval_ms),
        })
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        operation: OperationId,
        progress: ProgressSink,
    ) -> Result<u64> {
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to connect to download server")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Download failed with status: {} - {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown error")
            );
        }

        let total = response.content_length().unwrap_or(0);
        let _ = progress.send(TransferProgress {
            operation,
            sent: 0,
            total,
            speed: 0,
        });

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create download directory")?;
        }

        let temp_path = part_path(destination);
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .context("Failed to create temporary download file")?;

        let mut stream = response.bytes_stream();
        let mut sent: u64 = 0;
        let mut last_report = Instant::now();
        let mut last_sent: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading download stream")?;
            file.write_all(&chunk)
                .await
                .context("Failed to write to download file")?;
            sent += chunk.len() as u64;

            let elapsed = last_report.elapsed();
            if elapsed >= self.progress_interval {
                let speed = ((sent - last_sent) as f64 / elapsed.as_secs_f64()) as u64;
                let _ = progress.send(TransferProgress {
                    operation,
                    sent,
                    total,
                    speed,
                });
                last_sent = sent;
                last_report = Instant::now();
            }
        }

        file.sync_all()
            .await
            .context("Failed to sync download file")?;
        drop(file);

        tokio::fs::rename(&temp_path, destination)
            .await
            .context("Failed to finalize download")?;

        let _ = progress.send(TransferProgress {
            operation,
            sent,
            total: total.max(sent),
            speed: 0,
        });

        let elapsed = started.elapsed().as_secs_f32();
        tracing::info!(
            "Download complete: {:.1} MB in {:.1}s to {:?}",
            sent as f32 / 1_000_000.0,
            elapsed,
            destination
        );

        Ok(sent)
    }
}

/// Compare the SHA-256 of `path` against the hex digest the build server lists
pub async fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let path = path.to_path_buf();
    let expected = expected.trim().to_lowercase();

    let actual = tokio::task::spawn_blocking(move || {
        let mut file = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open {:?} for checksum", path))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = file.read(&mut buffer).context("Failed to read download")?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok::<_, anyhow::Error>(hex::encode(hasher.finalize()))
    })
    .await
    .context("Checksum task panicked")??;

    if actual != expected {
        anyhow::bail!("Checksum mismatch: expected {}, got {}", expected, actual);
    }
    Ok(())
}
