// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-compression collaborator invoked by the periodic compression sweep.
//! The exact segment format is out of scope; this only fixes the
//! compress-one-file shape the sweep needs.

use std::io::{self, Read, Write};
use std::path::Path;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;

#[async_trait]
pub trait WalCompressor: Send + Sync {
    /// Compress `src` into `dst` and remove `src` on success. Called once
    /// per closed segment found during a sweep; errors are logged by the
    /// caller and do not abort the rest of the sweep.
    async fn compress_file(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// Gzip compressor used when the region's compression policy is `GZIP`.
#[derive(Debug, Default)]
pub struct GzipCompressor;

#[async_trait]
impl WalCompressor for GzipCompressor {
    async fn compress_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        let src = src.to_path_buf();
        let dst = dst.to_path_buf();
        tokio::task::spawn_blocking(move || gzip_file(&src, &dst))
            .await
            .map_err(|e| io::Error::other(e.to_string()))?
    }
}

fn gzip_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = std::fs::File::open(src)?;
    let output = std::fs::File::create(dst)?;
    let mut encoder = GzEncoder::new(output, Compression::default());

    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buf[..n])?;
    }
    encoder.finish()?;
    std::fs::remove_file(src)?;
    Ok(())
}

/// Compressor used when the region's compression policy is `NONE`; the
/// periodic scheduler does not arm the sweep at all in that case, so this
/// exists mainly for tests and direct callers that bypass the scheduler.
#[derive(Debug, Default)]
pub struct NoopCompressor;

#[async_trait]
impl WalCompressor for NoopCompressor {
    async fn compress_file(&self, _src: &Path, _dst: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gzip_compressor_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("000000010000000000000001");
        let dst = dir.path().join("000000010000000000000001.gz");
        std::fs::write(&src, b"wal segment contents").unwrap();

        let compressor = GzipCompressor;
        compressor.compress_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert!(dst.exists());
        assert!(std::fs::metadata(&dst).unwrap().len() > 0);
    }
}
