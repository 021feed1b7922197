//! Streaming encryption of dump archives.
//!
//! Dump files are encrypted in place on disk with AES-256-CTR so they can
//! sit on untrusted storage. The IV is a fixed constant: encryption here is
//! deterministic per (key, plaintext), which keeps repeated dumps of the
//! same data byte-stable and the format self-contained. CTR mode means
//! encryption and decryption are the same keystream transform.

use std::path::Path;

use aes::Aes256;
use cipher::{KeyIvInit, StreamCipher};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Fixed 16-byte IV for the CTR keystream.
const IV: &[u8; 16] = b"mongovault.ctr.1";

/// Suffix appended to encrypted dump files.
pub const ENCRYPT_SUFFIX: &str = ".enc";

/// Transform chunk size.
const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Secret key must be exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Encrypt `source` into `destination`, removing the plaintext source on
/// success when `remove_source` is set.
pub async fn encrypt_file(
    source: &Path,
    destination: &Path,
    secret: &str,
    remove_source: bool,
) -> CryptoResult<()> {
    debug!(source = %source.display(), destination = %destination.display(), "Encrypting dump");
    transform_file(source, destination, secret).await?;
    if remove_source {
        tokio::fs::remove_file(source).await?;
    }
    info!(destination = %destination.display(), "Dump encrypted");
    Ok(())
}

/// Decrypt `source` into `destination`. The encrypted source is kept.
pub async fn decrypt_file(source: &Path, destination: &Path, secret: &str) -> CryptoResult<()> {
    info!(source = %source.display(), destination = %destination.display(), "Decrypting dump");
    transform_file(source, destination, secret).await
}

/// Apply the CTR keystream to `source`, writing the result to `destination`.
async fn transform_file(source: &Path, destination: &Path, secret: &str) -> CryptoResult<()> {
    let key = secret.as_bytes();
    let mut cipher = Aes256Ctr::new_from_slices(key, IV)
        .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;

    let mut reader = tokio::fs::File::open(source).await?;
    let mut writer = tokio::fs::File::create(destination).await?;

    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        cipher.apply_keystream(&mut buf[..n]);
        writer.write_all(&buf[..n]).await?;
    }
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[tokio::test]
    async fn test_encrypt_then_decrypt_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("dump.gz");
        let encrypted = temp_dir.path().join("dump.gz.enc");
        let decrypted = temp_dir.path().join("dump-restored.gz");

        let content = b"mongodump archive bytes".repeat(1000);
        tokio::fs::write(&plain, &content).await.unwrap();

        encrypt_file(&plain, &encrypted, SECRET, true).await.unwrap();
        assert!(!plain.exists(), "plaintext source should be removed");
        let ciphertext = tokio::fs::read(&encrypted).await.unwrap();
        assert_eq!(ciphertext.len(), content.len());
        assert_ne!(ciphertext, content);

        decrypt_file(&encrypted, &decrypted, SECRET).await.unwrap();
        assert!(encrypted.exists(), "encrypted source is kept");
        let restored = tokio::fs::read(&decrypted).await.unwrap();
        assert_eq!(restored, content);
    }

    #[tokio::test]
    async fn test_encrypt_keeps_source_when_asked() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("dump.gz");
        let encrypted = temp_dir.path().join("dump.gz.enc");
        tokio::fs::write(&plain, b"bytes").await.unwrap();

        encrypt_file(&plain, &encrypted, SECRET, false)
            .await
            .unwrap();
        assert!(plain.exists());
    }

    #[tokio::test]
    async fn test_invalid_key_length_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("dump.gz");
        tokio::fs::write(&plain, b"bytes").await.unwrap();

        let err = encrypt_file(&plain, &temp_dir.path().join("out.enc"), "short", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyLength(5)));
        assert!(plain.exists(), "source must survive a failed encryption");
    }
}
