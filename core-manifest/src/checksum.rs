//! Canonical file hashing.
//!
//! SHA-256 is the single manifest algorithm; every record and every diff
//! decision uses it.

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::Result;
use std::path::Path;

/// Streaming read chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Hash a file's contents.
///
/// Returns the lowercase hex SHA-256 digest and the byte length read.
pub async fn hash_file(path: &Path) -> Result<(String, u64)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    Ok((format!("{:x}", hasher.finalize()), total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();

        let (digest, size) = hash_file(&path).await.unwrap();

        // SHA-256("abc")
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(size, 3);
    }

    #[tokio::test]
    async fn test_hash_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let (digest, size) = hash_file(&path).await.unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(size, 0);
    }

    #[tokio::test]
    async fn test_hash_missing_file_errors() {
        let result = hash_file(Path::new("/definitely/not/here.bin")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_hash_spans_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data = vec![0x5au8; CHUNK_SIZE * 2 + 17];
        std::fs::write(&path, &data).unwrap();

        let (digest, size) = hash_file(&path).await.unwrap();

        let mut hasher = Sha256::new();
        hasher.update(&data);
        assert_eq!(digest, format!("{:x}", hasher.finalize()));
        assert_eq!(size, data.len() as u64);
    }
}
