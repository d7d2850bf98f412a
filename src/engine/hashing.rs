//! File hashing utilities

use md5::Digest as _;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::utils::config::HashingConsts;
use crate::{Digest, DigestAlgorithm};

/// Incremental hasher for either supported algorithm.
enum FileHasher {
    Md5(md5::Md5),
    Blake3(Box<blake3::Hasher>),
}

impl FileHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => FileHasher::Md5(md5::Md5::new()),
            DigestAlgorithm::Blake3 => FileHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            FileHasher::Md5(h) => h.update(bytes),
            FileHasher::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            FileHasher::Md5(h) => Digest::Md5(h.finalize().into()),
            FileHasher::Blake3(h) => Digest::Blake3(*h.finalize().as_bytes()),
        }
    }
}

/// Digest the full content of `path`. Uses memory-mapped I/O for files above threshold,
/// chunked reading otherwise. Any I/O error is returned as is.
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> io::Result<Digest> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut hasher = FileHasher::new(algorithm);

    if size > HashingConsts::HASH_MMAP_THRESHOLD {
        let mmap = unsafe { Mmap::map(&file)? };
        hasher.update(&mmap);
    } else {
        let mut reader = io::BufReader::with_capacity(HashingConsts::HASH_READ_CHUNK_SIZE, file);
        let mut buffer = vec![0u8; HashingConsts::HASH_READ_CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
        }
    }

    Ok(hasher.finalize())
}

/// Digest an in-memory buffer. Same result as [`hash_file`] on a file with these bytes.
pub fn hash_bytes(bytes: &[u8], algorithm: DigestAlgorithm) -> Digest {
    let mut hasher = FileHasher::new(algorithm);
    hasher.update(bytes);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn md5_known_vectors() {
        assert_eq!(
            hash_bytes(b"", DigestAlgorithm::Md5).to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hash_bytes(b"hello", DigestAlgorithm::Md5).to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            hash_bytes(b"world", DigestAlgorithm::Md5).to_hex(),
            "7d793037a0760186574b0282f2f435e7"
        );
    }

    #[test]
    fn blake3_known_vector() {
        assert_eq!(
            hash_bytes(b"", DigestAlgorithm::Blake3).to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn file_matches_bytes_and_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("data.bin");
        // spans several read chunks
        let body: Vec<u8> = (0..(HashingConsts::HASH_READ_CHUNK_SIZE * 2 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        fs::write(&p, &body).unwrap();
        for algo in [DigestAlgorithm::Md5, DigestAlgorithm::Blake3] {
            let a = hash_file(&p, algo).unwrap();
            let b = hash_file(&p, algo).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, hash_bytes(&body, algo));
            assert_eq!(a.algorithm(), algo);
            assert_eq!(a.as_bytes().len(), algo.output_len());
        }
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = hash_file(&dir.path().join("nope"), DigestAlgorithm::Md5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
