use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::HashError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn all() -> Vec<Algorithm> {
        vec![Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha256, Algorithm::Sha512]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "MD5",
            Algorithm::Sha1 => "SHA-1",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha512 => "SHA-512",
        }
    }

    /// Native digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Sha1 => 20,
            Algorithm::Sha256 => 32,
            Algorithm::Sha512 => 64,
        }
    }

    /// Length of the rendered digest in hex characters.
    pub fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Algorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha1" | "sha-1" => Ok(Algorithm::Sha1),
            "sha256" | "sha-256" => Ok(Algorithm::Sha256),
            "sha512" | "sha-512" => Ok(Algorithm::Sha512),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Lifecycle of a hashing unit. `Incomplete` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashStatus {
    Incomplete,
    Success,
    FileError,
}

impl HashStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HashStatus::Incomplete)
    }

    /// Text shown in place of a digest.
    pub fn label(&self) -> &'static str {
        match self {
            HashStatus::Incomplete => "hashing cancelled",
            HashStatus::Success => "success",
            HashStatus::FileError => "file read error",
        }
    }
}

impl fmt::Display for HashStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashRecord {
    pub id: String,
    pub file_name: String,
    pub file_path: PathBuf,
    pub algorithm: Algorithm,
    pub status: HashStatus,
    pub digest: Option<String>,
    pub error: Option<String>,
    pub total_bytes: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl HashRecord {
    /// Digest, or the status label when there is none.
    pub fn display_result(&self) -> &str {
        self.digest.as_deref().unwrap_or_else(|| self.status.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_spellings() {
        assert_eq!("md5".parse::<Algorithm>().unwrap(), Algorithm::Md5);
        assert_eq!("SHA-1".parse::<Algorithm>().unwrap(), Algorithm::Sha1);
        assert_eq!(" sha256 ".parse::<Algorithm>().unwrap(), Algorithm::Sha256);
        assert_eq!("Sha512".parse::<Algorithm>().unwrap(), Algorithm::Sha512);
        assert!(matches!(
            "blake3".parse::<Algorithm>(),
            Err(HashError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn hex_lengths() {
        let lens: Vec<usize> = Algorithm::all().iter().map(Algorithm::hex_len).collect();
        assert_eq!(lens, vec![32, 40, 64, 128]);
    }

    #[test]
    fn only_incomplete_is_open() {
        assert!(!HashStatus::Incomplete.is_terminal());
        assert!(HashStatus::Success.is_terminal());
        assert!(HashStatus::FileError.is_terminal());
    }
}
