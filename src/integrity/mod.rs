//! Subresource integrity digests for output files

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::{debug, warn};

use crate::utils::{normalize_separators, strip_query};

/// Hash algorithms accepted by browsers for integrity checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl IntegrityAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityAlgorithm::Sha256 => "sha256",
            IntegrityAlgorithm::Sha384 => "sha384",
            IntegrityAlgorithm::Sha512 => "sha512",
        }
    }

    /// `<algorithm>-<base64 digest>` for the given bytes
    pub fn digest(&self, content: &[u8]) -> String {
        let hash = match self {
            IntegrityAlgorithm::Sha256 => STANDARD.encode(Sha256::digest(content)),
            IntegrityAlgorithm::Sha384 => STANDARD.encode(Sha384::digest(content)),
            IntegrityAlgorithm::Sha512 => STANDARD.encode(Sha512::digest(content)),
        };
        format!("{}-{}", self.as_str(), hash)
    }
}

impl fmt::Display for IntegrityAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrityAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(IntegrityAlgorithm::Sha256),
            "sha384" => Ok(IntegrityAlgorithm::Sha384),
            "sha512" => Ok(IntegrityAlgorithm::Sha512),
            other => Err(format!("unsupported integrity algorithm '{}'", other)),
        }
    }
}

/// Space-joined digests of `content`, one per algorithm, in the given order
pub fn integrity_of(content: &[u8], algorithms: &[IntegrityAlgorithm]) -> String {
    algorithms
        .iter()
        .map(|algorithm| algorithm.digest(content))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Computes digests of on-disk output files, hashing each path once per cycle
#[derive(Debug, Default)]
pub struct IntegrityComputer {
    algorithms: Vec<IntegrityAlgorithm>,

    /// Normalized output path -> digest string
    cache: HashMap<String, String>,
}

impl IntegrityComputer {
    pub fn new(algorithms: Vec<IntegrityAlgorithm>) -> Self {
        Self {
            algorithms,
            cache: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.algorithms.is_empty()
    }

    /// Forget every digest; called at the start of each emit cycle
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Digest string for an output-relative path.
    ///
    /// `None` when no algorithm is configured or the file is not on disk.
    pub fn compute(&mut self, output_path: &Path, path: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        let key = normalize_separators(strip_query(path));
        if let Some(digest) = self.cache.get(&key) {
            return Some(digest.clone());
        }

        let file = output_path.join(&key);
        let content = match fs::read(&file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No file on disk for {}, skipping integrity", file.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read {} for integrity: {}", file.display(), e);
                return None;
            }
        };

        let digest = integrity_of(&content, &self.algorithms);
        self.cache.insert(key, digest.clone());
        Some(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // echo -n "" | openssl dgst -sha256 -binary | base64
        assert_eq!(
            IntegrityAlgorithm::Sha256.digest(b""),
            "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_multiple_algorithms_are_space_joined() {
        let digest = integrity_of(b"body{}", &[IntegrityAlgorithm::Sha256, IntegrityAlgorithm::Sha384]);
        let parts: Vec<&str> = digest.split(' ').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("sha256-"));
        assert!(parts[1].starts_with("sha384-"));
    }

    #[test]
    fn test_same_content_same_digest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("b.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("c.js"), "console.log(2)").unwrap();

        let mut computer = IntegrityComputer::new(vec![IntegrityAlgorithm::Sha384]);
        let a = computer.compute(dir.path(), "a.js").unwrap();
        let b = computer.compute(dir.path(), "b.js").unwrap();
        let c = computer.compute(dir.path(), "c.js").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cache_and_query_strings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.js"), "old").unwrap();

        let mut computer = IntegrityComputer::new(vec![IntegrityAlgorithm::Sha256]);
        let first = computer.compute(dir.path(), "main.js?v=1").unwrap();

        // Cached by normalized path: the rewrite is not seen until the cache is cleared
        fs::write(dir.path().join("main.js"), "new").unwrap();
        assert_eq!(computer.compute(dir.path(), "main.js").unwrap(), first);
        assert_eq!(computer.cached(), 1);

        computer.clear();
        assert_ne!(computer.compute(dir.path(), "main.js").unwrap(), first);
    }

    #[test]
    fn test_missing_file_and_disabled() {
        let dir = tempfile::tempdir().unwrap();

        let mut computer = IntegrityComputer::new(vec![IntegrityAlgorithm::Sha256]);
        assert_eq!(computer.compute(dir.path(), "missing.js"), None);
        assert_eq!(computer.cached(), 0);

        fs::write(dir.path().join("main.js"), "x").unwrap();
        let mut disabled = IntegrityComputer::new(Vec::new());
        assert!(!disabled.is_enabled());
        assert_eq!(disabled.compute(dir.path(), "main.js"), None);
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("SHA384".parse::<IntegrityAlgorithm>(), Ok(IntegrityAlgorithm::Sha384));
        assert!("md5".parse::<IntegrityAlgorithm>().is_err());
    }
}
