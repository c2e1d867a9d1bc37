use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::IdError;

/// Hashing algorithms a [`BlockId`] can be derived with.
///
/// Currently only SHA2-256 is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    /// The 256-bit member of the SHA-2 family.
    #[serde(rename = "sha2-256")]
    Sha2_256,
}

impl Algorithm {
    /// Canonical name, as used in the textual identifier form.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha2_256 => "sha2-256",
        }
    }

    /// Length in bytes of a digest produced by this algorithm.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha2_256 => 32,
        }
    }

    /// Hash `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        match self {
            Self::Sha2_256 => Sha256::digest(data).into(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha2-256" | "sha2_256" | "sha-256" | "sha_256" | "sha256" => Ok(Self::Sha2_256),
            other => Err(IdError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Content-derived identifier of a [`Block`](crate::Block).
///
/// A `BlockId` pairs an [`Algorithm`] with the digest of the block's content
/// under that algorithm. Identical content always produces the same
/// `BlockId`. Identifiers compare and hash by value.
///
/// The canonical textual form is `<algorithm>-<lowercase hex digest>`, e.g.
/// `sha2-256-2cf24dba…`. Parsing via [`FromStr`] is the strict inverse of
/// [`Display`](fmt::Display); the hex payload is case-insensitive on input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    algorithm: Algorithm,
    digest: [u8; 32],
}

impl BlockId {
    /// Create an identifier from an algorithm and raw digest bytes.
    ///
    /// Fails if the digest length does not match the algorithm.
    pub fn new(algorithm: Algorithm, digest: &[u8]) -> Result<Self, IdError> {
        if digest.len() != algorithm.digest_len() {
            return Err(IdError::InvalidLength {
                expected: algorithm.digest_len(),
                actual: digest.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(digest);
        Ok(Self {
            algorithm,
            digest: arr,
        })
    }

    /// Compute the identifier of `content` with the default algorithm.
    pub fn from_content(content: &[u8]) -> Self {
        Self::hash_with(Algorithm::Sha2_256, content)
    }

    /// Compute the identifier of `content` with a specific algorithm.
    pub fn hash_with(algorithm: Algorithm, content: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(content),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest[..self.algorithm.digest_len()]
    }

    /// Lowercase hex encoding of the digest (without the algorithm prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest())
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..4])
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({}-{})", self.algorithm, self.short_hex())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.to_hex())
    }
}

impl FromStr for BlockId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Algorithm names may themselves contain '-', the hex payload never does.
        let (algorithm, payload) = s
            .rsplit_once('-')
            .ok_or_else(|| IdError::MissingSeparator(s.to_string()))?;
        let algorithm: Algorithm = algorithm.parse()?;
        if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IdError::InvalidHex(payload.to_string()));
        }
        let digest = hex::decode(payload).map_err(|e| IdError::InvalidHex(e.to_string()))?;
        Self::new(algorithm, &digest)
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
