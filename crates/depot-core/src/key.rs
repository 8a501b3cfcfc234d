//! Content-addressed blob keys.
//!
//! A [`BlobKey`] is the SHA-1 digest of a blob's contents. The key doubles
//! as the blob's identity in the store and its end-to-end integrity check:
//! whoever receives a blob can recompute the digest and compare.

use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{hex, Error};

/// Size of a blob key in bytes (SHA-1 output width).
pub const BLOB_KEY_SIZE: usize = 20;

/// A 20-byte content digest identifying a blob.
///
/// Ordering is unsigned lexicographic over the raw bytes. The human-readable
/// form is 40 lowercase hex characters.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct BlobKey(#[serde(serialize_with = "serialize_hex")] [u8; BLOB_KEY_SIZE]);

impl BlobKey {
    /// Constructs a key from a byte slice.
    ///
    /// Fails unless the slice is exactly [`BLOB_KEY_SIZE`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; BLOB_KEY_SIZE] =
            bytes.try_into().map_err(|_| Error::InvalidKeySize {
                expected: BLOB_KEY_SIZE,
                got: bytes.len(),
            })?;
        Ok(Self(bytes))
    }

    /// The all-zero key, representing "no key chosen yet".
    ///
    /// No real blob hashes to zero, so a get against this key misses.
    pub fn zero() -> Self {
        Self::default()
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; BLOB_KEY_SIZE] {
        &self.0
    }

    /// Reads a key from the wire: exactly [`BLOB_KEY_SIZE`] raw bytes.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; BLOB_KEY_SIZE];
        reader.read_exact(&mut bytes).await?;
        Ok(Self(bytes))
    }

    /// Writes the key to the wire as raw bytes.
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.0).await
    }

    /// Feeds the key bytes into a running digest.
    pub fn update_digest(&self, md: &mut Sha1) {
        md.update(self.0);
    }
}

impl From<[u8; BLOB_KEY_SIZE]> for BlobKey {
    fn from(bytes: [u8; BLOB_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        hex::encode(&self.0, f)
    }
}

impl std::fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlobKey({})", self)
    }
}

impl std::str::FromStr for BlobKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let mut bytes = [0u8; BLOB_KEY_SIZE];
        hex::decode(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

fn serialize_hex<S: serde::Serializer>(
    bytes: &[u8; BLOB_KEY_SIZE],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut s = String::with_capacity(BLOB_KEY_SIZE * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    serializer.serialize_str(&s)
}

impl<'de> serde::Deserialize<'de> for BlobKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
