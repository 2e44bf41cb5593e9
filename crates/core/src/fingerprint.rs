//! BLAKE3 fingerprints for configuration change detection

use anyhow::Result;
use serde_json::Value;

/// A BLAKE3 digest (32 bytes) of a configuration document
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint raw bytes
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Fingerprint a JSON document
    ///
    /// `serde_json` maps are key-ordered, so two documents with the same
    /// content always serialize (and hash) identically.
    pub fn of_json(value: &Value) -> Self {
        let mut hasher = blake3::Hasher::new();
        // Writing into a hasher cannot fail
        let _ = serde_json::to_writer(HashWriter(&mut hasher), value);
        Self(*hasher.finalize().as_bytes())
    }

    /// Lowercase hex form, as persisted by `hearth sync`
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// Parse the form written by [`Fingerprint::to_hex`]
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hash = blake3::Hash::from_hex(hex.trim())
            .map_err(|e| anyhow::anyhow!("Invalid fingerprint {:?}: {}", hex, e))?;
        Ok(Self(*hash.as_bytes()))
    }
}

/// Adapter feeding `io::Write` output straight into a hasher
struct HashWriter<'a>(&'a mut blake3::Hasher);

impl std::io::Write for HashWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
