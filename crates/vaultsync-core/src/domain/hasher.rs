//! Content fingerprinting
//!
//! The fingerprint is the only equality test between a local file and its
//! remote counterpart. Modification times are never compared.

use sha2::{Digest, Sha256};

use super::newtypes::Fingerprint;

/// Computes SHA-256 fingerprints over exact content bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Fingerprint a complete buffer
    #[must_use]
    pub fn fingerprint(content: &[u8]) -> Fingerprint {
        Fingerprint::from_digest_hex(format!("{:x}", Sha256::digest(content)))
    }
}
