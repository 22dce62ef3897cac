//! Identity proofs presented to the dump service on every receive call.

use chrono::{DateTime, Utc};

use super::keys::{PrivateKey, PublicKey};

/// Signed attestation binding a public key to a creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProof {
    pub public_key: PublicKey,
    pub created_at: DateTime<Utc>,
    pub signature: [u8; 64],
}

impl IdentityProof {
    /// Sign a proof for `key` at time `now`.
    pub fn generate(key: &PrivateKey, now: DateTime<Utc>) -> Self {
        let public_key = key.public_key();
        let signature = key.sign(&signed_payload(&public_key, now));
        Self {
            public_key,
            created_at: now,
            signature,
        }
    }

    /// Check the proof's signature against its own public key.
    pub fn verify(&self) -> bool {
        self.public_key
            .verify(&signed_payload(&self.public_key, self.created_at), &self.signature)
    }
}

/// `public_key || created_at` (unix seconds, big-endian).
fn signed_payload(public_key: &PublicKey, created_at: DateTime<Utc>) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PublicKey::LEN + 8);
    payload.extend_from_slice(public_key.as_bytes());
    payload.extend_from_slice(&created_at.timestamp().to_be_bytes());
    payload
}
