//! Key material, identity proofs and the message envelope.
//!
//! Identities hold Ed25519 signing keys. Key agreement for the envelope
//! uses X25519 keys derived from the same Ed25519 material, so a single
//! published public key serves both for signature checks and encryption.

pub mod envelope;
pub mod keys;
pub mod proof;

pub use envelope::{Sealed, open, seal};
pub use keys::{PrivateKey, PublicKey, load_key_file};
pub use proof::IdentityProof;
