//! Ed25519 identity keys and their X25519 agreement counterparts.
//!
//! Key files hold a base64-encoded 32-byte seed. The identity name is taken
//! from the file name, which must have the shape `name.ext`.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{ConfigError, CryptoError};

// ── PrivateKey ──────────────────────────────────────────────────────

/// Long-lived identity key. Zeroized on drop by `ed25519-dalek`.
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a fresh key from OS entropy.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstruct a key from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Decode a base64 seed, as stored in key files.
    pub fn from_base64_seed(encoded: &str) -> Result<Self, CryptoError> {
        let mut raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey {
                reason: format!("seed is not valid base64: {e}"),
            })?;
        let result = <[u8; 32]>::try_from(raw.as_slice())
            .map(|seed| Self::from_seed(&seed))
            .map_err(|_| CryptoError::InvalidKey {
                reason: format!("seed must be 32 bytes, got {}", raw.len()),
            });
        raw.zeroize();
        result
    }

    /// Encode the seed as base64 (key file format).
    pub fn to_base64_seed(&self) -> String {
        let mut seed = self.signing_key.to_bytes();
        let encoded = BASE64.encode(seed);
        seed.zeroize();
        encoded
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Sign `message`, returning the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// X25519 secret derived from the Ed25519 seed: the lower half of
    /// `SHA-512(seed)`, clamped by `x25519-dalek` on use.
    pub(crate) fn agreement_secret(&self) -> x25519_dalek::StaticSecret {
        let mut seed = self.signing_key.to_bytes();
        let digest = Sha512::digest(seed);
        seed.zeroize();

        let mut hash = [0u8; 64];
        hash.copy_from_slice(&digest);

        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&hash[..32]);
        hash.zeroize();

        let secret = x25519_dalek::StaticSecret::from(scalar);
        scalar.zeroize();
        secret
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

// ── PublicKey ───────────────────────────────────────────────────────

/// Ed25519 public key as published in the directory.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Fixed byte length of a serialized public key.
    pub const LEN: usize = 32;

    /// Parse a serialized public key, rejecting points not on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKey {
            reason: format!("public key must be {} bytes, got {}", Self::LEN, bytes.len()),
        })?;
        VerifyingKey::from_bytes(&raw)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey {
                reason: e.to_string(),
            })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.as_bytes())
    }

    /// Check an Ed25519 signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.0.verify(message, &signature).is_ok()
    }

    /// Montgomery form of the key, used for X25519 agreement.
    pub(crate) fn agreement_key(&self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0.to_montgomery().to_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

// ── Key files ───────────────────────────────────────────────────────

/// Load an identity key file, returning `(name, key)`.
pub fn load_key_file(path: &Path) -> Result<(String, PrivateKey), ConfigError> {
    let path = resolve_key_path(path)?;
    let name = identity_name(&path)?;

    let contents = std::fs::read_to_string(&path)?;
    let key = PrivateKey::from_base64_seed(&contents).map_err(|e| ConfigError::InvalidValue {
        key: path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(name = %name, file = %path.display(), "Loaded key");
    Ok((name, key))
}

/// Relative key paths are resolved against the executable's directory.
pub fn resolve_key_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let exe = std::env::current_exe()?;
    let dir = exe.parent().ok_or_else(|| ConfigError::InvalidValue {
        key: path.display().to_string(),
        message: "cannot determine executable directory".into(),
    })?;
    Ok(dir.join(path))
}

/// Identity name from a `name.ext` key file path.
pub fn identity_name(path: &Path) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: path.display().to_string(),
        message: "cannot parse key file name, expected <name>.<ext>".into(),
    };

    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let parts: Vec<&str> = file_name.split('.').collect();
    match parts.as_slice() {
        [name, ext] if !name.is_empty() && !ext.is_empty() => Ok((*name).to_string()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn seed_roundtrip_preserves_public_key() {
        let key = PrivateKey::generate();
        let restored = PrivateKey::from_base64_seed(&key.to_base64_seed()).unwrap();
        assert_eq!(key.public_key(), restored.public_key());
    }

    #[test]
    fn short_seed_rejected() {
        let err = PrivateKey::from_base64_seed(&BASE64.encode([1u8; 16])).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey { .. }));
        assert!(PrivateKey::from_base64_seed("not base64!").is_err());
    }

    #[test]
    fn signature_verifies_only_for_signed_message() {
        let key = PrivateKey::from_seed(&[7u8; 32]);
        let sig = key.sign(b"hello");
        assert!(key.public_key().verify(b"hello", &sig));
        assert!(!key.public_key().verify(b"hullo", &sig));
        assert!(!key.public_key().verify(b"hello", &sig[..10]));
    }

    #[test]
    fn public_key_length_checked() {
        assert!(PublicKey::from_bytes(&[0u8; 31]).is_err());
        let key = PrivateKey::generate();
        let parsed = PublicKey::from_bytes(key.public_key().as_bytes()).unwrap();
        assert_eq!(parsed, key.public_key());
    }

    #[test]
    fn agreement_keys_match_across_parties() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();

        let ab = alice
            .agreement_secret()
            .diffie_hellman(&bob.public_key().agreement_key());
        let ba = bob
            .agreement_secret()
            .diffie_hellman(&alice.public_key().agreement_key());
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn identity_name_requires_two_parts() {
        assert_eq!(identity_name(Path::new("/keys/news.key")).unwrap(), "news");
        assert!(identity_name(Path::new("/keys/news")).is_err());
        assert!(identity_name(Path::new("/keys/news.key.bak")).is_err());
        assert!(identity_name(Path::new("/keys/.key")).is_err());
    }

    #[test]
    fn load_key_file_reads_seed_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warinfo.key");
        let key = PrivateKey::generate();
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", key.to_base64_seed()).unwrap();

        let (name, loaded) = load_key_file(&path).unwrap();
        assert_eq!(name, "warinfo");
        assert_eq!(loaded.public_key(), key.public_key());
    }

    #[test]
    fn load_key_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.key");
        std::fs::write(&path, "garbage").unwrap();
        assert!(matches!(
            load_key_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
