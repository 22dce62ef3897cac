//! Sign-then-verify, encrypt-then-decrypt message envelope.
//!
//! Wire layout of the sealed content:
//!
//! ```text
//! nonce (24 bytes) || XChaCha20-Poly1305 ciphertext (plaintext + 16-byte tag)
//! ```
//!
//! The symmetric key is HKDF-SHA256 over the static X25519 shared secret of
//! sender and recipient. The signature is Ed25519 by the sender over the
//! whole sealed content.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{PrivateKey, PublicKey};
use crate::error::CryptoError;

/// XChaCha20 nonce length.
const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
const TAG_LEN: usize = 16;

/// HKDF context string.
const KEY_INFO: &[u8] = b"headline-responder/envelope/v1";

/// Encrypted content plus the sender's signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub content: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Encrypt `plaintext` for `recipient` and sign the result with `sender`.
pub fn seal(
    plaintext: &[u8],
    sender: &PrivateKey,
    recipient: &PublicKey,
) -> Result<Sealed, CryptoError> {
    let key = derive_key(sender, recipient).ok_or_else(|| CryptoError::Encryption {
        reason: "recipient key yields a degenerate shared secret".into(),
    })?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption {
            reason: format!("XChaCha20-Poly1305 encryption failed: {e}"),
        })?;

    let mut content = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    content.extend_from_slice(&nonce);
    content.extend_from_slice(&ciphertext);

    let signature = sender.sign(&content).to_vec();
    Ok(Sealed { content, signature })
}

/// Verify `signature` over `content` with the sender's key, then decrypt.
///
/// `sender_name` is only used for error context.
pub fn open(
    content: &[u8],
    signature: &[u8],
    recipient: &PrivateKey,
    sender: &PublicKey,
    sender_name: &str,
) -> Result<Vec<u8>, CryptoError> {
    if !sender.verify(content, signature) {
        return Err(CryptoError::Authentication {
            sender: sender_name.to_string(),
        });
    }

    let decryption_failed = || CryptoError::Decryption {
        sender: sender_name.to_string(),
    };

    if content.len() < NONCE_LEN + TAG_LEN {
        return Err(decryption_failed());
    }
    let (nonce, ciphertext) = content.split_at(NONCE_LEN);

    let key = derive_key(recipient, sender).ok_or_else(decryption_failed)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| decryption_failed())
}

/// Returns `None` when the peer key is a low-order point.
fn derive_key(ours: &PrivateKey, theirs: &PublicKey) -> Option<Zeroizing<[u8; 32]>> {
    let shared = ours.agreement_secret().diffie_hellman(&theirs.agreement_key());
    if !shared.was_contributory() {
        return None;
    }

    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(KEY_INFO, okm.as_mut_slice()).ok()?;
    Some(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_opens_sealed_message() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();

        let sealed = seal(b"Subject: 2\r\n\r\nhi", &alice, &bob.public_key()).unwrap();
        assert_eq!(sealed.signature.len(), 64);
        assert_eq!(sealed.content.len(), NONCE_LEN + 16 + TAG_LEN);

        let opened = open(
            &sealed.content,
            &sealed.signature,
            &bob,
            &alice.public_key(),
            "alice",
        )
        .unwrap();
        assert_eq!(opened, b"Subject: 2\r\n\r\nhi");
    }

    #[test]
    fn wrong_sender_key_is_authentication_error() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();
        let mallory = PrivateKey::generate();

        let sealed = seal(b"hello", &alice, &bob.public_key()).unwrap();
        let err = open(
            &sealed.content,
            &sealed.signature,
            &bob,
            &mallory.public_key(),
            "alice",
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::Authentication { sender } if sender == "alice"));
    }

    #[test]
    fn tampered_content_fails_signature_check() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();

        let mut sealed = seal(b"hello", &alice, &bob.public_key()).unwrap();
        let last = sealed.content.len() - 1;
        sealed.content[last] ^= 0x01;

        let err = open(
            &sealed.content,
            &sealed.signature,
            &bob,
            &alice.public_key(),
            "alice",
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::Authentication { .. }));
    }

    #[test]
    fn wrong_recipient_is_decryption_error() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();
        let carol = PrivateKey::generate();

        let sealed = seal(b"hello", &alice, &bob.public_key()).unwrap();
        let err = open(
            &sealed.content,
            &sealed.signature,
            &carol,
            &alice.public_key(),
            "alice",
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::Decryption { .. }));
    }

    #[test]
    fn truncated_content_is_decryption_error() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();

        let content = vec![0u8; 10];
        let signature = alice.sign(&content);
        let err = open(&content, &signature, &bob, &alice.public_key(), "alice").unwrap_err();
        assert!(matches!(err, CryptoError::Decryption { .. }));
    }

    #[test]
    fn nonces_differ_between_seals() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();

        let a = seal(b"same", &alice, &bob.public_key()).unwrap();
        let b = seal(b"same", &alice, &bob.public_key()).unwrap();
        assert_ne!(a.content, b.content);
    }
}
