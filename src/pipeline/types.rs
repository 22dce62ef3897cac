//! Shared types for the responder pipeline.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crypto::{IdentityProof, PrivateKey};

// ── Identity ────────────────────────────────────────────────────────

/// A configured identity whose inbox the responder drains.
///
/// The proof is generated once, when the identity is created, and is
/// attached to every receive call for the life of the process.
#[derive(Debug)]
pub struct Identity {
    pub name: String,
    pub key: PrivateKey,
    pub proof: IdentityProof,
}

impl Identity {
    /// Create an identity and sign its proof at `now`.
    pub fn new(name: impl Into<String>, key: PrivateKey, now: DateTime<Utc>) -> Self {
        let proof = IdentityProof::generate(&key, now);
        Self {
            name: name.into(),
            key,
            proof,
        }
    }

    /// `name@domain` address used as the From of digest replies.
    pub fn address(&self, domain: &str) -> String {
        format!("{}@{}", self.name, domain)
    }
}

// ── Inbound message ─────────────────────────────────────────────────

/// One encrypted message drained from the dump service.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Locally generated id for log correlation.
    pub id: Uuid,
    /// Directory name of the sender.
    pub sender: String,
    /// Sealed content (nonce + ciphertext).
    pub content: Vec<u8>,
    /// Sender's signature over `content`.
    pub signature: Vec<u8>,
}

impl InboundMessage {
    pub fn new(sender: impl Into<String>, content: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            content,
            signature,
        }
    }
}

// ── Sealed outbound message ─────────────────────────────────────────

/// An encrypted, signed reply ready for the dump service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// Directory name of the sending identity.
    pub sender: String,
    /// Directory name of the addressee.
    pub receiver: String,
    pub content: Vec<u8>,
    pub signature: Vec<u8>,
}

// ── Intent ──────────────────────────────────────────────────────────

/// What the sender asked for, derived from the Subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// List of current headlines.
    Digest,
    /// Full text of one article.
    ArticleRequest(u32),
}

impl Intent {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Digest => "digest",
            Self::ArticleRequest(_) => "article",
        }
    }
}

// ── Outcomes ────────────────────────────────────────────────────────

/// Result of handling one inbound message that did not fail fatally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A reply was sealed and handed to the dump service.
    Replied { intent: Intent, receiver: String },
    /// The message was dropped without a reply.
    Skipped { reason: String },
}

/// Summary of one drain of a single identity's inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub identity: String,
    pub received: usize,
    pub replied: usize,
    pub skipped: usize,
}

impl DrainReport {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &MessageOutcome) {
        self.received += 1;
        match outcome {
            MessageOutcome::Replied { .. } => self.replied += 1,
            MessageOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}
