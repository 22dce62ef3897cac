//! Remote services: the dump service (inbox drain + send) and the name
//! directory.
//!
//! The pipeline only sees the traits below. `http` holds the reqwest
//! clients, `lookup` the startup-time composition of directory backends.

pub mod http;
pub mod lookup;

use async_trait::async_trait;

use crate::crypto::{IdentityProof, PublicKey};
use crate::error::{LookupError, TransportError};
use crate::pipeline::types::{InboundMessage, SealedMessage};

pub use http::{HttpDumpClient, HttpLookupClient};
pub use lookup::{FallbackLookup, directory_from_config};

/// Store-and-forward inbox.
#[async_trait]
pub trait DumpService: Send + Sync {
    /// Take the next message for the identity behind `proof`.
    ///
    /// `Ok(None)` is the explicit empty-inbox signal, not an error.
    async fn receive(&self, proof: &IdentityProof) -> Result<Option<InboundMessage>, TransportError>;

    /// Deliver a sealed message.
    async fn send(&self, message: &SealedMessage) -> Result<(), TransportError>;
}

/// Name → public key directory.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup_name(&self, name: &str) -> Result<PublicKey, LookupError>;
}
