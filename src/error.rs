//! Error types for the headline responder.
//!
//! Every failure kind carries its disposition: transport, crypto and
//! directory failures are fatal to the responder loop, while document and
//! cache failures only affect the message being handled.

/// Top-level error type for the responder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl Error {
    /// Whether this error must stop the responder.
    ///
    /// Anything that could indicate a broken transport or an inconsistent
    /// cryptographic state is fatal. Per-message content problems are not.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Transport(_) | Self::Crypto(_) | Self::Lookup(_) => true,
            Self::Document(_) | Self::Cache(_) => false,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dump service RPC failures other than the empty-inbox signal.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Envelope and key failures.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Signature verification failed for message from {sender}")]
    Authentication { sender: String },

    #[error("Failed to decrypt message from {sender}")]
    Decryption { sender: String },

    #[error("Failed to encrypt message: {reason}")]
    Encryption { reason: String },

    #[error("Invalid key material: {reason}")]
    InvalidKey { reason: String },
}

/// Directory (name → public key) resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Name not found: {name}")]
    NotFound { name: String },

    #[error("Lookup of {name} failed: {reason}")]
    Request { name: String, reason: String },

    #[error("Invalid public key for {name}: {reason}")]
    InvalidKey { name: String, reason: String },
}

/// Malformed inbound documents and compose failures.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Document has no From address")]
    MissingFrom,

    #[error("Expected exactly one From address, found {count}")]
    AmbiguousFrom { count: usize },

    #[error("Failed to compose document: {0}")]
    Compose(String),
}

/// Headline cache failures.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Article {id} not found")]
    ArticleNotFound { id: u32 },

    #[error("Cache refresh failed: {0}")]
    Refresh(String),

    #[error("Headline source error: {0}")]
    Source(String),
}

/// Result type alias for the responder.
pub type Result<T> = std::result::Result<T, Error>;
