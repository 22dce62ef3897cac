//! Mail-like documents carried inside the envelope.
//!
//! Inbound: [`sanitize_headers`] drops mbox artifacts, then
//! [`parse_document`] extracts the single From address, Subject and body.
//! Outbound: [`compose`] renders an [`OutboundMessage`] as a single-part
//! UTF-8 text document.

pub mod compose;
pub mod document;
pub mod sanitize;

pub use compose::{OutboundMessage, compose};
pub use document::{Mailbox, ParsedDocument, parse_document};
pub use sanitize::sanitize_headers;
