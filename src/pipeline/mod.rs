//! Responder pipeline.
//!
//! Every configured identity's inbox is drained on a fixed interval:
//! 1. `poller` receives messages from the dump service until it is empty
//! 2. `Dispatcher::handle()` opens, parses and classifies each one
//! 3. `intent` maps the Subject to a digest or an article request
//! 4. `router` picks the directory name the reply is sealed for
//!
//! Per-message content problems are skipped. Transport and crypto failures
//! stop the loop and surface to the caller.

pub mod dispatcher;
pub mod intent;
pub mod poller;
pub mod router;
pub mod types;

pub use dispatcher::{Dispatcher, build_digest_body};
pub use intent::classify_subject;
pub use poller::{Responder, drain_inbox, spawn_responder};
pub use router::{GATEWAY, reply_recipient};
pub use types::{DrainReport, Identity, InboundMessage, Intent, MessageOutcome, SealedMessage};
