//! Headline responder: answers encrypted mail requests with a news digest
//! or a full article.

pub mod config;
pub mod crypto;
pub mod error;
pub mod mail;
pub mod news;
pub mod pipeline;
pub mod shutdown;
pub mod transport;
