//! Per-message handling: open → parse → classify → reply.
//!
//! Flow for one inbound message:
//! 1. Resolve the sender's key and open the envelope (fatal on failure)
//! 2. Sanitize and parse the document (skip on failure)
//! 3. Classify the Subject into an [`Intent`]
//! 4. Build the reply: article from the cache (skip if missing) or digest
//! 5. Compose, seal for the routed recipient and send (send failures fatal)

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::intent::classify_subject;
use super::router::reply_recipient;
use super::types::{Identity, InboundMessage, Intent, MessageOutcome, SealedMessage};
use crate::config::ReplyTemplate;
use crate::crypto;
use crate::error::Result;
use crate::mail::{Mailbox, OutboundMessage, compose, parse_document};
use crate::news::{Headline, HeadlineCache};
use crate::transport::{DumpService, LookupService};

/// Turns inbound requests into sealed replies.
pub struct Dispatcher {
    dump: Arc<dyn DumpService>,
    directory: Arc<dyn LookupService>,
    cache: Arc<dyn HeadlineCache>,
    template: ReplyTemplate,
    mail_domain: String,
}

impl Dispatcher {
    pub fn new(
        dump: Arc<dyn DumpService>,
        directory: Arc<dyn LookupService>,
        cache: Arc<dyn HeadlineCache>,
        template: ReplyTemplate,
        mail_domain: impl Into<String>,
    ) -> Self {
        Self {
            dump,
            directory,
            cache,
            template,
            mail_domain: mail_domain.into(),
        }
    }

    /// Handle one message received by `identity`.
    ///
    /// Recoverable failures (bad document, missing article, uncomposable
    /// reply) come back as [`MessageOutcome::Skipped`]. Anything returned as
    /// `Err` is fatal.
    pub async fn handle(
        &self,
        identity: &Identity,
        message: &InboundMessage,
    ) -> Result<MessageOutcome> {
        match self.respond(identity, message).await {
            Err(e) if !e.is_fatal() => {
                warn!(
                    id = %message.id,
                    sender = %message.sender,
                    error = %e,
                    "Skipping message"
                );
                Ok(MessageOutcome::Skipped {
                    reason: e.to_string(),
                })
            }
            other => other,
        }
    }

    async fn respond(
        &self,
        identity: &Identity,
        message: &InboundMessage,
    ) -> Result<MessageOutcome> {
        let sender_key = self.directory.lookup_name(&message.sender).await?;
        let plaintext = crypto::open(
            &message.content,
            &message.signature,
            &identity.key,
            &sender_key,
            &message.sender,
        )?;

        let document = parse_document(&plaintext)?;
        let intent = classify_subject(&document.subject);
        debug!(
            id = %message.id,
            to = %document.from,
            intent = intent.label(),
            "Parsed request"
        );

        let reply = match intent {
            Intent::ArticleRequest(id) => {
                let article = self.cache.article(id).await?;
                OutboundMessage::reply(
                    self.article_sender(),
                    &document.from,
                    article.headline,
                    article.text,
                )
            }
            Intent::Digest => {
                let headlines = self.cache.headlines().await;
                OutboundMessage::reply(
                    Mailbox::new(identity.address(&self.mail_domain)),
                    &document.from,
                    self.template.digest_subject.clone(),
                    build_digest_body(&self.template, &headlines),
                )
            }
        };

        let receiver = reply_recipient(&message.sender);
        let body = compose(&reply)?;
        self.send(identity, &receiver, &body).await?;

        info!(
            id = %message.id,
            to = %receiver,
            intent = intent.label(),
            "Reply sent"
        );
        Ok(MessageOutcome::Replied { intent, receiver })
    }

    /// Seal `body` for `receiver` with the identity's key and send it.
    async fn send(&self, identity: &Identity, receiver: &str, body: &[u8]) -> Result<()> {
        let receiver_key = self.directory.lookup_name(receiver).await?;
        let sealed = crypto::seal(body, &identity.key, &receiver_key)?;
        self.dump
            .send(&SealedMessage {
                sender: identity.name.clone(),
                receiver: receiver.to_string(),
                content: sealed.content,
                signature: sealed.signature,
            })
            .await?;
        Ok(())
    }

    fn article_sender(&self) -> Mailbox {
        Mailbox::new(self.template.article_sender_address.clone())
            .with_name(self.template.article_sender_name.clone())
    }
}

/// Digest body: header, one `[id] title` line plus a blank line per
/// headline in cache order, footer.
pub fn build_digest_body(template: &ReplyTemplate, headlines: &[Headline]) -> String {
    let mut body = String::with_capacity(
        template.digest_header.len() + template.digest_footer.len() + headlines.len() * 64,
    );
    body.push_str(&template.digest_header);
    for headline in headlines {
        body.push_str(&format!("[{}] {}\n\n", headline.id, headline.title));
    }
    body.push_str(&template.digest_footer);
    body
}
