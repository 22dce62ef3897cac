//! Rendering of reply documents.

use std::time::SystemTime;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::{Mailbox as LettreMailbox, Message};

use super::document::Mailbox;
use crate::error::DocumentError;

/// Content-Language of every reply.
const CONTENT_LANGUAGE: &str = "ru";

/// Content-Type of every reply.
const CONTENT_TYPE: &str = "text/plain; charset=utf-8; format=flowed";

/// Raw bytes per RFC 2047 encoded word, keeping folded lines under 78 columns.
const ENCODED_WORD_BYTES: usize = 39;

/// A reply before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
    pub subject: String,
    pub body: String,
    pub date: DateTime<Utc>,
}

impl OutboundMessage {
    /// A single-recipient reply dated now.
    pub fn reply(
        from: Mailbox,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to: vec![Mailbox::new(to)],
            cc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            date: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ContentLanguage(String);

impl Header for ContentLanguage {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Language")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.trim().to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Subject that decodes back to exactly the text it was built from.
///
/// Non-ASCII subjects are written entirely as base64 encoded words, spaces
/// included, so runs of whitespace between words survive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EncodedSubject(String);

impl EncodedSubject {
    fn encoded_words(&self) -> String {
        let mut words = Vec::new();
        let mut chunk = String::new();
        for c in self.0.chars() {
            if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
                words.push(encoded_word(&chunk));
                chunk.clear();
            }
            chunk.push(c);
        }
        if !chunk.is_empty() {
            words.push(encoded_word(&chunk));
        }
        words.join("\r\n ")
    }
}

fn encoded_word(text: &str) -> String {
    format!("=?utf-8?b?{}?=", BASE64.encode(text))
}

impl Header for EncodedSubject {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Subject")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        if self.0.is_ascii() {
            return HeaderValue::new(Self::name(), self.0.clone());
        }
        HeaderValue::dangerous_new_pre_encoded(Self::name(), self.0.clone(), self.encoded_words())
    }
}

fn to_lettre(mailbox: &Mailbox) -> Result<LettreMailbox, DocumentError> {
    let address = mailbox.address.parse().map_err(|e| {
        DocumentError::Compose(format!("invalid address {:?}: {e}", mailbox.address))
    })?;
    Ok(LettreMailbox::new(mailbox.name.clone(), address))
}

/// Render `message` as a single inline UTF-8 text document.
pub fn compose(message: &OutboundMessage) -> Result<Vec<u8>, DocumentError> {
    if message.to.is_empty() {
        return Err(DocumentError::Compose("no recipients".into()));
    }

    let content_type = ContentType::parse(CONTENT_TYPE)
        .map_err(|e| DocumentError::Compose(format!("invalid content type: {e}")))?;

    let mut builder = Message::builder()
        .date(SystemTime::from(message.date))
        .header(ContentLanguage(CONTENT_LANGUAGE.to_string()))
        .header(content_type)
        .from(to_lettre(&message.from)?);
    for to in &message.to {
        builder = builder.to(to_lettre(to)?);
    }
    for cc in &message.cc {
        builder = builder.cc(to_lettre(cc)?);
    }

    let email = builder
        .header(EncodedSubject(message.subject.clone()))
        .body(message.body.clone())
        .map_err(|e| DocumentError::Compose(format!("failed to build document: {e}")))?;

    Ok(email.formatted())
}
