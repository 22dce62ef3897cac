//! Parsing of decrypted documents.

use std::collections::BTreeMap;

use mail_parser::{Message, MessageParser};

use super::sanitize::sanitize_headers;
use crate::error::DocumentError;

/// A display name plus address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: String,
}

impl Mailbox {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A decrypted, sanitized and parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Raw header values keyed by lowercase header name, in order of
    /// appearance.
    pub headers: BTreeMap<String, Vec<String>>,
    /// The single From address.
    pub from: String,
    /// Decoded Subject, empty when absent.
    pub subject: String,
    /// First inline text part with LF line endings.
    pub body: String,
}

impl ParsedDocument {
    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Sanitize and parse decrypted bytes.
///
/// Fails unless the From header holds exactly one address.
pub fn parse_document(raw: &[u8]) -> Result<ParsedDocument, DocumentError> {
    let sanitized = sanitize_headers(raw);

    let message = MessageParser::default()
        .parse(&sanitized)
        .ok_or_else(|| DocumentError::Malformed("not a header+body document".into()))?;

    let from = extract_addresses(message.from());
    let from = match from.len() {
        0 => return Err(DocumentError::MissingFrom),
        1 => from.into_iter().next().ok_or(DocumentError::MissingFrom)?,
        count => return Err(DocumentError::AmbiguousFrom { count }),
    };

    let subject = message.subject().unwrap_or_default().to_string();
    let body = message
        .body_text(0)
        .map(|text| text.replace("\r\n", "\n"))
        .unwrap_or_default();

    Ok(ParsedDocument {
        headers: collect_headers(&message),
        from,
        subject,
        body,
    })
}

/// Extract the addresses of a mail_parser Address field.
fn extract_addresses(addr: Option<&mail_parser::Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(addrs) => addrs
            .iter()
            .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            .collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| {
                g.addresses
                    .iter()
                    .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            })
            .collect(),
    }
}

/// Raw header values from the parsed message, keyed by lowercase name.
fn collect_headers(message: &Message<'_>) -> BTreeMap<String, Vec<String>> {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for header in message.headers() {
        let value = message
            .raw_message
            .get(header.offset_start as usize..header.offset_end as usize)
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .map(unfold)
            .unwrap_or_default();
        headers
            .entry(header.name.as_str().to_ascii_lowercase())
            .or_default()
            .push(value);
    }
    headers
}

/// Join folded continuation lines of a raw header value.
fn unfold(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
