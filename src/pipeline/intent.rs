//! Subject line → intent classification.

use super::types::Intent;

/// Classify a Subject line.
///
/// The whole subject must parse as a base-10 32-bit integer greater than
/// zero to request an article. Everything else (empty, text, `0`, negative,
/// surrounding whitespace, overflow) asks for the digest.
pub fn classify_subject(subject: &str) -> Intent {
    match subject.parse::<i32>() {
        Ok(id) if id > 0 => Intent::ArticleRequest(id.unsigned_abs()),
        _ => Intent::Digest,
    }
}
