//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default outer poll interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default headline cache refresh interval (10 minutes).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 600;

/// Default connect timeout for the dump, lookup and feed services.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default domain appended to identity names in reply From headers.
pub const DEFAULT_MAIL_DOMAIN: &str = "ubikom.cc";

const DIGEST_SUBJECT: &str = "Последние новости о войне";

const DIGEST_HEADER: &str = "Новости Си-Эн-Эн

Каждая статья имеет номер. Пошлите сообщение с этим номером в теме чтобы получить статью полностью. 

Если вы пользуетесь зашифрованной почтой Ubikom, то ваше взаимодействие с war-info@ubikom.cc не регистрируется и
не отслеживается. Метаинформация о ваших сообщениях всегда зашифрована. Обслуживающие серверы находятся
за пределами РФ. Регестрируйтесь здесь: https://ubikom.cc/ru/index.html.

";

const DIGEST_FOOTER: &str = "\n";

/// Responder configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub dump_url: String,
    pub lookup_url: String,
    pub registry_url: String,
    pub use_legacy_lookup: bool,
    pub key_files: Vec<PathBuf>,
    pub feed_url: Option<String>,
    pub mail_domain: String,
    pub poll_interval: Duration,
    pub refresh_interval: Duration,
    pub connect_timeout: Duration,
}

impl ResponderConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_files: Vec<PathBuf> = var("RESPONDER_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();

        if key_files.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "RESPONDER_KEYS".into(),
                hint: "At least one key must be specified (comma-separated key file paths).".into(),
            });
        }

        let use_legacy_lookup = match var("RESPONDER_USE_LEGACY_LOOKUP") {
            Some(v) => parse_bool("RESPONDER_USE_LEGACY_LOOKUP", &v)?,
            None => false,
        };

        Ok(Self {
            dump_url: var("RESPONDER_DUMP_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8826".to_string()),
            lookup_url: var("RESPONDER_LOOKUP_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8825".to_string()),
            registry_url: var("RESPONDER_REGISTRY_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8545".to_string()),
            use_legacy_lookup,
            key_files,
            feed_url: var("RESPONDER_FEED_URL").filter(|s| !s.trim().is_empty()),
            mail_domain: var("RESPONDER_MAIL_DOMAIN")
                .unwrap_or_else(|| DEFAULT_MAIL_DOMAIN.to_string()),
            poll_interval: secs(
                &var,
                "RESPONDER_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?,
            refresh_interval: secs(
                &var,
                "RESPONDER_REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?,
            connect_timeout: secs(
                &var,
                "RESPONDER_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }
}

fn secs<F>(var: &F, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(key) else {
        return Ok(Duration::from_secs(default));
    };
    let value: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?} is not a number of seconds: {e}"),
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "interval must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(value))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{other:?} is not a boolean"),
        }),
    }
}

/// Fixed texts used when composing replies.
#[derive(Debug, Clone)]
pub struct ReplyTemplate {
    /// Subject of every digest reply.
    pub digest_subject: String,
    /// Text placed before the headline list.
    pub digest_header: String,
    /// Text placed after the headline list.
    pub digest_footer: String,
    /// Display name of the article-delivery identity.
    pub article_sender_name: String,
    /// Address of the article-delivery identity.
    pub article_sender_address: String,
}

impl Default for ReplyTemplate {
    fn default() -> Self {
        Self {
            digest_subject: DIGEST_SUBJECT.to_string(),
            digest_header: DIGEST_HEADER.to_string(),
            digest_footer: DIGEST_FOOTER.to_string(),
            article_sender_name: "Ubikom War Info".to_string(),
            article_sender_address: "war-info@ubikom.cc".to_string(),
        }
    }
}
