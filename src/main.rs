use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use headline_responder::config::{ReplyTemplate, ResponderConfig};
use headline_responder::crypto::load_key_file;
use headline_responder::error::ConfigError;
use headline_responder::news::{HeadlineCache, HttpFeedSource, NewsCache, spawn_cache_refresher};
use headline_responder::pipeline::{Dispatcher, Identity, Responder, spawn_responder};
use headline_responder::shutdown::shutdown_channel;
use headline_responder::transport::{DumpService, HttpDumpClient, directory_from_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ResponderConfig::from_env().map_err(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export RESPONDER_KEYS=/path/to/news.key,/path/to/war.key");
        e
    })?;

    eprintln!("📰 Headline Responder v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Dump: {}", config.dump_url);
    if config.use_legacy_lookup {
        eprintln!("   Lookup: {} (legacy only)", config.lookup_url);
    } else {
        eprintln!(
            "   Lookup: {} (fallback {})",
            config.registry_url, config.lookup_url
        );
    }
    eprintln!("   Poll interval: {}s", config.poll_interval.as_secs());

    // ── Identities ──────────────────────────────────────────────────────
    let mut identities = Vec::with_capacity(config.key_files.len());
    for path in &config.key_files {
        let (name, key) = load_key_file(path)?;
        eprintln!("   Identity: {} ({})", name, key.public_key().to_base64());
        identities.push(Identity::new(name, key, Utc::now()));
    }

    // ── Transport ───────────────────────────────────────────────────────
    let dump: Arc<dyn DumpService> =
        Arc::new(HttpDumpClient::new(&config.dump_url, config.connect_timeout)?);
    let directory = directory_from_config(&config)?;

    // ── Headline cache ──────────────────────────────────────────────────
    let feed_url = config.feed_url.clone().ok_or_else(|| ConfigError::MissingRequired {
        key: "RESPONDER_FEED_URL".to_string(),
        hint: "Set it to the headline feed URL.".to_string(),
    })?;
    let source = Arc::new(HttpFeedSource::new(feed_url, config.connect_timeout)?);
    let cache: Arc<dyn HeadlineCache> = Arc::new(NewsCache::new(source));
    cache.refresh().await.map_err(|e| {
        error!(error = %e, "Initial headline refresh failed");
        e
    })?;
    info!(count = cache.headlines().await.len(), "Headline cache loaded");

    // ── Periodic tasks ──────────────────────────────────────────────────
    let (trigger, shutdown) = shutdown_channel();

    let refresher = spawn_cache_refresher(
        Arc::clone(&cache),
        config.refresh_interval,
        shutdown.clone(),
    );

    let dispatcher = Dispatcher::new(
        Arc::clone(&dump),
        directory,
        cache,
        ReplyTemplate::default(),
        config.mail_domain.clone(),
    );
    let responder = Arc::new(Responder::new(identities, dump, dispatcher));
    let mut responder_handle = spawn_responder(responder, config.poll_interval, shutdown);

    let joined = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down...");
            trigger.trigger();
            (&mut responder_handle).await
        }
        joined = &mut responder_handle => joined,
    };
    // Stop the refresher whichever way the responder ended.
    trigger.trigger();

    if let Err(e) = refresher.await {
        error!("Cache refresher task panicked: {e}");
    }

    let failure: Option<String> = match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(e) => Some(format!("responder task panicked: {e}")),
    };
    if let Some(reason) = failure {
        eprintln!("Fatal: {reason}");
        std::process::exit(1);
    }

    info!("Shutdown complete");
    Ok(())
}
