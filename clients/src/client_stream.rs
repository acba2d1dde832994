use anyhow::Result;
use lib_stream::{BusinessType, StreamClient};
use std::sync::Arc;
use tokio::signal;

mod stream_logic;
use stream_logic::{config, handlers, logger, stats::SessionStats};

async fn terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            Err(e) => {
                log::warn!("Could not install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        // On non-unix platforms, just wait forever.
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_level())?;

    let stats = Arc::new(SessionStats::default());
    let mut client = StreamClient::new(config.to_stream_config()?)?.with_observer(stats.clone());
    log::info!(
        "Starting stream client {} with subscriptions [{}]",
        client.config().identity.id,
        client
            .config()
            .subscriptions
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    client.register_handler(BusinessType::Event, handlers::on_event);
    client.register_handler(BusinessType::Callback, handlers::on_callback);

    let outcome = tokio::select! {
        result = client.connect() => Some(result),
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
            None
        }
        _ = terminate() => None,
    };

    log::info!(
        "Session summary: {} reconnects={} last_ping={:?}",
        stats.summary(),
        client.reconnect_count(),
        client.last_ping_at()
    );

    if let Some(Err(e)) = outcome {
        log::error!("Stream client stopped: {}", e);
        return Err(e.into());
    }

    log::info!("Shutdown complete.");
    Ok(())
}
