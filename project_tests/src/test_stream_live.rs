//! # Live Stream Smoke Run
//!
//! Connects to the real gateway with credentials from the environment (or a
//! `.env` file), logs every frame the handlers see, and stops after a fixed
//! number of seconds. Useful to confirm that an application key is allowed to
//! open a stream and that keepalive probes are being answered.
//!
//! ```text
//! STREAM_CLIENT_ID=... STREAM_CLIENT_SECRET=... cargo run -p project_tests --bin test_stream_live -- --seconds 120
//! ```

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder for consistency
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::time::Duration;

use clap::Parser;
use lib_stream::{BusinessType, ClientIdentity, StreamClient, StreamConfig, Subscription};
use serde_json::json;

/// Command line for the smoke run.
#[derive(Parser, Debug)]
#[clap(about = "Live smoke run against the streaming gateway")]
struct Args {
    /// Application key.
    #[clap(long, env = "STREAM_CLIENT_ID")]
    client_id: String,

    /// Application secret.
    #[clap(long, env = "STREAM_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Subscriptions as TYPE:TOPIC.
    #[clap(long, value_delimiter = ',', default_value = "EVENT:*")]
    subscriptions: Vec<String>,

    /// How long to stay connected.
    #[clap(long, default_value_t = 60)]
    seconds: u64,
}

/// # Main Test Function
///
/// Runs `connect()` until the deadline and reports what happened.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .level_for("lib_stream", log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;

    let subscriptions = args
        .subscriptions
        .iter()
        .map(|s| s.parse::<Subscription>())
        .collect::<lib_stream::Result<Vec<_>>>()?;

    let config = StreamConfig::new(ClientIdentity::new(args.client_id, args.client_secret))
        .with_subscriptions(subscriptions);
    let mut client = StreamClient::new(config)?;
    client.register_handler(BusinessType::Event, |msg| {
        println!("[EVENT] {} {:?}: {}", msg.topic(), msg.message_id(), msg.data);
        Ok(json!({"status": "SUCCESS", "message": "success"}))
    });
    client.register_handler(BusinessType::Callback, |msg| {
        println!("[CALLBACK] {} {:?}: {}", msg.topic(), msg.message_id(), msg.data);
        Ok(json!({"response": {"message": "Callback processed"}}))
    });

    println!("--- Starting live stream run ({}s) ---", args.seconds);
    let outcome = tokio::time::timeout(Duration::from_secs(args.seconds), client.connect()).await;
    match outcome {
        Err(_) => {
            println!("✅ [SUCCESS] Stream stayed up for {}s", args.seconds);
            println!(
                "   reconnects={} last_ping={:?}",
                client.reconnect_count(),
                client.last_ping_at()
            );
            Ok(())
        }
        Ok(Err(e)) => {
            println!("❌ [FAILED] {}", e);
            Err(e.into())
        }
        Ok(Ok(())) => Ok(()),
    }
}
