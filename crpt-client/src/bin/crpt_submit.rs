use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use clap::Parser;
use crpt_client::ClientConfig;
use crpt_client::ClientError;
use crpt_client::DEFAULT_ENDPOINT;
use crpt_client::Document;
use crpt_client::DocumentClient;
use gate_limit::GateConfig;
use tracing_subscriber::EnvFilter;

/// Submit a document to the CRPT API, one or more times, through a shared
/// rate limited client.
#[derive(Debug, Parser)]
struct Args {
    /// JSON file holding the document
    #[arg(long)]
    document: PathBuf,

    /// Detached signature of the document
    #[arg(long, env = "CRPT_SIGNATURE")]
    signature: String,

    #[arg(long, env = "CRPT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Requests allowed per window
    #[arg(long, env = "CRPT_LIMIT", default_value_t = 10)]
    limit: usize,

    /// Window length, e.g. "1s" or "1m"
    #[arg(long, env = "CRPT_WINDOW", default_value = "1s", value_parser = humantime::parse_duration)]
    window: Duration,

    /// Per-request HTTP timeout
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    request_timeout: Duration,

    /// How many times to submit the document
    #[arg(long, default_value_t = 1)]
    copies: usize,

    /// Concurrent submitters
    #[arg(long, default_value_t = 1)]
    threads: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let raw = std::fs::read_to_string(&args.document)?;
    let document: Document = serde_json::from_str(&raw)?;

    let config = ClientConfig {
        endpoint: args.endpoint,
        gate: GateConfig::new(args.limit, args.window),
        request_timeout: args.request_timeout,
    };
    let client = DocumentClient::from_config(&config)?;

    let next = AtomicUsize::new(0);
    let accepted = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for _ in 0..args.threads.max(1) {
            scope.spawn(|| {
                while next.fetch_add(1, Ordering::Relaxed) < args.copies {
                    match client.create_document(&document, &args.signature) {
                        Ok(response) => {
                            accepted.fetch_add(1, Ordering::Relaxed);
                            tracing::info!(status = response.status, body = %response.body, "accepted");
                        }
                        Err(ClientError::Http { status, body }) => {
                            rejected.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(status, %body, "rejected");
                        }
                        Err(err) => {
                            rejected.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(%err, "failed");
                        }
                    }
                }
            });
        }
    });

    println!("--- {} ---", config.endpoint);
    println!("Total Duration:  {:.2?}", start.elapsed());
    println!("Accepted/Total:  {}/{}", accepted.into_inner(), args.copies);
    println!("Failed:          {}", rejected.into_inner());
    Ok(())
}
