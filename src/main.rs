//! Logging HTTP client CLI.
//!
//! Issues one request through the logging pipeline and prints the response.
//! Request and response records are written through `tracing`; set
//! `RUST_LOG` to change what is shown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use http::header::{HeaderMap, HeaderName, HeaderValue};

use logging_http_client::config::ConfigWatcher;
use logging_http_client::observability::logging::init_tracing;
use logging_http_client::{ConfigStore, HttpMethod, LoggingClient};

#[derive(Parser)]
#[command(name = "logging-http-client")]
#[command(about = "Send one HTTP request with request/response logging", long_about = None)]
struct Cli {
    /// Target URL.
    url: String,

    #[arg(short = 'X', long, default_value = "GET")]
    method: HttpMethod,

    /// Extra header as `name: value`; may be repeated.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Value stamped into `x-source`.
    #[arg(short, long)]
    source: Option<String>,

    /// TOML logging settings file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log request and response bodies regardless of settings.
    #[arg(long)]
    log_bodies: bool,

    /// Total request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("invalid header {line:?}, expected `name: value`"))?;
        headers.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(headers)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("logging_http_client=info");
    let cli = Cli::parse();

    let store = Arc::new(ConfigStore::new());
    let log_bodies = cli.log_bodies;
    let apply_overrides = move |store: &ConfigStore| {
        if log_bodies {
            store.set_request_body_logging_enabled(true);
            store.set_response_body_logging_enabled(true);
        }
    };

    // Keeps the settings file applied while the request is in flight.
    let _watcher = match &cli.settings {
        Some(path) => {
            let watcher = ConfigWatcher::new(path, store.clone()).with_overrides(apply_overrides);
            watcher.reload()?;
            tracing::info!(path = %path.display(), "Logging settings loaded");
            Some(watcher.run()?)
        }
        None => {
            apply_overrides(&store);
            None
        }
    };

    let mut builder = LoggingClient::builder().config(store);
    if let Some(source) = &cli.source {
        builder = builder.source(source.as_str());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let mut request = client
        .request(cli.method, cli.url.as_str())
        .headers(parse_headers(&cli.headers)?);
    if let Some(data) = cli.data {
        request = request.body(data);
    }

    let response = request.send().await?;
    println!("Status: {}", response.status());
    println!("{}", response.text());
    Ok(())
}
