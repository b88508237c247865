use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use wardgate::server::{self, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let config = ServerConfig::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "wardgate",
        "wardgate starting: RUST_LOG='{}', http_port={}, token_ttl_secs={}, policy_file={:?}",
        rust_log, config.http_port, config.token_ttl_secs, config.policy_file
    );

    server::run_with_config(config).await
}
