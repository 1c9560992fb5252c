use echod::config::Config;
use echod::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();

    if let Err(e) = server::run_until(&cfg, tokio::signal::ctrl_c()).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
