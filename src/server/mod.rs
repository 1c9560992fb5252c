//! Startup coordination for the two listeners.
//!
//! The HTTP and TCP listeners share nothing but the logging subscriber.
//! Each gets its address from [`Config`] and runs until its accept loop
//! ends, which only happens when binding fails.

pub mod listener;
pub mod tcp;

use std::future::Future;
use std::io;

use tracing::{info, warn};

use crate::config::Config;

/// Runs both listeners concurrently.
///
/// Returns the first fatal error, which in practice is a bind failure.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    info!(
        http = %cfg.http_addr,
        tcp = %cfg.tcp_addr,
        max_line = ?cfg.max_line_bytes,
        "Server started with TCP and HTTP support"
    );

    tokio::try_join!(
        tcp::run(&cfg.tcp_addr, cfg.max_line_bytes),
        listener::run(&cfg.http_addr),
    )?;

    Ok(())
}

/// Runs both listeners until `shutdown` resolves.
///
/// A shutdown future that fails (no signal handler could be installed)
/// is logged and the listeners keep running.
pub async fn run_until<F>(cfg: &Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let server = run(cfg);
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => return res,
        signal = shutdown => match signal {
            Ok(()) => {
                info!("Shutdown signal received");
                return Ok(());
            }
            Err(e) => warn!(error = %e, "Could not listen for shutdown signal"),
        },
    }

    server.await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn local_config() -> Config {
        Config {
            http_addr: "127.0.0.1:0".into(),
            tcp_addr: "127.0.0.1:0".into(),
            max_line_bytes: None,
        }
    }

    #[tokio::test]
    async fn shutdown_signal_stops_the_listeners() {
        let res = tokio::time::timeout(
            Duration::from_secs(5),
            run_until(&local_config(), async { Ok::<(), io::Error>(()) }),
        )
        .await;

        assert!(matches!(res, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn failed_signal_handler_keeps_serving() {
        let failing = async { Err::<(), _>(io::Error::other("signals unavailable")) };

        let res = tokio::time::timeout(
            Duration::from_millis(200),
            run_until(&local_config(), failing),
        )
        .await;

        assert!(res.is_err(), "listeners stopped early: {res:?}");
    }

    #[tokio::test]
    async fn failed_signal_handler_still_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cfg = Config {
            tcp_addr: taken.local_addr().unwrap().to_string(),
            ..local_config()
        };
        let failing = async { Err::<(), _>(io::Error::other("signals unavailable")) };

        let err = run_until(&cfg, failing).await.unwrap_err();

        assert!(err.to_string().contains("TCP server failed to bind"));
    }
}
