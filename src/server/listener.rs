use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::http::connection::Connection;

/// Binds the HTTP listener. Failure here is fatal for the process.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("HTTP server failed to bind {addr}"))
}

/// Accepts HTTP connections forever, one task per connection.
pub async fn serve(listener: TcpListener) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "HTTP accept error");
                continue;
            }
        };

        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer.to_string());
            if let Err(e) = conn.run().await {
                warn!(source_ip = %peer, error = %e, "HTTP connection error");
            }
        });
    }
}

pub async fn run(addr: &str) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    info!(address = addr, "HTTP server listening");
    serve(listener).await
}
