use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::echo::{echo_lines, SessionError};

/// Binds the TCP echo listener. Failure here is fatal for the process.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("TCP server failed to bind {addr}"))
}

/// Accepts connections forever and echoes lines on each in its own task.
pub async fn serve(listener: TcpListener, max_line: Option<usize>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "TCP accept error");
                continue;
            }
        };
        let source_ip = peer.to_string();
        info!(source_ip = %source_ip, "Accepting TCP connection");

        tokio::spawn(async move {
            match echo_lines(socket, &source_ip, max_line).await {
                Ok(summary) => info!(
                    source_ip = %source_ip,
                    lines = summary.lines,
                    bytes = summary.bytes,
                    discarded = summary.discarded,
                    "TCP connection closed by client"
                ),
                Err(e @ SessionError::Write(_)) => {
                    warn!(source_ip = %source_ip, error = %e, "TCP write error")
                }
                Err(e) => warn!(source_ip = %source_ip, error = %e, "TCP read error"),
            }
        });
    }
}

pub async fn run(addr: &str, max_line: Option<usize>) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    info!(address = addr, "TCP server listening");
    serve(listener, max_line).await
}
