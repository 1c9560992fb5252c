//! echod - TCP line echo and HTTP echo for probing network paths
//!
//! Library half of the binary: listeners, the line-echo session and the
//! HTTP/1.1 layer.

pub mod config;
pub mod echo;
pub mod host;
pub mod http;
pub mod server;
