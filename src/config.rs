//! Startup configuration.
//!
//! Both listen addresses come from positional arguments
//! (`echod [httpAddr] [tcpAddr]`); the optional TCP line cap comes from
//! the environment. The result is passed by value into each listener.

use tracing::warn;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TCP_ADDR: &str = "0.0.0.0:8081";

/// Environment variable holding the TCP line-length cap in bytes.
pub const MAX_LINE_ENV: &str = "ECHOD_MAX_LINE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub http_addr: String,
    pub tcp_addr: String,
    /// `None` leaves TCP lines unbounded.
    pub max_line_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            tcp_addr: DEFAULT_TCP_ADDR.to_string(),
            max_line_bytes: None,
        }
    }
}

impl Config {
    /// Loads from the process arguments and environment.
    pub fn load() -> Self {
        let mut cfg = Self::from_args(std::env::args().skip(1));
        cfg.max_line_bytes = std::env::var(MAX_LINE_ENV)
            .ok()
            .and_then(|raw| parse_max_line(&raw));
        cfg
    }

    /// Builds a config from positional arguments, program name excluded.
    ///
    /// Missing or unusable arguments fall back to the defaults; anything
    /// past the second argument is ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        let http_addr = resolve_addr(args.next(), DEFAULT_HTTP_ADDR, "HTTP");
        let tcp_addr = resolve_addr(args.next(), DEFAULT_TCP_ADDR, "TCP");

        Self {
            http_addr,
            tcp_addr,
            max_line_bytes: None,
        }
    }
}

fn resolve_addr<S: AsRef<str>>(arg: Option<S>, default: &str, listener: &str) -> String {
    let Some(arg) = arg else {
        return default.to_string();
    };

    match normalize_addr(arg.as_ref()) {
        Some(addr) => addr,
        None => {
            warn!(
                listener,
                argument = arg.as_ref(),
                default,
                "Invalid listen address, using default"
            );
            default.to_string()
        }
    }
}

/// Checks that `raw` has the shape `host:port` and returns the bindable form.
///
/// An empty host (`:8080`) means every interface.
pub fn normalize_addr(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (host, port) = raw.rsplit_once(':')?;
    port.parse::<u16>().ok()?;

    if host.is_empty() {
        return Some(format!("0.0.0.0:{port}"));
    }

    if host.starts_with('[') {
        // bracketed IPv6 literal
        let inner = host.strip_prefix('[')?.strip_suffix(']')?;
        inner.parse::<std::net::Ipv6Addr>().ok()?;
    } else if host.contains(':') || host.contains(char::is_whitespace) {
        return None;
    }

    Some(raw.to_string())
}

fn parse_max_line(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => {
            warn!(value = raw, "Ignoring invalid {}, lines stay unbounded", MAX_LINE_ENV);
            None
        }
        Ok(n) => Some(n),
    }
}
