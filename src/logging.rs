//! Tracing setup and log-safe content ids.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "misinfo_verifier=info,warn";
pub const ENV_LOG_FORMAT: &str = "VERIFIER_LOG_FORMAT";

/// Install the global subscriber. `RUST_LOG` overrides the default filter and
/// `VERIFIER_LOG_FORMAT=json` switches to JSON lines. Safe to call twice.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Short anonymized id for `text`: first 6 bytes of its SHA-256, hex.
/// Log this instead of raw content.
pub fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_id_is_short_stable_hex() {
        let a = anon_id("hello");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_id("hello"));
        assert_ne!(a, anon_id("hello!"));
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(a, "2cf24dba5fb0");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init();
        init();
    }
}
