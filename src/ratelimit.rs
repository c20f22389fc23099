//! Per-client token buckets for the analysis routes.
//!
//! One bucket per client IP, refilled continuously at `per_minute / 60`
//! tokens per second up to `burst`. Client identity is the peer address from
//! `ConnectInfo`, or the leftmost `X-Forwarded-For` / `X-Real-IP` entry when
//! the deployment sits behind a trusted proxy.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use metrics::counter;

use crate::config::RateLimitConfig;
use crate::metrics as m;
use crate::model::AnalysisResult;

pub const RATE_LIMITED_FLAG: &str = "Rate limit exceeded";

/// Above this many tracked clients, idle buckets are swept on insert.
const MAX_TRACKED_CLIENTS: usize = 10_000;
const IDLE_AFTER: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

#[derive(Clone)]
pub struct IpLimiter {
    scope: &'static str,
    buckets: Arc<DashMap<IpAddr, Bucket>>,
    per_sec: f64,
    burst: f64,
    trust_forwarded: bool,
}

impl IpLimiter {
    pub fn new(scope: &'static str, per_minute: u32, cfg: &RateLimitConfig) -> Self {
        let burst = if cfg.burst == 0 { per_minute } else { cfg.burst };
        Self {
            scope,
            buckets: Arc::new(DashMap::new()),
            per_sec: f64::from(per_minute) / 60.0,
            burst: f64::from(burst.max(1)),
            trust_forwarded: cfg.trust_forwarded_for,
        }
    }

    pub fn client_ip<B>(&self, req: &axum::http::Request<B>) -> IpAddr {
        if self.trust_forwarded {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
                .or_else(|| {
                    req.headers()
                        .get("x-real-ip")
                        .and_then(|h| h.to_str().ok())
                });
            if let Some(ip) = forwarded.and_then(|v| v.trim().parse().ok()) {
                return ip;
            }
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|c| c.0.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    /// Take one token for `ip` at `now`.
    pub fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        if self.buckets.len() > MAX_TRACKED_CLIENTS {
            self.buckets
                .retain(|_, b| now.saturating_duration_since(b.last) < IDLE_AFTER);
        }
        let mut entry = self.buckets.entry(ip).or_insert(Bucket {
            tokens: self.burst,
            last: now,
        });
        let elapsed = now.saturating_duration_since(entry.last).as_secs_f64();
        entry.tokens = (entry.tokens + elapsed * self.per_sec).min(self.burst);
        entry.last = now;
        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }
}

pub async fn rate_limit(State(limiter): State<IpLimiter>, req: Request, next: Next) -> Response {
    let ip = limiter.client_ip(&req);
    if limiter.allow(ip) {
        return next.run(req).await;
    }
    counter!(m::RATE_LIMITED, "scope" => limiter.scope).increment(1);
    tracing::warn!(target: "verifier", scope = limiter.scope, %ip, "rate limited");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(AnalysisResult::error(
            "Too many requests, please slow down".to_string(),
            RATE_LIMITED_FLAG,
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn cfg(burst: u32, trust: bool) -> RateLimitConfig {
        RateLimitConfig {
            burst,
            trust_forwarded_for: trust,
            ..RateLimitConfig::default()
        }
    }

    #[test]
    fn bucket_drains_then_refills() {
        let l = IpLimiter::new("text", 60, &cfg(2, false));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let t0 = Instant::now();
        assert!(l.allow_at(ip, t0));
        assert!(l.allow_at(ip, t0));
        assert!(!l.allow_at(ip, t0));
        // 60/min refills one token per second
        assert!(l.allow_at(ip, t0 + Duration::from_millis(1100)));
        assert!(!l.allow_at(ip, t0 + Duration::from_millis(1200)));
    }

    #[test]
    fn clients_have_separate_buckets() {
        let l = IpLimiter::new("text", 1, &cfg(1, false));
        let t0 = Instant::now();
        assert!(l.allow_at("10.0.0.1".parse().unwrap(), t0));
        assert!(!l.allow_at("10.0.0.1".parse().unwrap(), t0));
        assert!(l.allow_at("10.0.0.2".parse().unwrap(), t0));
    }

    #[test]
    fn zero_burst_means_per_minute() {
        let l = IpLimiter::new("image", 3, &cfg(0, false));
        let ip: IpAddr = "::1".parse().unwrap();
        let t0 = Instant::now();
        assert_eq!((0..5).filter(|_| l.allow_at(ip, t0)).count(), 3);
    }

    #[test]
    fn forwarded_header_only_when_trusted() {
        let req = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        let trusted = IpLimiter::new("text", 20, &cfg(0, true));
        let untrusted = IpLimiter::new("text", 20, &cfg(0, false));
        assert_eq!(trusted.client_ip(&req), "203.0.113.7".parse::<IpAddr>().unwrap());
        assert_eq!(
            untrusted.client_ip(&req),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );

        let mut req = axum::http::Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(trusted.client_ip(&req), "198.51.100.2".parse::<IpAddr>().unwrap());
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 4000))));
        assert_eq!(
            untrusted.client_ip(&req),
            "192.0.2.9".parse::<IpAddr>().unwrap()
        );
    }
}
