use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::{
    State,
    http::Status,
    request::{self, FromRequest, Request},
};
use tracing::{debug, instrument, warn};

use crate::config::env_or;

/// Refills in whole intervals so a burst cannot be topped up mid-minute.
#[derive(Debug)]
pub struct TokenBucket {
    last_refill: Instant,
    tokens: u32,
    capacity: u32,
    refill_rate: u32,
    refill_interval: Duration,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_rate: u32, refill_interval: Duration) -> Self {
        debug!(
            "Creating new token bucket: capacity={}, refill_rate={}, interval={}s",
            capacity,
            refill_rate,
            refill_interval.as_secs()
        );
        Self {
            last_refill: Instant::now(),
            tokens: capacity,
            capacity,
            refill_rate,
            refill_interval,
        }
    }

    pub fn try_consume(&mut self) -> bool {
        self.refill(Instant::now());
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn is_full(&self) -> bool {
        self.tokens >= self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill);
        let intervals = elapsed.as_millis() / self.refill_interval.as_millis().max(1);

        if intervals > 0 {
            let tokens_to_add = (intervals as u32).saturating_mul(self.refill_rate);
            self.tokens = self.tokens.saturating_add(tokens_to_add).min(self.capacity);
            self.last_refill = now;
        }
    }
}

pub type RateLimiter = Arc<DashMap<IpAddr, TokenBucket>>;

pub fn create_rate_limiter() -> RateLimiter {
    Arc::new(DashMap::new())
}

/// Drops every bucket that has refilled to capacity. A later request from the
/// same address starts a fresh, equally full bucket.
pub fn sweep_idle_buckets(rate_limiter: &RateLimiter) -> usize {
    sweep_idle_buckets_at(rate_limiter, Instant::now())
}

fn sweep_idle_buckets_at(rate_limiter: &DashMap<IpAddr, TokenBucket>, now: Instant) -> usize {
    let before = rate_limiter.len();
    rate_limiter.retain(|_, bucket| {
        bucket.refill(now);
        !bucket.is_full()
    });
    before.saturating_sub(rate_limiter.len())
}

/// The caller's address. Proxy headers win over the socket peer unless
/// `TRUST_PROXY_HEADERS=false`; only trust them behind a proxy that sets them.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer: Option<IpAddr>,
    trust_proxy_headers: bool,
) -> IpAddr {
    let from_headers = || -> Option<IpAddr> {
        forwarded_for
            .and_then(|header| header.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
            .or_else(|| real_ip.and_then(|ip| ip.trim().parse().ok()))
    };

    trust_proxy_headers
        .then(from_headers)
        .flatten()
        .or(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let headers = req.headers();
        let ip = resolve_client_ip(
            headers.get_one("X-Forwarded-For"),
            headers.get_one("X-Real-IP"),
            req.client_ip(),
            env_or("TRUST_PROXY_HEADERS", true),
        );

        request::Outcome::Success(ClientIp(ip))
    }
}

#[instrument(level = "trace", skip(rate_limiter, client_ip), fields(client_ip = %client_ip.0))]
pub fn check_rate_limit(
    rate_limiter: &State<RateLimiter>,
    client_ip: &ClientIp,
) -> Result<(), Status> {
    let capacity: u32 = env_or("RATE_LIMIT_GAMES_PER_MINUTE", 10);

    let refill_interval = Duration::from_secs(60);
    let refill_rate = capacity;

    let mut entry = rate_limiter
        .entry(client_ip.0)
        .or_insert_with(|| TokenBucket::new(capacity, refill_rate, refill_interval));

    if entry.try_consume() {
        debug!("Rate limit check passed for {}", client_ip.0);
        Ok(())
    } else {
        warn!("Rate limit exceeded for {} - rejecting request", client_ip.0);
        Err(Status::TooManyRequests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_drains_then_refuses() {
        let mut bucket = TokenBucket::new(2, 2, Duration::from_secs(60));
        assert!(bucket.try_consume());
        assert!(bucket.try_consume());
        assert!(!bucket.try_consume());
    }

    #[test]
    fn refill_waits_for_a_whole_interval() {
        let mut bucket = TokenBucket::new(3, 3, Duration::from_secs(60));
        bucket.tokens = 0;
        let start = bucket.last_refill;

        bucket.refill(start + Duration::from_secs(59));
        assert_eq!(bucket.tokens, 0);

        bucket.refill(start + Duration::from_secs(61));
        assert_eq!(bucket.tokens, 3);
    }

    #[test]
    fn sweep_drops_only_refilled_buckets() {
        let rate_limiter = create_rate_limiter();
        let busy: IpAddr = "198.51.100.1".parse().unwrap();
        let idle: IpAddr = "198.51.100.2".parse().unwrap();

        let mut bucket = TokenBucket::new(2, 2, Duration::from_secs(60));
        bucket.try_consume();
        let start = bucket.last_refill;
        rate_limiter.insert(busy, bucket);
        rate_limiter.insert(idle, TokenBucket::new(2, 2, Duration::from_secs(60)));

        assert_eq!(sweep_idle_buckets_at(&rate_limiter, start), 1);
        assert!(rate_limiter.contains_key(&busy));
        assert!(!rate_limiter.contains_key(&idle));

        assert_eq!(
            sweep_idle_buckets_at(&rate_limiter, start + Duration::from_secs(61)),
            1
        );
        assert!(rate_limiter.is_empty());
    }

    #[test]
    fn proxy_headers_are_used_only_when_trusted() {
        let peer: IpAddr = "192.0.2.10".parse().unwrap();
        let forwarded = Some("203.0.113.7, 10.0.0.1");

        assert_eq!(
            resolve_client_ip(forwarded, None, Some(peer), true),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            resolve_client_ip(None, Some(" 203.0.113.9 "), Some(peer), true),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
        assert_eq!(resolve_client_ip(forwarded, None, Some(peer), false), peer);
        assert_eq!(
            resolve_client_ip(Some("garbage"), None, Some(peer), true),
            peer
        );
        assert_eq!(
            resolve_client_ip(None, None, None, false),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }

    #[test]
    fn refill_is_capped_at_capacity() {
        let mut bucket = TokenBucket::new(3, 3, Duration::from_secs(60));
        bucket.tokens = 1;
        let start = bucket.last_refill;

        bucket.refill(start + Duration::from_secs(600));
        assert_eq!(bucket.tokens, 3);
    }
}
