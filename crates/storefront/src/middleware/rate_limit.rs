//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the endpoints that can be abused to guess credentials or send mail are
//! limited:
//! - `auth_rate_limiter`: `/auth` (~10/min per IP)
//! - `contact_rate_limiter`: `/contact` (~4/min per IP)

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Headers consulted for the client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor that reads the real client IP from proxy headers.
///
/// `CF-Connecting-IP` wins, then the first hop of `X-Forwarded-For`, then the
/// remaining single-value headers.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        let forwarded = || {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        header_ip(CLIENT_IP_HEADERS[0])
            .or_else(forwarded)
            .or_else(|| header_ip(CLIENT_IP_HEADERS[1]))
            .or_else(|| header_ip(CLIENT_IP_HEADERS[2]))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for `/auth`: one token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Never panics; the period and burst are positive constants.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Limiter for `/contact`: one token every 15 seconds, burst of 3.
///
/// # Panics
///
/// Never panics; the period and burst are positive constants.
#[must_use]
pub fn contact_rate_limiter() -> RateLimiterLayer {
    limiter(15, 3)
}

#[allow(clippy::expect_used)]
fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .expect("rate limiter config with positive period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn extract(headers: &[(&str, &str)]) -> Result<IpAddr, GovernorError> {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        CloudflareIpKeyExtractor.extract(&builder.body(()).unwrap())
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let ip = extract(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ])
        .unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_first_forwarded_hop() {
        let ip = extract(&[("x-forwarded-for", " 198.51.100.4 , 10.0.0.2")]).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_fly_header_fallback() {
        let ip = extract(&[("fly-client-ip", "2001:db8::1")]).unwrap();
        assert_eq!(ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_no_headers_is_an_error() {
        assert!(extract(&[]).is_err());
        assert!(extract(&[("x-real-ip", "not-an-ip")]).is_err());
    }

    #[test]
    fn test_limiters_build() {
        let _ = auth_rate_limiter();
        let _ = contact_rate_limiter();
    }
}
