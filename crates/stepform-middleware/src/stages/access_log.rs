//! Access logging.
//!
//! Emits exactly one `Request handled` record per request through the
//! request's logger, after the response is final. The record carries
//! `method`, `path` (with query), `status`, `latency` (microseconds), `ip`
//! and `request_id`. Its level follows the status: 5xx is `ERROR`, 4xx is
//! `WARN`, anything else `INFO`.
//!
//! # Client IP
//!
//! Resolved once, on the way in:
//!
//! 1. first entry of `X-Forwarded-For`, if it is an IP address
//! 2. `X-Real-IP`, if it is an IP address
//! 3. transport peer address
//! 4. `"unknown"`

use std::net::{IpAddr, SocketAddr};

use http::StatusCode;
use tracing::Level;

use crate::context::MiddlewareContext;
use crate::middleware::{Flow, Middleware};
use crate::types::{Request, Response};

/// Proxy header listing the client and each proxy hop.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Proxy header carrying the client address.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Placeholder when no address is known.
pub const UNKNOWN_IP: &str = "unknown";

/// Stage that records one access-log line per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl AccessLog {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for AccessLog {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn on_request(&self, ctx: &mut MiddlewareContext, request: &Request) -> Flow {
        let ip = resolve_client_ip(request, ctx.remote_addr());
        ctx.set_client_ip(ip);
        Flow::Proceed
    }

    fn on_response(&self, ctx: &MiddlewareContext, response: &Response) {
        let status = response.status().as_u16();
        let latency = u64::try_from(ctx.elapsed().as_micros()).unwrap_or(u64::MAX);
        let method = ctx.method().as_str();
        let path = ctx.path();
        let ip = ctx.client_ip().unwrap_or(UNKNOWN_IP);
        let request_id = ctx.request_id();
        let level = level_for(response.status());

        ctx.logger().in_scope(|| {
            if level == Level::ERROR {
                tracing::error!(method, path, status, latency, ip, %request_id, "Request handled");
            } else if level == Level::WARN {
                tracing::warn!(method, path, status, latency, ip, %request_id, "Request handled");
            } else {
                tracing::info!(method, path, status, latency, ip, %request_id, "Request handled");
            }
        });
    }
}

/// Log level for a response status.
#[must_use]
pub fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Resolves the logical client address of `request`.
///
/// A header whose candidate does not parse as an IP address is skipped.
#[must_use]
pub fn resolve_client_ip(request: &Request, remote: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    };

    header(FORWARDED_FOR_HEADER)
        .and_then(|list| list.split(',').next())
        .and_then(parse_ip)
        .or_else(|| header(REAL_IP_HEADER).and_then(parse_ip))
        .or_else(|| remote.map(|addr| addr.ip()))
        .map_or_else(|| UNKNOWN_IP.to_string(), |ip| ip.to_string())
}

fn parse_ip(candidate: &str) -> Option<IpAddr> {
    candidate.trim().parse().ok()
}
