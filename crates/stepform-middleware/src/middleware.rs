//! Core middleware trait and types.
//!
//! A stage does not call the rest of the chain itself. It inspects the
//! request once on the way in and answers with a [`Flow`]; the
//! [`Pipeline`](crate::Pipeline) driver decides what runs next. On the way
//! out, every stage that was entered sees the final response.
//!
//! # Example
//!
//! ```
//! use stepform_middleware::{Flow, Middleware, MiddlewareContext, Request, Response, ResponseExt};
//! use http::StatusCode;
//!
//! struct RequireJson;
//!
//! impl Middleware for RequireJson {
//!     fn name(&self) -> &'static str {
//!         "require_json"
//!     }
//!
//!     fn on_request(&self, _ctx: &mut MiddlewareContext, request: &Request) -> Flow {
//!         if request.headers().contains_key(http::header::CONTENT_TYPE) {
//!             Flow::Proceed
//!         } else {
//!             Flow::ShortCircuit(Response::empty(StatusCode::UNSUPPORTED_MEDIA_TYPE))
//!         }
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};

/// A boxed future that returns `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a stage's request hook.
#[derive(Debug)]
pub enum Flow {
    /// Continue with the next stage, or the handler after the last one.
    Proceed,
    /// Stop here and answer with this response. No later stage and no
    /// handler runs.
    ShortCircuit(Response),
}

impl Flow {
    /// Returns `true` for [`Flow::ShortCircuit`].
    #[must_use]
    pub const fn is_short_circuit(&self) -> bool {
        matches!(self, Self::ShortCircuit(_))
    }
}

/// A pipeline stage.
///
/// # Invariants
///
/// - `on_request` runs at most once per request, in pipeline order
/// - `on_response` runs exactly once for every stage whose `on_request` ran,
///   in reverse order, including the stage that short-circuited
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Inspects the request and may enrich the context.
    fn on_request(&self, _ctx: &mut MiddlewareContext, _request: &Request) -> Flow {
        Flow::Proceed
    }

    /// Observes the final response.
    fn on_response(&self, _ctx: &MiddlewareContext, _response: &Response) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseExt;
    use http::StatusCode;

    struct Passive;

    impl Middleware for Passive {
        fn name(&self) -> &'static str {
            "passive"
        }
    }

    #[test]
    fn test_default_hooks_proceed() {
        let request: Request = http::Request::builder()
            .uri("/test")
            .body(http_body_util::Full::default())
            .unwrap();
        let mut ctx = MiddlewareContext::new(stepform_core::Logger::disabled(), &request);

        let flow = Passive.on_request(&mut ctx, &request);
        assert!(!flow.is_short_circuit());
        Passive.on_response(&ctx, &Response::empty(StatusCode::OK));
    }

    #[test]
    fn test_short_circuit_carries_response() {
        let flow = Flow::ShortCircuit(Response::empty(StatusCode::UNAUTHORIZED));
        match flow {
            Flow::ShortCircuit(response) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
            Flow::Proceed => panic!("expected short circuit"),
        }
    }
}
