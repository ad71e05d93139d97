//! Ordered middleware pipeline.
//!
//! The driver owns the control flow. For each request it:
//!
//! 1. creates a [`MiddlewareContext`] bound to the pipeline's logger
//! 2. runs every stage's `on_request` in order, stopping at the first
//!    [`Flow::ShortCircuit`]
//! 3. otherwise calls the handler with an immutable [`RequestContext`]; an
//!    `Err` or a panic goes through the error translator
//! 4. runs `on_response` of every entered stage, in reverse order
//!
//! The whole request runs with the pipeline's logger as the current
//! dispatcher, so handler code can use the `tracing` macros directly.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use stepform_core::{ApiError, ApiResult, Logger, RequestContext};
use tracing::instrument::WithSubscriber;

use crate::context::MiddlewareContext;
use crate::middleware::{Flow, Middleware};
use crate::translate::translate;
use crate::types::{Request, Response};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of stages plus the logger they run under.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::builder(logger)
///     .stage(AccessLog::new())
///     .stage(Authenticate::new(signer))
///     .build();
///
/// let response = pipeline
///     .process(request, |ctx, req| async move { handle(ctx, req).await })
///     .await;
/// ```
pub struct Pipeline {
    logger: Logger,
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder(logger: Logger) -> PipelineBuilder {
        PipelineBuilder::new(logger)
    }

    /// Returns the logger every request runs under.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Processes a request through all stages and the handler.
    pub async fn process<H, Fut>(&self, request: Request, handler: H) -> Response
    where
        H: FnOnce(RequestContext, Request) -> Fut + Send,
        Fut: Future<Output = ApiResult<Response>> + Send,
    {
        self.run(request, handler)
            .with_subscriber(self.logger.dispatch().clone())
            .await
    }

    async fn run<H, Fut>(&self, request: Request, handler: H) -> Response
    where
        H: FnOnce(RequestContext, Request) -> Fut + Send,
        Fut: Future<Output = ApiResult<Response>> + Send,
    {
        let mut ctx = MiddlewareContext::new(self.logger.clone(), &request);

        let mut entered = 0;
        let mut short_circuit = None;
        for stage in &self.stages {
            entered += 1;
            if let Flow::ShortCircuit(response) = stage.on_request(&mut ctx, &request) {
                tracing::debug!(stage = stage.name(), request_id = %ctx.request_id(), "Pipeline short-circuited");
                short_circuit = Some(response);
                break;
            }
        }

        let response = match short_circuit {
            Some(response) => response,
            None => invoke(&ctx, request, handler).await,
        };

        for stage in self.stages[..entered].iter().rev() {
            stage.on_response(&ctx, &response);
        }

        response
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

async fn invoke<H, Fut>(ctx: &MiddlewareContext, request: Request, handler: H) -> Response
where
    H: FnOnce(RequestContext, Request) -> Fut + Send,
    Fut: Future<Output = ApiResult<Response>> + Send,
{
    let request_ctx = ctx.to_request_context();
    let handler_ctx = request_ctx.clone();

    let outcome = AssertUnwindSafe(async move { handler(handler_ctx, request).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(error)) => translate(&request_ctx, &error),
        Err(payload) => {
            let error = ApiError::unhandled(anyhow::anyhow!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            ));
            translate(&request_ctx, &error)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    logger: Logger,
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates a builder with no stages.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            stages: Vec::new(),
        }
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            logger: self.logger,
            stages: self.stages,
        }
    }
}
