//! Route table and request dispatch.
//!
//! Public routes run through `AccessLog` only; protected routes run
//! through `AccessLog` then `Authenticate`. A request that matches no route
//! still goes through the public pipeline so it is access-logged and
//! answered with a translated 404.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use http::{Method, StatusCode};
use stepform_config::AppConfig;
use stepform_core::{ApiError, ApiResult, Logger, RequestContext};
use stepform_middleware::{
    AccessLog, Authenticate, BoxFuture, Pipeline, Request, Response, ResponseExt, TokenSigner,
};
use stepform_server::{Router, Service};
use uuid::Uuid;

use crate::handlers;
use crate::model::{Credentials, Links};
use crate::password::hash_password;
use crate::repository::InMemoryStore;
use crate::service::FormService;

/// Every endpoint the application answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `GET /health`
    Health,
    /// `POST {base}/login`
    Login,
    /// `POST {base}/form`
    CreateForm,
    /// `GET {base}/form/{formId}`
    GetForm,
    /// `PATCH {base}/form/{formId}`
    UpdateForm,
    /// `GET {base}/form/{formId}/steps/{stepId}`
    GetStep,
    /// `PATCH {base}/form/{formId}/steps/{stepId}`
    UpdateStep,
    /// `DELETE {base}/form/{formId}/steps/{stepId}`
    DeleteStep,
}

impl Route {
    /// Returns `true` for routes reachable without a bearer token.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Health | Self::Login)
    }
}

/// Builds the route table with API routes under `base_url`.
#[must_use]
pub fn routes(base_url: &str) -> Router<Route> {
    let base = base_url.trim_end_matches('/');
    let form = format!("{base}/form/{{formId}}");
    let step = format!("{form}/steps/{{stepId}}");

    let mut router = Router::new();
    router.add_route(Method::GET, "/health", Route::Health);
    router.add_route(Method::POST, format!("{base}/login"), Route::Login);
    router.add_route(Method::POST, format!("{base}/form"), Route::CreateForm);
    router.add_route(Method::GET, &form, Route::GetForm);
    router.add_route(Method::PATCH, &form, Route::UpdateForm);
    router.add_route(Method::GET, &step, Route::GetStep);
    router.add_route(Method::PATCH, &step, Route::UpdateStep);
    router.add_route(Method::DELETE, &step, Route::DeleteStep);
    router
}

/// The stepform HTTP application.
pub struct App {
    router: Router<Route>,
    service: FormService,
    public: Pipeline,
    protected: Pipeline,
}

impl App {
    /// Wires the application around `service`.
    #[must_use]
    pub fn new(service: FormService, signer: Arc<TokenSigner>, logger: Logger, base_url: &str) -> Self {
        let public = Pipeline::builder(logger.clone())
            .stage(AccessLog::new())
            .build();
        let protected = Pipeline::builder(logger)
            .stage(AccessLog::new())
            .stage(Authenticate::new(signer))
            .build();

        Self {
            router: routes(base_url),
            service,
            public,
            protected,
        }
    }

    /// Wires the application from loaded configuration over `store`.
    #[must_use]
    pub fn from_config(config: &AppConfig, store: Arc<InMemoryStore>, logger: Logger) -> Self {
        let signer = Arc::new(TokenSigner::with_ttl(
            config.auth.secret.as_bytes(),
            Duration::from_secs(config.auth.token_ttl_secs),
        ));
        let links = Links::new(&config.server.public_url, &config.server.base_url);
        let service = FormService::new(store.clone(), store, signer.clone(), links);

        Self::new(service, signer, logger, &config.server.base_url)
    }

    /// Answers one request.
    pub async fn handle(&self, request: Request) -> Response {
        let matched = self
            .router
            .match_route(request.method(), request.uri().path())
            .map(|m| (*m.route(), m.params().clone()));

        let Some((route, params)) = matched else {
            return self
                .public
                .process(request, |_ctx, _req| async {
                    Err::<Response, _>(ApiError::not_found())
                })
                .await;
        };

        let pipeline = if route.is_public() {
            &self.public
        } else {
            &self.protected
        };

        pipeline
            .process(request, |ctx, req| self.dispatch(route, params, ctx, req))
            .await
    }

    async fn dispatch(
        &self,
        route: Route,
        params: HashMap<String, String>,
        ctx: RequestContext,
        request: Request,
    ) -> ApiResult<Response> {
        let param = |name: &str| params.get(name).map_or("", String::as_str);
        let service = &self.service;

        match route {
            Route::Health => Ok(Response::json(
                StatusCode::OK,
                &serde_json::json!({ "status": "ok" }),
            )),
            Route::Login => handlers::login(service, request).await,
            Route::CreateForm => handlers::create_form(service, &ctx, request).await,
            Route::GetForm => handlers::get_form(service, param("formId")).await,
            Route::UpdateForm => handlers::update_form(service, param("formId"), request).await,
            Route::GetStep => handlers::get_step(service, param("formId"), param("stepId")).await,
            Route::UpdateStep => {
                handlers::update_step(service, param("formId"), param("stepId"), request).await
            }
            Route::DeleteStep => {
                handlers::delete_step(service, param("formId"), param("stepId")).await
            }
        }
    }
}

impl Service for App {
    fn call(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(self.handle(request))
    }
}

/// Registers a login identity with a freshly hashed password.
///
/// # Errors
///
/// Fails if hashing fails or the username is already registered.
pub fn seed_user(store: &InMemoryStore, username: &str, password: &str) -> anyhow::Result<Credentials> {
    let credentials = Credentials {
        id: Uuid::now_v7(),
        username: username.to_string(),
        password_hash: hash_password(password).context("failed to hash seed password")?,
    };
    store
        .insert_credentials(credentials.clone())
        .context("failed to register seed user")?;
    Ok(credentials)
}
