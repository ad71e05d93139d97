//! HTTP handlers.
//!
//! Each handler decodes and validates its body, calls [`FormService`] and
//! renders the result. Failures are returned as [`ApiError`] and answered by
//! the pipeline's error translator.

use http::StatusCode;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use stepform_core::{ApiError, ApiResult, RequestContext, Validate};
use stepform_middleware::{BodyError, Request, Response, ResponseExt};

use crate::dto::{Authentication, AuthenticationResponse, FormCreate, FormStepUpdate, FormUpdate};
use crate::service::FormService;

/// Decodes a JSON body and validates it.
///
/// # Errors
///
/// Returns `InvalidRequestBody` if the server could not collect the body or
/// it is not valid JSON for `T`, and a validation error if `T` rejects it.
pub async fn decode_json<T>(request: Request) -> ApiResult<T>
where
    T: DeserializeOwned + Validate,
{
    if let Some(failure) = request.extensions().get::<BodyError>() {
        return Err(ApiError::invalid_body(failure.clone()));
    }

    let bytes = request
        .into_body()
        .collect()
        .await
        .map_err(ApiError::invalid_body)?
        .to_bytes();

    let value: T = serde_json::from_slice(&bytes).map_err(ApiError::invalid_body)?;
    value.validate()?;
    Ok(value)
}

/// `POST /login`
pub async fn login(service: &FormService, request: Request) -> ApiResult<Response> {
    let credentials: Authentication = decode_json(request).await?;
    let token = service.login(credentials).await?;
    Ok(Response::json(StatusCode::OK, &AuthenticationResponse { token }))
}

/// `POST /form`
pub async fn create_form(
    service: &FormService,
    ctx: &RequestContext,
    request: Request,
) -> ApiResult<Response> {
    let claims = ctx.require_claims()?;
    let body: FormCreate = decode_json(request).await?;

    tracing::debug!(user = %claims.username, form = %body.name, "Creating form");
    let created = service.create_form(body).await?;
    Ok(Response::json(StatusCode::CREATED, &created))
}

/// `GET /form/{formId}`
pub async fn get_form(service: &FormService, form_id: &str) -> ApiResult<Response> {
    let form = service.get_form(form_id).await?;
    Ok(Response::json(StatusCode::OK, &form))
}

/// `PATCH /form/{formId}`
pub async fn update_form(
    service: &FormService,
    form_id: &str,
    request: Request,
) -> ApiResult<Response> {
    let body: FormUpdate = decode_json(request).await?;
    let form = service.update_form(form_id, body).await?;
    Ok(Response::json(StatusCode::OK, &form))
}

/// `GET /form/{formId}/steps/{stepId}`
pub async fn get_step(service: &FormService, form_id: &str, step_id: &str) -> ApiResult<Response> {
    let step = service.get_step(form_id, step_id).await?;
    Ok(Response::json(StatusCode::OK, &step))
}

/// `PATCH /form/{formId}/steps/{stepId}`
pub async fn update_step(
    service: &FormService,
    form_id: &str,
    step_id: &str,
    request: Request,
) -> ApiResult<Response> {
    let body: FormStepUpdate = decode_json(request).await?;
    let step = service.update_step(form_id, step_id, body).await?;
    Ok(Response::json(StatusCode::OK, &step))
}

/// `DELETE /form/{formId}/steps/{stepId}`
pub async fn delete_step(
    service: &FormService,
    form_id: &str,
    step_id: &str,
) -> ApiResult<Response> {
    service.delete_step(form_id, step_id).await?;
    Ok(Response::empty(StatusCode::NO_CONTENT))
}
