//! Business rules for login, forms and steps.
//!
//! Every operation returns a classified [`ApiError`]; repository and
//! infrastructure failures are wrapped so their cause reaches the log but
//! never the client. Identifiers arrive as raw path segments. One that is
//! not a UUID names a resource that cannot exist and is answered as
//! not found.

use std::sync::Arc;

use stepform_core::{ApiError, ApiResult, ErrorKind};
use stepform_middleware::TokenSigner;
use uuid::Uuid;

use crate::dto::{
    form_self_id, Authentication, FormCreate, FormResponseGet, FormStepResponseGet,
    FormStepUpdate, FormUpdate, SelfId,
};
use crate::model::{Form, FormStep, Links};
use crate::password::verify_password;
use crate::repository::{CredentialsRepository, FormRepository, RepositoryError};

/// The application's use cases.
pub struct FormService {
    forms: Arc<dyn FormRepository>,
    credentials: Arc<dyn CredentialsRepository>,
    signer: Arc<TokenSigner>,
    links: Links,
}

impl FormService {
    /// Creates the service.
    pub fn new(
        forms: Arc<dyn FormRepository>,
        credentials: Arc<dyn CredentialsRepository>,
        signer: Arc<TokenSigner>,
        links: Links,
    ) -> Self {
        Self {
            forms,
            credentials,
            signer,
            links,
        }
    }

    /// Exchanges a username and password for a bearer token.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn login(&self, request: Authentication) -> ApiResult<String> {
        let user = match self
            .credentials
            .get_credentials_by_username(&request.username)
            .await
        {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                tracing::debug!(username = %request.username, "Login for unknown user");
                return Err(ApiError::invalid_credentials());
            }
            Err(e) => return Err(ApiError::internal(e)),
        };

        if !verify_password(&request.password, &user.password_hash).map_err(ApiError::internal)? {
            tracing::debug!(username = %request.username, "Password mismatch attempt");
            return Err(ApiError::invalid_credentials());
        }

        let token = self
            .signer
            .issue(&user.id.to_string(), &user.username)
            .map_err(ApiError::internal)?;

        tracing::debug!(username = %user.username, "User authenticated successfully");
        Ok(token)
    }

    /// Creates a form with its steps. Unset tracking flags are `false`.
    pub async fn create_form(&self, request: FormCreate) -> ApiResult<SelfId> {
        let form_id = Uuid::now_v7();
        let form = Form {
            id: form_id,
            name: request.name,
            open_tracking_enabled: request.open_tracking_enabled.unwrap_or(false),
            click_tracking_enabled: request.click_tracking_enabled.unwrap_or(false),
            steps: request
                .steps
                .into_iter()
                .map(|step| FormStep {
                    id: Uuid::now_v7(),
                    name: step.name,
                    content: step.content,
                    step_order: step.step,
                    form_id,
                })
                .collect(),
        };

        let created = self.forms.create_form(form).await.map_err(classify)?;

        tracing::debug!(form_id = %created.id, "Form created successfully");
        Ok(form_self_id(created.id, &self.links))
    }

    /// Loads a form with its ordered steps.
    pub async fn get_form(&self, form_id: &str) -> ApiResult<FormResponseGet> {
        let form = self.load_form(form_id).await?;
        Ok(FormResponseGet::from_form(&form, &self.links))
    }

    /// Changes a form's tracking flags.
    ///
    /// The form must exist before an empty update is rejected.
    pub async fn update_form(&self, form_id: &str, update: FormUpdate) -> ApiResult<FormResponseGet> {
        let mut form = self.load_form(form_id).await?;

        if update.is_empty() {
            tracing::debug!(%form_id, "No fields to update in form");
            return Err(ApiError::invalid_input());
        }

        if let Some(enabled) = update.open_tracking_enabled {
            form.open_tracking_enabled = enabled;
        }
        if let Some(enabled) = update.click_tracking_enabled {
            form.click_tracking_enabled = enabled;
        }

        let updated = self.forms.update_form(form).await.map_err(classify)?;

        tracing::debug!(%form_id, "Form updated successfully");
        Ok(FormResponseGet::from_form(&updated, &self.links))
    }

    /// Loads one step of a form.
    pub async fn get_step(&self, form_id: &str, step_id: &str) -> ApiResult<FormStepResponseGet> {
        let step = self.load_step(form_id, step_id).await?;
        Ok(FormStepResponseGet::from_step(&step, &self.links))
    }

    /// Changes a step's name and/or content.
    pub async fn update_step(
        &self,
        form_id: &str,
        step_id: &str,
        update: FormStepUpdate,
    ) -> ApiResult<FormStepResponseGet> {
        let mut step = self.load_step(form_id, step_id).await?;

        if update.is_empty() {
            tracing::debug!(%step_id, "No fields to update in form step");
            return Err(ApiError::invalid_input());
        }

        if let Some(name) = update.name {
            step.name = name;
        }
        if let Some(content) = update.content {
            step.content = content;
        }

        let updated = self.forms.update_step(step).await.map_err(classify)?;

        tracing::debug!(%step_id, "Form step updated successfully");
        Ok(FormStepResponseGet::from_step(&updated, &self.links))
    }

    /// Removes one step of a form.
    pub async fn delete_step(&self, form_id: &str, step_id: &str) -> ApiResult<()> {
        let step = self.load_step(form_id, step_id).await?;
        self.forms.delete_step(step.id).await.map_err(classify)?;

        tracing::debug!(%step_id, "Form step deleted successfully");
        Ok(())
    }

    async fn load_form(&self, form_id: &str) -> ApiResult<Form> {
        let id = parse_id(form_id)?;
        self.forms.get_form(id).await.map_err(classify)
    }

    /// Loads a step and checks that it belongs to `form_id`.
    async fn load_step(&self, form_id: &str, step_id: &str) -> ApiResult<FormStep> {
        let form_id = parse_id(form_id)?;
        let step = self.forms.get_step(parse_id(step_id)?).await.map_err(classify)?;

        if step.form_id != form_id {
            tracing::debug!(%step_id, %form_id, "Step does not belong to the specified form");
            return Err(ApiError::with_source(
                ErrorKind::ResourceNotFound,
                anyhow::anyhow!("step {step_id} belongs to form {}", step.form_id),
            ));
        }

        Ok(step)
    }
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| ApiError::with_source(ErrorKind::ResourceNotFound, e))
}

fn classify(error: RepositoryError) -> ApiError {
    if error.is_not_found() {
        ApiError::with_source(ErrorKind::ResourceNotFound, error)
    } else {
        ApiError::internal(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::FormStepCreate;
    use crate::model::Credentials;
    use crate::password::hash_password;
    use crate::repository::InMemoryStore;

    const KEY: &[u8] = b"service-test-key";

    fn service() -> FormService {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_credentials(Credentials {
                id: Uuid::now_v7(),
                username: "user1".to_string(),
                password_hash: hash_password("password123").unwrap(),
            })
            .unwrap();

        FormService::new(
            store.clone(),
            store,
            Arc::new(TokenSigner::new(KEY)),
            Links::new("http://localhost:8080", "/api/v1"),
        )
    }

    fn create_request(name: &str, steps: &[(&str, i32)]) -> FormCreate {
        FormCreate {
            name: name.to_string(),
            open_tracking_enabled: Some(true),
            click_tracking_enabled: None,
            steps: steps
                .iter()
                .map(|(step_name, order)| FormStepCreate {
                    name: (*step_name).to_string(),
                    content: format!("{step_name} content"),
                    step: *order,
                })
                .collect(),
        }
    }

    fn login(username: &str, password: &str) -> Authentication {
        Authentication {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn kind(result: ApiResult<impl std::fmt::Debug>) -> Option<ErrorKind> {
        result.unwrap_err().kind()
    }

    #[tokio::test]
    async fn test_login() {
        let service = service();

        let token = service.login(login("user1", "password123")).await.unwrap();
        let claims = TokenSigner::new(KEY).verify(&token).unwrap();
        assert_eq!(claims.username, "user1");

        assert_eq!(
            kind(service.login(login("user1", "wrong")).await),
            Some(ErrorKind::InvalidCredentials)
        );
        assert_eq!(
            kind(service.login(login("nobody", "password123")).await),
            Some(ErrorKind::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();
        let created = service
            .create_form(create_request("F", &[("two", 2), ("one", 1)]))
            .await
            .unwrap();
        assert_eq!(
            created.href,
            format!("http://localhost:8080/api/v1/form/{}", created.id)
        );

        let form = service.get_form(&created.id).await.unwrap();
        assert_eq!(form.name, "F");
        assert!(form.open_tracking_enabled);
        assert!(!form.click_tracking_enabled);
        let steps: Vec<_> = form.steps.iter().map(|s| s.step).collect();
        assert_eq!(steps, [1, 2]);
    }

    #[tokio::test]
    async fn test_duplicate_form_name_is_internal() {
        let service = service();
        service.create_form(create_request("F", &[("a", 1)])).await.unwrap();

        assert_eq!(
            kind(service.create_form(create_request("F", &[("b", 1)])).await),
            Some(ErrorKind::InvalidApplicationState)
        );
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let service = service();

        assert_eq!(
            kind(service.get_form(&Uuid::now_v7().to_string()).await),
            Some(ErrorKind::ResourceNotFound)
        );
        assert_eq!(
            kind(service.get_form("not-a-uuid").await),
            Some(ErrorKind::ResourceNotFound)
        );
        assert_eq!(
            kind(service.get_step("not-a-uuid", "also-not").await),
            Some(ErrorKind::ResourceNotFound)
        );
    }

    #[tokio::test]
    async fn test_update_form() {
        let service = service();
        let created = service.create_form(create_request("F", &[("a", 1)])).await.unwrap();

        let updated = service
            .update_form(
                &created.id,
                FormUpdate {
                    click_tracking_enabled: Some(true),
                    ..FormUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.click_tracking_enabled);
        assert!(updated.open_tracking_enabled);

        assert_eq!(
            kind(service.update_form(&created.id, FormUpdate::default()).await),
            Some(ErrorKind::InvalidInput)
        );
    }

    #[tokio::test]
    async fn test_empty_update_of_missing_form_is_not_found() {
        let service = service();
        assert_eq!(
            kind(
                service
                    .update_form(&Uuid::now_v7().to_string(), FormUpdate::default())
                    .await
            ),
            Some(ErrorKind::ResourceNotFound)
        );
    }

    #[tokio::test]
    async fn test_step_lifecycle() {
        let service = service();
        let created = service.create_form(create_request("F", &[("a", 1)])).await.unwrap();
        let step_id = service.get_form(&created.id).await.unwrap().steps[0]
            .self_id
            .id
            .clone();

        let updated = service
            .update_step(
                &created.id,
                &step_id,
                FormStepUpdate {
                    name: None,
                    content: Some("Updated Content".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "Updated Content");
        assert_eq!(updated.name, "a");

        assert_eq!(
            kind(
                service
                    .update_step(&created.id, &step_id, FormStepUpdate::default())
                    .await
            ),
            Some(ErrorKind::InvalidInput)
        );

        service.delete_step(&created.id, &step_id).await.unwrap();
        assert_eq!(
            kind(service.get_step(&created.id, &step_id).await),
            Some(ErrorKind::ResourceNotFound)
        );
    }

    #[tokio::test]
    async fn test_step_of_other_form_is_not_found() {
        let service = service();
        let first = service.create_form(create_request("F", &[("a", 1)])).await.unwrap();
        let second = service.create_form(create_request("G", &[("b", 1)])).await.unwrap();
        let step_id = service.get_form(&first.id).await.unwrap().steps[0]
            .self_id
            .id
            .clone();

        assert_eq!(
            kind(service.get_step(&second.id, &step_id).await),
            Some(ErrorKind::ResourceNotFound)
        );
        assert_eq!(
            kind(service.delete_step(&second.id, &step_id).await),
            Some(ErrorKind::ResourceNotFound)
        );

        // Still there under its own form.
        assert!(service.get_step(&first.id, &step_id).await.is_ok());
    }
}
