use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{CredentialsRepository, FormRepository, RepositoryError, RepositoryResult};
use crate::model::{Credentials, Form, FormStep};

#[derive(Debug, Default)]
struct Tables {
    forms: HashMap<Uuid, FormRow>,
    steps: HashMap<Uuid, FormStep>,
    credentials: HashMap<String, Credentials>,
}

/// A form without its steps, as stored.
#[derive(Debug, Clone)]
struct FormRow {
    name: String,
    open_tracking_enabled: bool,
    click_tracking_enabled: bool,
}

impl Tables {
    fn assemble(&self, id: Uuid, row: &FormRow) -> Form {
        let mut steps: Vec<FormStep> = self
            .steps
            .values()
            .filter(|step| step.form_id == id)
            .cloned()
            .collect();
        steps.sort_by_key(|step| (step.step_order, step.id));

        Form {
            id,
            name: row.name.clone(),
            open_tracking_enabled: row.open_tracking_enabled,
            click_tracking_enabled: row.click_tracking_enabled,
            steps,
        }
    }

    fn step_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.steps
            .values()
            .any(|step| step.name == name && Some(step.id) != except)
    }
}

/// Process-local store for forms, steps and credentials.
///
/// Form names and step names are unique across the store, and a form's
/// steps are removed only one at a time.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a login identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub fn insert_credentials(&self, credentials: Credentials) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        if tables.credentials.contains_key(&credentials.username) {
            return Err(RepositoryError::Conflict {
                entity: "credentials",
                field: "username",
                value: credentials.username,
            });
        }
        tables
            .credentials
            .insert(credentials.username.clone(), credentials);
        Ok(())
    }
}

#[async_trait]
impl FormRepository for InMemoryStore {
    async fn create_form(&self, form: Form) -> RepositoryResult<Form> {
        let mut tables = self.tables.write();

        if tables.forms.values().any(|row| row.name == form.name) {
            return Err(RepositoryError::Conflict {
                entity: "form",
                field: "name",
                value: form.name,
            });
        }

        for (i, step) in form.steps.iter().enumerate() {
            let repeated = form.steps[..i].iter().any(|s| s.name == step.name);
            if repeated || tables.step_name_taken(&step.name, None) {
                return Err(RepositoryError::Conflict {
                    entity: "form step",
                    field: "name",
                    value: step.name.clone(),
                });
            }
        }

        let row = FormRow {
            name: form.name.clone(),
            open_tracking_enabled: form.open_tracking_enabled,
            click_tracking_enabled: form.click_tracking_enabled,
        };
        tables.forms.insert(form.id, row.clone());
        for step in &form.steps {
            tables.steps.insert(
                step.id,
                FormStep {
                    form_id: form.id,
                    ..step.clone()
                },
            );
        }

        Ok(tables.assemble(form.id, &row))
    }

    async fn get_form(&self, id: Uuid) -> RepositoryResult<Form> {
        let tables = self.tables.read();
        let row = tables
            .forms
            .get(&id)
            .ok_or_else(|| RepositoryError::not_found("form", id))?;
        Ok(tables.assemble(id, row))
    }

    async fn update_form(&self, form: Form) -> RepositoryResult<Form> {
        let mut tables = self.tables.write();

        if tables
            .forms
            .iter()
            .any(|(id, row)| *id != form.id && row.name == form.name)
        {
            return Err(RepositoryError::Conflict {
                entity: "form",
                field: "name",
                value: form.name,
            });
        }

        let row = tables
            .forms
            .get_mut(&form.id)
            .ok_or_else(|| RepositoryError::not_found("form", form.id))?;
        row.name = form.name;
        row.open_tracking_enabled = form.open_tracking_enabled;
        row.click_tracking_enabled = form.click_tracking_enabled;

        let row = row.clone();
        Ok(tables.assemble(form.id, &row))
    }

    async fn get_step(&self, id: Uuid) -> RepositoryResult<FormStep> {
        self.tables
            .read()
            .steps
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("form step", id))
    }

    async fn update_step(&self, step: FormStep) -> RepositoryResult<FormStep> {
        let mut tables = self.tables.write();

        if tables.step_name_taken(&step.name, Some(step.id)) {
            return Err(RepositoryError::Conflict {
                entity: "form step",
                field: "name",
                value: step.name,
            });
        }

        let stored = tables
            .steps
            .get_mut(&step.id)
            .ok_or_else(|| RepositoryError::not_found("form step", step.id))?;
        stored.name = step.name;
        stored.content = step.content;

        Ok(stored.clone())
    }

    async fn delete_step(&self, id: Uuid) -> RepositoryResult<()> {
        self.tables
            .write()
            .steps
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("form step", id))
    }
}

#[async_trait]
impl CredentialsRepository for InMemoryStore {
    async fn get_credentials_by_username(&self, username: &str) -> RepositoryResult<Credentials> {
        self.tables
            .read()
            .credentials
            .get(username)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("credentials", username))
    }
}
