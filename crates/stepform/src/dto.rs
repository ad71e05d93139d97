//! Wire types.
//!
//! Request bodies tolerate missing fields: an absent string decodes as
//! empty and is then reported by [`Validate`] under the field's name, so a
//! client learns which field to fill in rather than getting a decoder
//! error. Values of the wrong JSON type are still decoder errors.

use serde::{Deserialize, Serialize};
use stepform_core::{Validate, ValidationFailures};
use uuid::Uuid;

use crate::model::{Form, FormStep, Links};

/// `POST /login` body.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Authentication {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authentication")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Validate for Authentication {
    fn validate(&self) -> Result<(), ValidationFailures> {
        let mut failures = ValidationFailures::new();
        failures.require("Username", &self.username);
        failures.require("Password", &self.password);
        failures.into_result()
    }
}

/// `POST /login` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    /// Bearer token.
    pub token: String,
}

/// `POST /form` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormCreate {
    /// Unique form name.
    pub name: String,
    /// Defaults to `false`.
    pub open_tracking_enabled: Option<bool>,
    /// Defaults to `false`.
    pub click_tracking_enabled: Option<bool>,
    /// At least one step.
    pub steps: Vec<FormStepCreate>,
}

impl Validate for FormCreate {
    fn validate(&self) -> Result<(), ValidationFailures> {
        let mut failures = ValidationFailures::new();
        failures.require("Name", &self.name);
        failures.min("Steps", self.steps.len(), 1);

        for (i, step) in self.steps.iter().enumerate() {
            if let Err(inner) = step.validate() {
                failures.nested(&format!("Steps[{i}]"), inner);
            }
        }

        failures.into_result()
    }
}

/// One step in a [`FormCreate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormStepCreate {
    /// Unique step name.
    pub name: String,
    /// Step body.
    pub content: String,
    /// Position, starting at 1.
    pub step: i32,
}

impl Validate for FormStepCreate {
    fn validate(&self) -> Result<(), ValidationFailures> {
        let mut failures = ValidationFailures::new();
        failures.require("Name", &self.name);
        failures.require("Content", &self.content);
        failures.min("Step", self.step, 1);
        failures.into_result()
    }
}

/// `PATCH /form/{formId}` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormUpdate {
    /// New open tracking flag.
    pub open_tracking_enabled: Option<bool>,
    /// New click tracking flag.
    pub click_tracking_enabled: Option<bool>,
}

impl FormUpdate {
    /// Returns `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open_tracking_enabled.is_none() && self.click_tracking_enabled.is_none()
    }
}

impl Validate for FormUpdate {
    fn validate(&self) -> Result<(), ValidationFailures> {
        Ok(())
    }
}

/// `PATCH /form/{formId}/steps/{stepId}` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormStepUpdate {
    /// New name; must not be empty when given.
    pub name: Option<String>,
    /// New body.
    pub content: Option<String>,
}

impl FormStepUpdate {
    /// Returns `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.content.is_none()
    }
}

impl Validate for FormStepUpdate {
    fn validate(&self) -> Result<(), ValidationFailures> {
        let mut failures = ValidationFailures::new();
        if let Some(name) = &self.name {
            failures.min("Name", name.chars().count(), 1);
        }
        failures.into_result()
    }
}

/// Identifier plus absolute link of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfId {
    /// Resource identifier.
    pub id: String,
    /// Absolute URL of the resource.
    pub href: String,
}

/// A form as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponseGet {
    /// Form name.
    pub name: String,
    /// Open tracking flag.
    pub open_tracking_enabled: bool,
    /// Click tracking flag.
    pub click_tracking_enabled: bool,
    /// Steps in order.
    pub steps: Vec<FormStepResponseGet>,
    /// Link to this form.
    #[serde(rename = "self")]
    pub self_id: SelfId,
}

impl FormResponseGet {
    /// Renders `form` with links built by `links`.
    #[must_use]
    pub fn from_form(form: &Form, links: &Links) -> Self {
        Self {
            name: form.name.clone(),
            open_tracking_enabled: form.open_tracking_enabled,
            click_tracking_enabled: form.click_tracking_enabled,
            steps: form
                .steps
                .iter()
                .map(|step| FormStepResponseGet::from_step(step, links))
                .collect(),
            self_id: form_self_id(form.id, links),
        }
    }
}

/// A step as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStepResponseGet {
    /// Step name.
    pub name: String,
    /// Step body.
    pub content: String,
    /// Position within the form.
    pub step: i32,
    /// Link to this step.
    #[serde(rename = "self")]
    pub self_id: SelfId,
}

impl FormStepResponseGet {
    /// Renders `step` with a link built by `links`.
    #[must_use]
    pub fn from_step(step: &FormStep, links: &Links) -> Self {
        Self {
            name: step.name.clone(),
            content: step.content.clone(),
            step: step.step_order,
            self_id: SelfId {
                id: step.id.to_string(),
                href: links.step(step.form_id, step.id),
            },
        }
    }
}

/// Link to a form.
#[must_use]
pub fn form_self_id(form_id: Uuid, links: &Links) -> SelfId {
    SelfId {
        id: form_id.to_string(),
        href: links.form(form_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(result: Result<(), ValidationFailures>) -> Vec<(String, String)> {
        result
            .err()
            .map(|failures| {
                failures
                    .iter()
                    .map(|f| (f.field().to_string(), f.tag().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn step(name: &str, content: &str, step: i32) -> FormStepCreate {
        FormStepCreate {
            name: name.to_string(),
            content: content.to_string(),
            step,
        }
    }

    #[test]
    fn test_missing_fields_decode_as_empty() {
        let create: FormCreate = serde_json::from_str("{}").unwrap();
        assert_eq!(create, FormCreate::default());

        let failures = fields(create.validate());
        assert_eq!(
            failures,
            vec![
                ("Name".to_string(), "required".to_string()),
                ("Steps".to_string(), "min".to_string()),
            ]
        );
    }

    #[test]
    fn test_wrong_type_is_decode_error() {
        assert!(serde_json::from_str::<FormCreate>(r#"{"name": 5}"#).is_err());
        assert!(serde_json::from_str::<FormUpdate>(r#"{"openTrackingEnabled": "yes"}"#).is_err());
    }

    #[test]
    fn test_camel_case_wire_names() {
        let create: FormCreate = serde_json::from_str(
            r#"{"name":"F","openTrackingEnabled":true,"steps":[{"name":"s","content":"c","step":1}]}"#,
        )
        .unwrap();

        assert_eq!(create.open_tracking_enabled, Some(true));
        assert_eq!(create.click_tracking_enabled, None);
        assert_eq!(create.steps, vec![step("s", "c", 1)]);
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_nested_step_failures_are_indexed() {
        let create = FormCreate {
            name: "F".to_string(),
            steps: vec![step("ok", "ok", 1), step("", "c", 0)],
            ..FormCreate::default()
        };

        assert_eq!(
            fields(create.validate()),
            vec![
                ("Steps[1].Name".to_string(), "required".to_string()),
                ("Steps[1].Step".to_string(), "min".to_string()),
            ]
        );
    }

    #[test]
    fn test_authentication_required_fields() {
        let auth = Authentication::default();
        assert_eq!(
            fields(auth.validate()),
            vec![
                ("Username".to_string(), "required".to_string()),
                ("Password".to_string(), "required".to_string()),
            ]
        );
    }

    #[test]
    fn test_authentication_debug_hides_password() {
        let auth = Authentication {
            username: "user1".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{auth:?}").contains("hunter2"));
    }

    #[test]
    fn test_step_update_rules() {
        let empty_name = FormStepUpdate {
            name: Some(String::new()),
            content: None,
        };
        assert_eq!(
            fields(empty_name.validate()),
            vec![("Name".to_string(), "min".to_string())]
        );

        let content_only = FormStepUpdate {
            name: None,
            content: Some(String::new()),
        };
        assert!(content_only.validate().is_ok());
        assert!(!content_only.is_empty());
        assert!(FormStepUpdate::default().is_empty());
    }

    #[test]
    fn test_form_response_shape() {
        let links = Links::new("http://h", "/api/v1");
        let form_id = Uuid::from_u128(1);
        let step_id = Uuid::from_u128(2);
        let form = Form {
            id: form_id,
            name: "F".to_string(),
            open_tracking_enabled: true,
            click_tracking_enabled: false,
            steps: vec![FormStep {
                id: step_id,
                name: "s".to_string(),
                content: "c".to_string(),
                step_order: 1,
                form_id,
            }],
        };

        let json = serde_json::to_value(FormResponseGet::from_form(&form, &links)).unwrap();
        assert_eq!(json["name"], "F");
        assert_eq!(json["openTrackingEnabled"], true);
        assert_eq!(json["clickTrackingEnabled"], false);
        assert_eq!(json["self"]["id"], form_id.to_string());
        assert_eq!(json["self"]["href"], links.form(form_id));
        assert_eq!(json["steps"][0]["step"], 1);
        assert_eq!(json["steps"][0]["self"]["href"], links.step(form_id, step_id));
    }

    proptest! {
        #[test]
        fn prop_one_failure_per_bad_step_name(names in proptest::collection::vec("[a-z]{0,3}", 1..8)) {
            let create = FormCreate {
                name: "F".to_string(),
                steps: names.iter().map(|n| step(n, "c", 1)).collect(),
                ..FormCreate::default()
            };

            let expected: Vec<String> = names
                .iter()
                .enumerate()
                .filter(|(_, n)| n.is_empty())
                .map(|(i, _)| format!("Steps[{i}].Name"))
                .collect();

            let reported: Vec<String> = fields(create.validate()).into_iter().map(|(f, _)| f).collect();
            prop_assert_eq!(reported, expected);
        }
    }
}
