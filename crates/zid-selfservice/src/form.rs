//! HTML-form-shaped configuration rendered by a flow's methods.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the hidden anti-CSRF form field.
pub const CSRF_TOKEN_FIELD: &str = "csrf_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormError {
    pub message: String,
}

impl FormError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A single form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FormError>,
}

impl FormField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            value: None,
            required: false,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// What a client needs to render and submit one login method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMethodConfig {
    /// Submission target
    pub action: String,
    /// HTTP method of the submission
    pub method: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Errors not tied to a particular field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FormError>,
}

impl RequestMethodConfig {
    /// A `POST` form submitting to `action`.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            method: "POST".to_string(),
            fields: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.set_field(field);
        self
    }

    /// Insert `field`, replacing a field of the same name.
    pub fn set_field(&mut self, field: FormField) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Set the value of `name`, adding a text field if none exists.
    pub fn set_value(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = Some(value),
            None => {
                let mut field = FormField::new(name, "text");
                field.value = Some(value);
                self.fields.push(field);
            }
        }
    }

    /// Add the hidden anti-CSRF field carrying `token`.
    pub fn set_csrf(&mut self, token: &str) {
        let mut field = FormField::new(CSRF_TOKEN_FIELD, "hidden").required();
        field.value = Some(Value::String(token.to_string()));
        self.set_field(field);
    }

    /// Attach an error to field `name`, or to the form itself when `name` is
    /// `None` or names no field.
    pub fn add_error(&mut self, name: Option<&str>, message: impl Into<String>) {
        let error = FormError::new(message);
        match name.and_then(|n| self.fields.iter_mut().find(|f| f.name == n)) {
            Some(field) => field.errors.push(error),
            None => self.errors.push(error),
        }
    }

    pub fn reset_errors(&mut self) {
        self.errors.clear();
        for field in &mut self.fields {
            field.errors.clear();
        }
    }

    /// Clear every value except the anti-CSRF token, and all errors.
    pub fn reset(&mut self) {
        self.reset_errors();
        for field in &mut self.fields {
            if field.name != CSRF_TOKEN_FIELD {
                field.value = None;
            }
        }
    }
}
