//! Form definitions and the rules applied to them.
//!
//! A form is an ordered list of [`FormField`]s plus [`FormSettings`], both stored as JSON on the
//! `forms` row. This module checks definitions when they are saved ([`validate_definition`]) and
//! checks public submissions against the definition before they are stored
//! ([`validate_submission`]).
//!
//! Submission data is a JSON object keyed by field id. Values are considered *empty* when absent,
//! `null`, an empty string or an empty array; `false` and `0` are answers.

use std::collections::HashSet;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::errors::Error;
use crate::validation::{is_hex_color, is_valid_email};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Number,
    Date,
    Select,
    Multiselect,
    Checkbox,
    Radio,
    File,
    /// Visual divider, never carries a value
    Section,
}

impl FieldType {
    /// Field types that must declare at least one option
    pub fn requires_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Multiselect | FieldType::Radio)
    }

    /// Free-text types where `validation.min/max` bound the length
    fn is_text_like(self) -> bool {
        matches!(self, FieldType::Text | FieldType::Textarea | FieldType::Email | FieldType::Phone)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression the value must match (unanchored)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Choices for select, multiselect, radio and checkbox fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, alias = "helpText", skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl FormField {
    fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Theme {
    #[serde(default, alias = "primaryColor", skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, alias = "backgroundColor", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormSettings {
    #[serde(default, alias = "submitButtonText", skip_serializing_if = "Option::is_none")]
    pub submit_button_text: Option<String>,
    #[serde(default, alias = "successMessage", skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(default, alias = "notificationEmail", skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
    /// When explicitly `false`, one submission per respondent email
    #[serde(default, alias = "allowMultipleSubmissions", skip_serializing_if = "Option::is_none")]
    pub allow_multiple_submissions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

impl FormSettings {
    pub fn allows_multiple_submissions(&self) -> bool {
        self.allow_multiple_submissions != Some(false)
    }
}

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest { message: message.into() }
}

/// Check a form definition before it is stored.
pub fn validate_definition(title: &str, fields: &[FormField], settings: &FormSettings) -> Result<(), Error> {
    if title.trim().is_empty() {
        return Err(bad_request("Form title cannot be empty"));
    }

    let mut seen = HashSet::new();
    for (position, field) in fields.iter().enumerate() {
        let position = position + 1;
        if field.id.trim().is_empty() {
            return Err(bad_request(format!("Field {position} is missing an id")));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(bad_request(format!("Duplicate field id '{}'", field.id)));
        }
        if field.label.trim().is_empty() {
            return Err(bad_request(format!("Field '{}' needs a label", field.id)));
        }
        if field.field_type.requires_options() && field.options().is_empty() {
            return Err(bad_request(format!("Field '{}' needs at least one option", field.label)));
        }

        if let Some(validation) = &field.validation {
            if let (Some(min), Some(max)) = (validation.min, validation.max)
                && min > max
            {
                return Err(bad_request(format!(
                    "Field '{}' has a minimum ({min}) greater than its maximum ({max})",
                    field.label
                )));
            }
            if let Some(pattern) = &validation.pattern
                && Regex::new(pattern).is_err()
            {
                return Err(bad_request(format!("Field '{}' has an invalid pattern", field.label)));
            }
        }
    }

    if let Some(email) = &settings.notification_email
        && !email.is_empty()
        && !is_valid_email(email)
    {
        return Err(bad_request("Notification email must be a valid email address"));
    }
    if let Some(theme) = &settings.theme {
        for colour in [&theme.primary_color, &theme.background_color].into_iter().flatten() {
            if !is_hex_color(colour) {
                return Err(bad_request(format!("Theme colour '{colour}' must be a #rrggbb hex colour")));
            }
        }
    }

    Ok(())
}

/// Whether a submitted value counts as "not answered"
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Validate submitted data against a form's fields.
///
/// Returns the data restricted to the form's (non-section) field ids. Missing required fields
/// are reported together, in field order; otherwise every type error is reported.
pub fn validate_submission(fields: &[FormField], data: &Map<String, Value>) -> Result<Map<String, Value>, Error> {
    let answerable = || fields.iter().filter(|f| f.field_type != FieldType::Section);

    let missing: Vec<&str> = answerable()
        .filter(|f| f.required && is_empty_value(data.get(&f.id)))
        .map(|f| f.label.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(bad_request(format!("Please fill in required fields: {}", missing.join(", "))));
    }

    let mut problems = Vec::new();
    let mut cleaned = Map::new();
    for field in answerable() {
        let Some(value) = data.get(&field.id) else {
            continue;
        };
        if !is_empty_value(Some(value)) {
            check_value(field, value, &mut problems)?;
        }
        let value = match (field.field_type, checkbox_flag(value)) {
            (FieldType::Checkbox, Some(flag)) => Value::Bool(flag),
            _ => value.clone(),
        };
        cleaned.insert(field.id.clone(), value);
    }

    if problems.is_empty() {
        Ok(cleaned)
    } else {
        Err(bad_request(problems.join("; ")))
    }
}

fn check_value(field: &FormField, value: &Value, problems: &mut Vec<String>) -> Result<(), Error> {
    let label = &field.label;
    let validation = field.validation.clone().unwrap_or_default();

    match field.field_type {
        FieldType::Number => match as_number(value) {
            None => problems.push(format!("{label} must be a number")),
            Some(n) => {
                if validation.min.is_some_and(|min| n < min) || validation.max.is_some_and(|max| n > max) {
                    problems.push(format!("{label} must be {}", describe_range(&validation)));
                }
            }
        },
        FieldType::Select | FieldType::Radio => match value.as_str() {
            Some(choice) if field.options().iter().any(|o| o == choice) => {}
            _ => problems.push(format!("{label} must be one of the listed options")),
        },
        FieldType::Multiselect => {
            if !is_subset_of_options(value, field.options()) {
                problems.push(format!("{label} must only contain listed options"));
            }
        }
        FieldType::Checkbox => {
            let ok = checkbox_flag(value).is_some() || (!field.options().is_empty() && is_subset_of_options(value, field.options()));
            if !ok {
                problems.push(format!("{label} has an invalid selection"));
            }
        }
        FieldType::Date => match value.as_str() {
            Some(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {}
            _ => problems.push(format!("{label} must be a date (YYYY-MM-DD)")),
        },
        t if t.is_text_like() => {
            let Some(text) = value.as_str() else {
                problems.push(format!("{label} must be text"));
                return Ok(());
            };
            if t == FieldType::Email && !is_valid_email(text) {
                problems.push(format!("{label} must be a valid email address"));
            }
            let length = text.chars().count() as f64;
            if validation.min.is_some_and(|min| length < min) || validation.max.is_some_and(|max| length > max) {
                problems.push(format!("{label} must be {} characters long", describe_range(&validation)));
            }
            if let Some(pattern) = &validation.pattern {
                let re = Regex::new(pattern).map_err(|e| Error::Internal {
                    operation: format!("compile pattern for field {}: {e}", field.id),
                })?;
                if !re.is_match(text) {
                    problems.push(format!("{label} is not in the expected format"));
                }
            }
        }
        // Files are stored by reference; no shape is imposed
        _ => {}
    }
    Ok(())
}

/// A single checkbox answer: a boolean, or the string form an HTML checkbox posts
pub fn checkbox_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        _ => None,
    }
}

/// Numbers, or strings holding a number (HTML inputs submit strings)
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_subset_of_options(value: &Value, options: &[String]) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(|item| item.as_str().is_some_and(|s| options.iter().any(|o| o == s))))
}

fn describe_range(validation: &FieldValidation) -> String {
    match (validation.min, validation.max) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "valid".to_string(),
    }
}
