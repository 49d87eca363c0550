//! Client-side pre-flight validation of template submissions.
//!
//! Advisory only: the server stays authoritative. Errors are collected for
//! every property so a form can show all problems at once; only a failed
//! `required` check stops further checks of the same property.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::resource::{Template, TemplateProperty};

/// One problem with one submitted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(property: &TemplateProperty, message: String) -> Self {
        Self {
            field: property.name.clone(),
            message,
        }
    }
}

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"))
}

/// `null`, missing, `""` and `[]` are all empty.
pub(crate) fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Validate submitted data against the template's declared constraints.
pub fn validate_template_data(template: &Template, data: &Map<String, Value>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for property in &template.properties {
        validate_property(property, data.get(&property.name), &mut errors);
    }
    errors
}

fn validate_property(property: &TemplateProperty, value: Option<&Value>, errors: &mut Vec<ValidationError>) {
    let label = property.display_name();

    if is_empty_value(value) {
        if property.required {
            errors.push(ValidationError::new(property, format!("{label} is required")));
        }
        return;
    }
    let Some(value) = value else {
        return;
    };

    match property.property_type.to_ascii_lowercase().as_str() {
        "number" | "range" => match as_number(value) {
            Some(n) => {
                if let Some(min) = property.min {
                    if n < min {
                        errors.push(ValidationError::new(
                            property,
                            format!("{label} must be at least {min}"),
                        ));
                    }
                }
                if let Some(max) = property.max {
                    if n > max {
                        errors.push(ValidationError::new(
                            property,
                            format!("{label} must be at most {max}"),
                        ));
                    }
                }
            }
            None => errors.push(ValidationError::new(property, format!("{label} must be a number"))),
        },
        "email" => {
            if !value.as_str().is_some_and(|s| email_shape().is_match(s)) {
                errors.push(ValidationError::new(
                    property,
                    format!("{label} must be a valid email address"),
                ));
            }
        }
        "url" => {
            if !value.as_str().is_some_and(|s| Url::parse(s).is_ok()) {
                errors.push(ValidationError::new(property, format!("{label} must be a valid URL")));
            }
        }
        _ => {}
    }

    if let Some(s) = value.as_str() {
        let len = s.chars().count();
        if let Some(min_length) = property.min_length {
            if len < min_length {
                errors.push(ValidationError::new(
                    property,
                    format!("{label} must be at least {min_length} characters"),
                ));
            }
        }
        if let Some(max_length) = property.max_length {
            if len > max_length {
                errors.push(ValidationError::new(
                    property,
                    format!("{label} must be at most {max_length} characters"),
                ));
            }
        }

        if let Some(pattern) = &property.regex {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    errors.push(ValidationError::new(property, format!("{label} has an invalid format")));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(field = %property.name, pattern = %pattern, error = %e, "skipping invalid regex");
                }
            }
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
