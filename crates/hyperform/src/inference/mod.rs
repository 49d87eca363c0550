//! Display-schema inference for untyped JSON fields.
//!
//! A field's display type comes from a fixed ladder, first match wins:
//!
//! 1. explicit per-field override from [`InferenceOptions`],
//! 2. hidden naming conventions (secrets, `_`-prefixed internals),
//! 3. boolean / date / badge / url / email / code naming conventions,
//! 4. the shape of the first non-null sampled value,
//! 5. `text`.
//!
//! Inference holds no shared state: the same name, samples and options
//! always yield the same answer, independent of other fields.

pub mod columns;
pub mod conventions;
pub mod label;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub use columns::{infer_columns, is_sortable, ColumnOrdering, InferredField};
pub use conventions::{FieldConventions, PartialConventions};
pub use label::humanize_label;

/// Default number of items sampled by [`infer_columns`].
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Semantic display type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Code,
    Badge,
    Boolean,
    Url,
    Email,
    Hidden,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Code => "code",
            Self::Badge => "badge",
            Self::Boolean => "boolean",
            Self::Url => "url",
            Self::Email => "email",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller knobs for inference.
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Field name → forced type.
    pub overrides: BTreeMap<String, FieldType>,
    /// Field name → forced label.
    pub labels: BTreeMap<String, String>,
    pub conventions: FieldConventions,
    /// Items inspected by [`infer_columns`].
    pub sample_size: usize,
    pub ordering: ColumnOrdering,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            labels: BTreeMap::new(),
            conventions: FieldConventions::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            ordering: ColumnOrdering::Positional,
        }
    }
}

impl InferenceOptions {
    pub fn with_override(mut self, field: impl Into<String>, ty: FieldType) -> Self {
        self.overrides.insert(field.into(), ty);
        self
    }

    pub fn with_label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    pub fn with_ordering(mut self, ordering: ColumnOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Extend the default conventions with caller patterns.
    pub fn with_conventions(mut self, partial: &PartialConventions) -> Result<Self, regex::Error> {
        self.conventions.extend(partial)?;
        Ok(self)
    }

    /// The label for `field`: caller override or humanized name.
    pub fn label_for(&self, field: &str) -> String {
        self.labels
            .get(field)
            .cloned()
            .unwrap_or_else(|| humanize_label(field))
    }
}

/// Infer the display type of one field.
pub fn infer_field_type(name: &str, samples: &[Value], options: &InferenceOptions) -> FieldType {
    if let Some(ty) = options.overrides.get(name) {
        return *ty;
    }

    if let Some(ty) = options.conventions.match_name(name) {
        return ty;
    }

    samples
        .iter()
        .find(|v| !v.is_null())
        .and_then(infer_from_value)
        .unwrap_or(FieldType::Text)
}

fn uuid_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("uuid regex is valid")
    })
}

fn hex_hash_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[0-9a-f]{24,}$").expect("hex hash regex is valid"))
}

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y"];

fn looks_like_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(s, f).is_ok())
        || DATE_FORMATS.iter().any(|f| NaiveDate::parse_from_str(s, f).is_ok())
}

fn looks_like_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

fn infer_from_value(value: &Value) -> Option<FieldType> {
    match value {
        Value::Bool(_) => Some(FieldType::Boolean),
        Value::Number(_) => Some(FieldType::Number),
        Value::String(s) => {
            let s = s.trim();
            if looks_like_date(s) {
                Some(FieldType::Date)
            } else if looks_like_url(s) {
                Some(FieldType::Url)
            } else if email_shape().is_match(s) {
                Some(FieldType::Email)
            } else if uuid_shape().is_match(s) || hex_hash_shape().is_match(s) {
                Some(FieldType::Code)
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(name: &str, samples: &[Value]) -> FieldType {
        infer_field_type(name, samples, &InferenceOptions::default())
    }

    #[test]
    fn test_name_conventions() {
        assert_eq!(infer("createdAt", &[]), FieldType::Date);
        assert_eq!(infer("apiKey", &[]), FieldType::Code);
        assert_eq!(infer("isActive", &[]), FieldType::Boolean);
        assert_eq!(infer("clientSecret", &[]), FieldType::Hidden);
    }

    #[test]
    fn test_value_fallback() {
        assert_eq!(infer("value", &[json!(true), json!(false)]), FieldType::Boolean);
        assert_eq!(infer("count", &[json!(3)]), FieldType::Number);
        assert_eq!(infer("when", &[json!("2024-03-01T10:00:00Z")]), FieldType::Date);
        assert_eq!(infer("when", &[json!("2024-03-01")]), FieldType::Date);
        assert_eq!(infer("when", &[json!("03/14/2024")]), FieldType::Date);
        assert_eq!(infer("home", &[json!("https://example.com/a")]), FieldType::Url);
        assert_eq!(infer("contact", &[json!("ada@example.com")]), FieldType::Email);
        assert_eq!(
            infer("ref", &[json!("550e8400-e29b-41d4-a716-446655440000")]),
            FieldType::Code
        );
        assert_eq!(
            infer("commit", &[json!("9fceb02d0ae598e95dc970b74767f19372d61af8")]),
            FieldType::Code
        );
        assert_eq!(infer("title", &[json!("Hello")]), FieldType::Text);
    }

    #[test]
    fn test_first_non_null_sample_wins() {
        assert_eq!(infer("value", &[Value::Null, json!(12), json!("x")]), FieldType::Number);
        assert_eq!(infer("value", &[Value::Null]), FieldType::Text);
        assert_eq!(infer("value", &[json!({"a": 1})]), FieldType::Text);
    }

    #[test]
    fn test_override_beats_conventions() {
        let opts = InferenceOptions::default().with_override("createdAt", FieldType::Text);
        assert_eq!(infer_field_type("createdAt", &[], &opts), FieldType::Text);
    }

    #[test]
    fn test_hidden_beats_other_conventions() {
        // `_createdAt` is both internal and date-shaped
        assert_eq!(infer("_createdAt", &[]), FieldType::Hidden);
    }

    #[test]
    fn test_not_a_url_without_host() {
        assert_eq!(infer("note", &[json!("urn:isbn:0451450523")]), FieldType::Text);
    }

    #[test]
    fn test_label_override() {
        let opts = InferenceOptions::default().with_label("dob", "Born");
        assert_eq!(opts.label_for("dob"), "Born");
        assert_eq!(opts.label_for("user_name"), "User Name");
    }

    #[test]
    fn test_field_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(FieldType::Badge).unwrap(), json!("badge"));
        assert_eq!(FieldType::Hidden.to_string(), "hidden");
    }
}
