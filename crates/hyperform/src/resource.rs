//! Core HAL / HAL-FORMS data types.
//!
//! A [`Resource`] keeps business data, links, templates and embedded
//! resources in separate fields. The wire envelope (`_links`, `_templates`,
//! `_embedded` mixed into the root object) is only a serialization concern.

use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys starting with this prefix are metadata, never business fields.
pub const METADATA_PREFIX: char = '_';

/// Name of the relation pointing at the resource itself.
pub const SELF_REL: &str = "self";

/// A hypermedia resource as returned by a HAL+JSON endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Relation name → one or more links.
    #[serde(
        rename = "_links",
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub links: IndexMap<String, Relation>,
    /// Template key → HAL-FORMS template.
    #[serde(
        rename = "_templates",
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub templates: IndexMap<String, Template>,
    /// Embedded key → resource or resource list.
    #[serde(
        rename = "_embedded",
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub embedded: IndexMap<String, Embedded>,
    /// Every other root-level field, in wire order.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Resource {
    /// Create an empty resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resource from a JSON value. Non-object values are rejected.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialize back into the HAL wire envelope.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Get a business field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Business fields that are not metadata (no `_` prefix), in wire order.
    pub fn data_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter(|(k, _)| !k.starts_with(METADATA_PREFIX))
    }

    /// Get a template by key.
    pub fn template(&self, key: &str) -> Option<&Template> {
        self.templates.get(key)
    }

    /// Get an embedded entry by key.
    pub fn embedded(&self, key: &str) -> Option<&Embedded> {
        self.embedded.get(key)
    }

    /// The `href` of the first `self` link, if any.
    pub fn self_href(&self) -> Option<&str> {
        self.links
            .get(SELF_REL)
            .and_then(Relation::first)
            .map(|l| l.href.as_str())
    }

    /// Builder-style helper for attaching a link.
    pub fn with_link(mut self, rel: impl Into<String>, link: Link) -> Self {
        self.links.insert(rel.into(), Relation::One(link));
        self
    }

    /// Builder-style helper for attaching a template.
    pub fn with_template(mut self, key: impl Into<String>, template: Template) -> Self {
        self.templates.insert(key.into(), template);
        self
    }
}

/// A link relation may carry a single link or an array of links.
///
/// Malformed links inside an array are dropped; the rest are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Relation {
    Many(Vec<Link>),
    One(Link),
}

impl Relation {
    /// The first link of the relation. Empty arrays yield `None`.
    pub fn first(&self) -> Option<&Link> {
        match self {
            Relation::One(link) => Some(link),
            Relation::Many(links) => links.first(),
        }
    }

    /// All links of the relation as a slice.
    pub fn as_slice(&self) -> &[Link] {
        match self {
            Relation::One(link) => std::slice::from_ref(link),
            Relation::Many(links) => links,
        }
    }
}

/// A HAL link object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    /// A plain, non-templated link.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    /// A templated link whose `href` carries placeholders.
    pub fn templated(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: true,
            ..Default::default()
        }
    }
}

/// An embedded entry: either one resource or a list of them.
///
/// Non-object list items are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Embedded {
    Many(Vec<Resource>),
    One(Box<Resource>),
}

impl Embedded {
    /// The embedded resources if this entry is a list.
    pub fn as_list(&self) -> Option<&[Resource]> {
        match self {
            Embedded::Many(items) => Some(items),
            Embedded::One(_) => None,
        }
    }
}

/// A HAL-FORMS template: one possible state transition of its resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default = "default_method")]
    pub method: String,
    /// Submission URL. `None` means "the owning resource's self link".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub properties: Vec<TemplateProperty>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Template {
    /// A template with the given method and target and no properties.
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: Some(target.into()),
            content_type: None,
            title: None,
            properties: Vec::new(),
        }
    }

    /// Builder-style helper for appending a property.
    pub fn with_property(mut self, property: TemplateProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Upper-cased HTTP method as declared by the server.
    pub fn method_upper(&self) -> String {
        self.method.trim().to_ascii_uppercase()
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&TemplateProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A single input declared by a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProperty {
    pub name: String,
    #[serde(rename = "type", default = "default_property_type")]
    pub property_type: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_length", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, deserialize_with = "lenient_length", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Presence marks an enumerated field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PropertyOption>>,
}

fn default_property_type() -> String {
    "text".to_string()
}

impl TemplateProperty {
    /// A property with the given name and type and no constraints.
    pub fn new(name: impl Into<String>, property_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type: property_type.into(),
            required: false,
            read_only: false,
            prompt: None,
            value: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            regex: None,
            options: None,
        }
    }

    /// Mark the property as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.property_type.eq_ignore_ascii_case("hidden")
    }

    /// Human-facing name: the prompt when present, otherwise the raw name.
    pub fn display_name(&self) -> &str {
        self.prompt.as_deref().unwrap_or(&self.name)
    }
}

/// One allowed value of an enumerated property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOption {
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

// ─────────────────────── lenient decoding ───────────────────────

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(Relation::Many(keep_valid(items, "link"))),
            value @ Value::Object(_) => serde_json::from_value(value).map(Relation::One).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("expected link object or array, got {other}"))),
        }
    }
}

impl<'de> Deserialize<'de> for Embedded {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => {
                let objects = items.into_iter().filter(Value::is_object).collect();
                Ok(Embedded::Many(keep_valid(objects, "embedded resource")))
            }
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(|r| Embedded::One(Box::new(r)))
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("expected embedded object or array, got {other}"))),
        }
    }
}

/// Decode each item, dropping the ones that do not fit `T`.
fn keep_valid<T: DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::warn!(%error, what, "skipping malformed item");
                None
            }
        })
        .collect()
}

/// A keyed section (`_links`, `_templates`, `_embedded`); bad entries are skipped.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries,
        Value::Null => return Ok(IndexMap::new()),
        other => {
            tracing::warn!(found = %other, "ignoring non-object HAL section");
            return Ok(IndexMap::new());
        }
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((key, entry)),
            Err(error) => {
                tracing::warn!(%key, %error, "skipping malformed HAL entry");
                None
            }
        })
        .collect())
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(keep_valid(items, "template property")),
        Value::Null => Ok(Vec::new()),
        other => {
            tracing::warn!(found = %other, "ignoring non-array property list");
            Ok(Vec::new())
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Lengths may arrive as `10.0`; anything that is not a whole non-negative
/// number is treated as absent.
fn lenient_length<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    let length = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        _ => None,
    };
    Ok(length.and_then(|l| usize::try_from(l).ok()))
}
