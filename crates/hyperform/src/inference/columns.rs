//! Column descriptors for tables of heterogeneous items.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{infer_field_type, FieldType, InferenceOptions};
use crate::resource::Resource;

/// How column priority is assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrdering {
    /// Priority is the key's first-seen position; API order is preserved.
    #[default]
    Positional,
    /// Priority is a semantic importance bucket (identifiers first, urls last).
    Semantic,
}

/// Display descriptor for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub sortable: bool,
    pub hidden: bool,
    /// Lower sorts first.
    pub priority: usize,
}

/// Names treated as the primary identifier of an item.
const PRIMARY_KEYS: &[&str] = &[
    "id",
    "uuid",
    "name",
    "title",
    "label",
    "username",
    "displayname",
    "display_name",
];

/// Every type except `hidden` can be sorted on.
pub fn is_sortable(ty: FieldType) -> bool {
    ty != FieldType::Hidden
}

fn semantic_bucket(key: &str, ty: FieldType) -> usize {
    if ty != FieldType::Hidden && PRIMARY_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
        return 0;
    }
    match ty {
        FieldType::Badge => 1,
        FieldType::Date => 2,
        FieldType::Text | FieldType::Email => 3,
        FieldType::Number | FieldType::Boolean => 4,
        FieldType::Code => 5,
        FieldType::Url => 6,
        FieldType::Hidden => 7,
    }
}

/// Infer column descriptors from up to `options.sample_size` items.
///
/// Keys are the union of the sampled items' non-metadata fields, in
/// first-seen order. In [`ColumnOrdering::Semantic`] mode the result is
/// sorted by bucket, ties keeping first-seen order.
pub fn infer_columns(items: &[Resource], options: &InferenceOptions) -> Vec<InferredField> {
    let mut samples: IndexMap<&str, Vec<Value>> = IndexMap::new();
    for item in items.iter().take(options.sample_size) {
        for (key, value) in item.data_fields() {
            samples.entry(key.as_str()).or_default().push(value.clone());
        }
    }

    let mut fields: Vec<InferredField> = samples
        .iter()
        .enumerate()
        .map(|(index, (key, values))| {
            let field_type = infer_field_type(key, values, options);
            let priority = match options.ordering {
                ColumnOrdering::Positional => index,
                ColumnOrdering::Semantic => semantic_bucket(key, field_type),
            };
            InferredField {
                key: key.to_string(),
                label: options.label_for(key),
                field_type,
                sortable: is_sortable(field_type),
                hidden: field_type == FieldType::Hidden,
                priority,
            }
        })
        .collect();

    if options.ordering == ColumnOrdering::Semantic {
        fields.sort_by_key(|f| f.priority);
    }
    fields
}
