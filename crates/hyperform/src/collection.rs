//! Embedded collections and pagination metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::inference::{infer_columns, InferenceOptions, InferredField};
use crate::links::{page_links, PageLinks};
use crate::resource::Resource;

/// Embedded keys checked for the item list, in priority order.
pub const COLLECTION_KEYS: &[&str] = &["items", "results", "data", "records"];

/// Locate the embedded item list.
///
/// With an explicit key, that entry is returned when it is a list and an
/// empty slice otherwise. Without one, [`COLLECTION_KEYS`] are checked in
/// order, then the first list-valued entry is used.
pub fn extract_embedded_items<'a>(resource: &'a Resource, key: Option<&str>) -> &'a [Resource] {
    if let Some(key) = key {
        return resource
            .embedded(key)
            .and_then(|e| e.as_list())
            .unwrap_or(&[]);
    }

    COLLECTION_KEYS
        .iter()
        .find_map(|k| resource.embedded(k).and_then(|e| e.as_list()))
        .or_else(|| resource.embedded.values().find_map(|e| e.as_list()))
        .unwrap_or(&[])
}

/// Normalized pagination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl PaginationInfo {
    /// Page count when both the total and a non-zero size are known.
    pub fn total_pages(&self) -> Option<u64> {
        match (self.total, self.size) {
            (Some(total), size) if size > 0 => Some(total.div_ceil(size)),
            _ => None,
        }
    }
}

fn number(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| match map.get(*k)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Read pagination from either a nested `page` object
/// (`{number,size,totalElements}` or `{page,limit,total}`) or flat root
/// fields (`page`, `size`, `total`). `None` when neither shape is present.
pub fn get_pagination_info(resource: &Resource) -> Option<PaginationInfo> {
    match resource.get("page") {
        Some(Value::Object(page)) => Some(PaginationInfo {
            page: number(page, &["number", "page"]).unwrap_or(0),
            size: number(page, &["size", "limit"]).unwrap_or(0),
            total: number(page, &["totalElements", "total"]),
        }),
        Some(_) => {
            let page = number(&resource.fields, &["page"])?;
            Some(PaginationInfo {
                page,
                size: number(&resource.fields, &["size", "limit"]).unwrap_or(0),
                total: number(&resource.fields, &["total", "totalElements"]),
            })
        }
        None => None,
    }
}

/// Everything a table needs: rows, columns, pager state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionView<'a> {
    pub items: &'a [Resource],
    pub columns: Vec<InferredField>,
    pub pagination: Option<PaginationInfo>,
    pub pages: PageLinks,
}

/// Extract items, infer their columns and read pagination in one call.
pub fn collection_view<'a>(
    resource: &'a Resource,
    key: Option<&str>,
    options: &InferenceOptions,
) -> CollectionView<'a> {
    let items = extract_embedded_items(resource, key);
    CollectionView {
        items,
        columns: infer_columns(items, options),
        pagination: get_pagination_info(resource),
        pages: page_links(resource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn res(v: Value) -> Resource {
        Resource::from_value(v).unwrap()
    }

    #[test]
    fn test_common_key_priority() {
        let r = res(json!({
            "_embedded": {
                "users": [ { "id": 1 } ],
                "results": [ { "id": 2 }, { "id": 3 } ],
                "items": [ { "id": 4 } ]
            }
        }));
        let items = extract_embedded_items(&r, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("id"), Some(&json!(4)));
    }

    #[test]
    fn test_sole_array_fallback() {
        let r = res(json!({
            "_embedded": {
                "owner": { "name": "Ada" },
                "users": [ { "id": 1 }, { "id": 2 } ]
            }
        }));
        assert_eq!(extract_embedded_items(&r, None).len(), 2);
    }

    #[test]
    fn test_explicit_key() {
        let r = res(json!({
            "_embedded": {
                "owner": { "name": "Ada" },
                "users": [ { "id": 1 } ]
            }
        }));
        assert_eq!(extract_embedded_items(&r, Some("users")).len(), 1);
        assert!(extract_embedded_items(&r, Some("owner")).is_empty());
        assert!(extract_embedded_items(&r, Some("missing")).is_empty());
    }

    #[test]
    fn test_nothing_embedded() {
        assert!(extract_embedded_items(&res(json!({"id": 1})), None).is_empty());
    }

    #[test]
    fn test_nested_page_object() {
        let r = res(json!({ "page": { "number": 2, "size": 10, "totalElements": 45 } }));
        let info = get_pagination_info(&r).unwrap();
        assert_eq!(info, PaginationInfo { page: 2, size: 10, total: Some(45) });
        assert_eq!(info.total_pages(), Some(5));
    }

    #[test]
    fn test_nested_synonyms() {
        let r = res(json!({ "page": { "page": 1, "limit": 25, "total": 3 } }));
        assert_eq!(
            get_pagination_info(&r),
            Some(PaginationInfo { page: 1, size: 25, total: Some(3) })
        );
    }

    #[test]
    fn test_flat_fields() {
        let r = res(json!({ "page": 3, "size": 20, "total": 100 }));
        assert_eq!(
            get_pagination_info(&r),
            Some(PaginationInfo { page: 3, size: 20, total: Some(100) })
        );
        let r = res(json!({ "page": 0, "size": 20 }));
        let info = get_pagination_info(&r).unwrap();
        assert_eq!(info.total, None);
        assert_eq!(info.total_pages(), None);
    }

    #[test]
    fn test_no_pagination() {
        assert_eq!(get_pagination_info(&res(json!({ "size": 3 }))), None);
        assert_eq!(get_pagination_info(&res(json!({ "page": "n/a" }))), None);
    }

    #[test]
    fn test_collection_view() {
        let r = res(json!({
            "page": { "number": 0, "size": 2, "totalElements": 4 },
            "_links": { "next": { "href": "/users?page=1" } },
            "_embedded": { "users": [ { "id": "a", "email": "a@example.com" } ] }
        }));
        let view = collection_view(&r, None, &InferenceOptions::default());
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.columns.len(), 2);
        assert_eq!(view.pagination.unwrap().total_pages(), Some(2));
        assert_eq!(view.pages.next.as_deref(), Some("/users?page=1"));
    }
}
