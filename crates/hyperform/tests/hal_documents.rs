//! End-to-end checks of the pure operations over a realistic HAL-FORMS document.

use serde_json::{json, Map, Value};

use hyperform::{
    categorize_templates, collection_view, get_href, infer_columns, template_defaults, validate_template_data,
    ColumnOrdering, FieldType, InferenceOptions, PartialConventions, Resource, TemplateCategory,
};

// ─────────────────────── helpers ───────────────────────

fn users_page() -> Resource {
    Resource::from_value(json!({
        "page": { "number": 0, "size": 2, "totalElements": 3 },
        "_links": {
            "self": { "href": "/users?page=0&size=2" },
            "next": { "href": "/users?page=1&size=2" },
            "user": { "href": "/users/{userId}", "templated": true },
            "search": { "href": "/users{?q,role}", "templated": true }
        },
        "_templates": {
            "default": {
                "method": "POST",
                "target": "/users",
                "properties": [
                    { "name": "email", "type": "email", "required": true, "prompt": "Email" },
                    { "name": "displayName", "required": true, "minLength": 2, "maxLength": 40 },
                    { "name": "tier", "options": [ { "value": "free" }, { "value": "pro" } ] }
                ]
            },
            "purge": {
                "method": "DELETE",
                "target": "/users/inactive",
                "properties": [ { "name": "olderThanDays", "type": "hidden", "value": 90 } ]
            },
            "export": { "method": "POST", "target": "/users/export" }
        },
        "_embedded": {
            "users": [
                {
                    "userId": "4b7c1e0a-2f5d-4c9e-8a1b-3d6f7e8a9b0c",
                    "displayName": "Ada Lovelace",
                    "email": "ada@example.com",
                    "role": "admin",
                    "isVerified": true,
                    "lastLoginAt": "2024-05-01T09:30:00Z",
                    "loginCount": 42,
                    "profile": "https://example.com/ada",
                    "passwordHash": "x",
                    "_links": { "self": { "href": "/users/4b7c" } }
                },
                {
                    "userId": "9a8b7c6d-5e4f-4a3b-2c1d-0e9f8a7b6c5d",
                    "displayName": "Grace Hopper",
                    "email": null,
                    "role": "member",
                    "isVerified": false,
                    "lastLoginAt": null,
                    "loginCount": 7,
                    "profile": null,
                    "passwordHash": "y"
                }
            ]
        }
    }))
    .unwrap()
}

fn data(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

// ─────────────────────── tests ───────────────────────

#[test]
fn test_collection_columns() {
    let page = users_page();
    let view = collection_view(&page, None, &InferenceOptions::default());

    assert_eq!(view.items.len(), 2);
    let types: Vec<(&str, FieldType)> = view.columns.iter().map(|c| (c.key.as_str(), c.field_type)).collect();
    assert_eq!(
        types,
        vec![
            ("userId", FieldType::Code),
            ("displayName", FieldType::Text),
            ("email", FieldType::Email),
            ("role", FieldType::Badge),
            ("isVerified", FieldType::Boolean),
            ("lastLoginAt", FieldType::Date),
            ("loginCount", FieldType::Number),
            ("profile", FieldType::Url),
            ("passwordHash", FieldType::Hidden),
        ]
    );

    let pagination = view.pagination.unwrap();
    assert_eq!(pagination.total_pages(), Some(2));
    assert_eq!(view.pages.next.as_deref(), Some("/users?page=1&size=2"));
}

#[test]
fn test_semantic_ordering() {
    let page = users_page();
    let opts = InferenceOptions::default().with_ordering(ColumnOrdering::Semantic);
    let view = collection_view(&page, Some("users"), &opts);
    let keys: Vec<&str> = view.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(&keys[..2], &["displayName", "role"]);
    assert_eq!(&keys[keys.len() - 2..], &["profile", "passwordHash"]);
}

#[test]
fn test_overrides_and_custom_conventions() {
    let page = users_page();
    let items = hyperform::extract_embedded_items(&page, None);

    let partial = PartialConventions {
        code: vec![r"^displayName$".to_string()],
        ..Default::default()
    };
    let opts = InferenceOptions::default()
        .with_conventions(&partial)
        .unwrap()
        .with_override("loginCount", FieldType::Badge)
        .with_label("displayName", "Full name");

    let cols = infer_columns(items, &opts);
    let col = |k: &str| cols.iter().find(|c| c.key == k).unwrap();
    assert_eq!(col("loginCount").field_type, FieldType::Badge);
    assert_eq!(col("displayName").label, "Full name");
    assert_eq!(col("displayName").field_type, FieldType::Code);
    assert_eq!(col("lastLoginAt").label, "Last Login At");
}

#[test]
fn test_invalid_custom_convention_rejected() {
    let partial = PartialConventions {
        date: vec!["(unclosed".to_string()],
        ..Default::default()
    };
    assert!(InferenceOptions::default().with_conventions(&partial).is_err());
}

#[test]
fn test_templates_categorized() {
    let page = users_page();
    let cats: Vec<(&str, TemplateCategory)> = categorize_templates(&page)
        .iter()
        .map(|c| (c.key, c.category))
        .collect();
    assert_eq!(
        cats,
        vec![
            ("default", TemplateCategory::Form),
            ("purge", TemplateCategory::Action),
            ("export", TemplateCategory::Navigation),
        ]
    );

    let purge = page.template("purge").unwrap();
    assert_eq!(Value::Object(template_defaults(purge)), json!({"olderThanDays": 90}));
}

#[test]
fn test_create_form_validation() {
    let page = users_page();
    let create = page.template("default").unwrap();

    let errors = validate_template_data(create, &data(json!({"email": "nope", "displayName": "A"})));
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Email must be a valid email address",
            "displayName must be at least 2 characters",
        ]
    );

    let ok = validate_template_data(
        create,
        &data(json!({"email": "ada@example.com", "displayName": "Ada", "tier": "pro"})),
    );
    assert!(ok.is_empty());
}

#[test]
fn test_navigation_hrefs() {
    let page = users_page();
    let mut params = Map::new();
    params.insert("userId".to_string(), json!("u 1"));
    assert_eq!(get_href(&page, "user", Some(&params)).as_deref(), Some("/users/u%201"));

    let mut search = Map::new();
    search.insert("role".to_string(), json!("admin"));
    assert_eq!(get_href(&page, "search", Some(&search)).as_deref(), Some("/users?role=admin"));
}
