//! Template categorization: which UX pattern a template calls for.
//!
//! The decision depends only on the method and the declared properties:
//!
//! | visible properties | method             | category     |
//! |--------------------|--------------------|--------------|
//! | none               | `GET`, `POST`      | `navigation` |
//! | none               | anything else      | `action`     |
//! | at least one       | any                | `form`       |
//!
//! A template without properties counts as having no visible ones.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::inference::humanize_label;
use crate::resource::{Resource, Template, TemplateProperty};

/// UX category of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    /// Parameterized navigation; follow immediately.
    Navigation,
    /// Needs user input; open a form.
    Form,
    /// Pre-configured mutation; confirm, then execute.
    Action,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Navigation => "navigation",
            TemplateCategory::Form => "form",
            TemplateCategory::Action => "action",
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, TemplateCategory::Action)
    }

    pub fn opens_form(&self) -> bool {
        matches!(self, TemplateCategory::Form)
    }
}

impl std::fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a template. Pure: same template, same answer.
pub fn categorize_template(template: &Template) -> TemplateCategory {
    let all_hidden = template.properties.iter().all(TemplateProperty::is_hidden);
    if !all_hidden {
        return TemplateCategory::Form;
    }

    match template.method_upper().as_str() {
        "GET" | "POST" => TemplateCategory::Navigation,
        _ => TemplateCategory::Action,
    }
}

/// A template paired with its key and category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedTemplate<'a> {
    pub key: &'a str,
    pub category: TemplateCategory,
    pub template: &'a Template,
}

/// Categorize every template of a resource, in wire order.
pub fn categorize_templates(resource: &Resource) -> Vec<CategorizedTemplate<'_>> {
    resource
        .templates
        .iter()
        .map(|(key, template)| CategorizedTemplate {
            key,
            category: categorize_template(template),
            template,
        })
        .collect()
}

/// Properties a form should render.
pub fn visible_properties(template: &Template) -> impl Iterator<Item = &TemplateProperty> {
    template.properties.iter().filter(|p| !p.is_hidden())
}

/// Declared `value`s as a prefilled payload, in property order.
pub fn template_defaults(template: &Template) -> Map<String, Value> {
    template
        .properties
        .iter()
        .filter_map(|p| p.value.clone().map(|v| (p.name.clone(), v)))
        .collect()
}

/// Prompt shown before executing an `action` template.
pub fn confirmation_message(key: &str, template: &Template) -> String {
    let what = template
        .title
        .clone()
        .unwrap_or_else(|| humanize_label(key))
        .to_lowercase();
    format!("Are you sure you want to {what}?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(v: Value) -> Template {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_hidden_post_is_navigation() {
        let t = template(json!({"method": "POST", "properties": [{"name": "userId", "type": "hidden"}]}));
        assert_eq!(categorize_template(&t), TemplateCategory::Navigation);
    }

    #[test]
    fn test_hidden_delete_is_action() {
        let t = template(json!({"method": "DELETE", "properties": [{"name": "id", "type": "hidden"}]}));
        let category = categorize_template(&t);
        assert_eq!(category, TemplateCategory::Action);
        assert!(category.requires_confirmation());
    }

    #[test]
    fn test_visible_delete_is_form() {
        let t = template(json!({"method": "DELETE", "properties": [{"name": "reason", "type": "text"}]}));
        let category = categorize_template(&t);
        assert_eq!(category, TemplateCategory::Form);
        assert!(category.opens_form());
    }

    #[test]
    fn test_no_properties() {
        assert_eq!(
            categorize_template(&template(json!({"method": "GET"}))),
            TemplateCategory::Navigation
        );
        assert_eq!(
            categorize_template(&template(json!({"method": "patch"}))),
            TemplateCategory::Action
        );
        assert_eq!(
            categorize_template(&template(json!({"method": "PUT", "properties": []}))),
            TemplateCategory::Action
        );
    }

    #[test]
    fn test_mixed_properties_are_form() {
        let t = template(json!({
            "method": "PUT",
            "properties": [{"name": "id", "type": "hidden"}, {"name": "name"}]
        }));
        assert_eq!(categorize_template(&t), TemplateCategory::Form);
        let visible: Vec<&str> = visible_properties(&t).map(|p| p.name.as_str()).collect();
        assert_eq!(visible, vec!["name"]);
    }

    #[test]
    fn test_categorize_is_deterministic() {
        let t = template(json!({"method": "DELETE"}));
        assert_eq!(categorize_template(&t), categorize_template(&t));
    }

    #[test]
    fn test_categorize_templates_keeps_keys() {
        let r = Resource::from_value(json!({
            "_templates": {
                "default": {"method": "PUT", "properties": [{"name": "name"}]},
                "archive": {"method": "POST", "target": "/a"},
                "delete": {"method": "DELETE", "target": "/d"}
            }
        }))
        .unwrap();
        let cats: Vec<(&str, TemplateCategory)> =
            categorize_templates(&r).iter().map(|c| (c.key, c.category)).collect();
        assert_eq!(
            cats,
            vec![
                ("default", TemplateCategory::Form),
                ("archive", TemplateCategory::Navigation),
                ("delete", TemplateCategory::Action),
            ]
        );
    }

    #[test]
    fn test_defaults_and_confirmation() {
        let t = template(json!({
            "method": "DELETE",
            "properties": [
                {"name": "id", "type": "hidden", "value": "u-1"},
                {"name": "cascade", "type": "hidden", "value": true},
                {"name": "note", "type": "hidden"}
            ]
        }));
        assert_eq!(Value::Object(template_defaults(&t)), json!({"id": "u-1", "cascade": true}));
        assert_eq!(
            confirmation_message("deleteUser", &t),
            "Are you sure you want to delete user?"
        );

        let titled = template(json!({"method": "DELETE", "title": "Remove Member"}));
        assert_eq!(
            confirmation_message("x", &titled),
            "Are you sure you want to remove member?"
        );
    }
}
