//! Link relation lookup and URI template expansion.
//!
//! Only three RFC 6570 forms are understood:
//!
//! 1. `{name}`: percent-encoded value. A missing value leaves the
//!    placeholder untouched so callers can detect unexpanded templates.
//! 2. `{?a,b}`: `?a=..&b=..` built from the present values, dropped when none are.
//! 3. `{&a,b}`: `&a=..&b=..` with the same presence rule.
//!
//! Everything here is pure; there is no navigator state to reset.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::resource::{Link, Resource};

/// Parameters for template expansion. `null` values count as absent.
pub type TemplateParams = Map<String, Value>;

fn simple_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_.]+)\}").expect("simple placeholder regex is valid"))
}

fn query_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([?&])([^{}]*)\}").expect("query placeholder regex is valid"))
}

/// Find the first link among the candidate relations, in candidate order.
///
/// When a relation holds an array, its first element is returned.
pub fn find_link<'a, I, S>(resource: &'a Resource, rels: I) -> Option<&'a Link>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    rels.into_iter()
        .find_map(|rel| resource.links.get(rel.as_ref()).and_then(|r| r.first()))
}

/// Every link registered under `rel`, empty when the relation is absent.
pub fn find_links<'a>(resource: &'a Resource, rel: &str) -> &'a [Link] {
    resource
        .links
        .get(rel)
        .map(|r| r.as_slice())
        .unwrap_or(&[])
}

/// Resolve the `href` for `rel`, expanding it when the link is templated.
pub fn get_href(resource: &Resource, rel: &str, params: Option<&TemplateParams>) -> Option<String> {
    let link = find_link(resource, [rel])?;
    if link.templated {
        let empty = TemplateParams::new();
        Some(expand_template(&link.href, params.unwrap_or(&empty)))
    } else {
        Some(link.href.clone())
    }
}

/// Expand the supported URI template forms.
pub fn expand_template(template: &str, params: &TemplateParams) -> String {
    let simple = simple_placeholder().replace_all(template, |caps: &Captures| {
        match params.get(&caps[1]).and_then(param_to_string) {
            Some(value) => encode_component(&value),
            None => caps[0].to_string(),
        }
    });

    query_placeholder()
        .replace_all(&simple, |caps: &Captures| {
            let pairs: Vec<String> = caps[2]
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .filter_map(|name| {
                    params
                        .get(name)
                        .and_then(param_to_string)
                        .map(|value| format!("{}={}", encode_component(name), encode_component(&value)))
                })
                .collect();

            if pairs.is_empty() {
                String::new()
            } else {
                format!("{}{}", &caps[1], pairs.join("&"))
            }
        })
        .into_owned()
}

/// Whether the resource advertises `rel`.
pub fn has_capability(resource: &Resource, rel: &str) -> bool {
    find_link(resource, [rel]).is_some()
}

/// All relation names, in wire order.
pub fn available_relations(resource: &Resource) -> Vec<&str> {
    resource.links.keys().map(String::as_str).collect()
}

/// Standard pager relations of a collection resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageLinks {
    pub first: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub last: Option<String>,
}

/// Collect `first`/`prev`/`next`/`last` hrefs. `previous` is accepted for `prev`.
pub fn page_links(resource: &Resource) -> PageLinks {
    let href = |rels: &[&str]| find_link(resource, rels.iter()).map(|l| l.href.clone());
    PageLinks {
        first: href(&["first"]),
        prev: href(&["prev", "previous"]),
        next: href(&["next"]),
        last: href(&["last"]),
    }
}

fn param_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(param_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Percent-encode a URI component, leaving the same characters unescaped as
/// a browser's `encodeURIComponent`.
fn encode_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => result.push(byte as char),
            _ => {
                result.push('%');
                result.push_str(&format!("{byte:02X}"));
            }
        }
    }
    result
}
