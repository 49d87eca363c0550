//! Hypermedia client: fetch resources and execute HAL-FORMS templates.
//!
//! Wire conventions:
//!
//! - every request sends `Accept: application/hal+json`;
//! - `PUT` and `DELETE` templates go out as `POST` with `_method: "put"` /
//!   `"delete"` injected into the payload, for intermediaries that do not
//!   pass arbitrary verbs through;
//! - bodies follow the template's `contentType`: url-encoded forms for
//!   `application/x-www-form-urlencoded`, JSON for everything else;
//! - `GET` templates carry their payload in the query string.
//!
//! A 401 with an auth handler configured yields [`Outcome::Redirecting`]
//! after the handler runs, so the caller can stop updating its UI while the
//! host redirects.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::links::{get_href, TemplateParams};
use crate::resource::{Resource, Template};
use crate::transport::{RequestBody, RequestOptions, Transport};
use crate::validation::{validate_template_data, ValidationError};

pub const HAL_JSON: &str = "application/hal+json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Payload field carrying the real verb of an overridden request.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// Result of a call that may be cut short by an authentication redirect.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    /// The auth handler ran; the host is redirecting and no value follows.
    Redirecting,
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(v) => Some(v),
            Outcome::Redirecting => None,
        }
    }

    pub fn is_redirecting(&self) -> bool {
        matches!(self, Outcome::Redirecting)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(v) => Outcome::Ready(f(v)),
            Outcome::Redirecting => Outcome::Redirecting,
        }
    }
}

/// Result of [`HypermediaClient::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Pre-flight validation failed; nothing was sent.
    Invalid(Vec<ValidationError>),
    Sent(Outcome<Resource>),
}

/// Callback invoked on HTTP 401 before [`Outcome::Redirecting`] is returned.
pub type AuthErrorHandler = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// A template execution translated into wire terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<RequestBody>,
}

/// Translate a template execution into the request actually sent.
pub fn prepare_template_request(
    template: &Template,
    target: &str,
    data: &Map<String, Value>,
) -> ClientResult<PreparedRequest> {
    let declared = template.method_upper();
    let declared = if declared.is_empty() {
        "GET".to_string()
    } else {
        declared
    };

    let mut payload = data.clone();
    let method = match declared.as_str() {
        "PUT" | "DELETE" => {
            payload.insert(
                METHOD_OVERRIDE_FIELD.to_string(),
                Value::String(declared.to_ascii_lowercase()),
            );
            Method::POST
        }
        other => Method::from_bytes(other.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("method {other:?}: {e}")))?,
    };

    if method == Method::GET {
        return Ok(PreparedRequest {
            method,
            path: append_query(target, &payload),
            body: None,
        });
    }

    let body = if is_form_encoded(template.content_type.as_deref()) {
        RequestBody::Form(form_pairs(&payload))
    } else {
        RequestBody::Json(Value::Object(payload))
    };

    Ok(PreparedRequest {
        method,
        path: target.to_string(),
        body: Some(body),
    })
}

fn is_form_encoded(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn form_pairs(payload: &Map<String, Value>) -> Vec<(String, String)> {
    payload
        .iter()
        .map(|(k, v)| (k.clone(), scalar_to_string(v)))
        .collect()
}

fn append_query(target: &str, payload: &Map<String, Value>) -> String {
    if payload.is_empty() {
        return target.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form_pairs(payload))
        .finish();
    let sep = if target.contains('?') { '&' } else { '?' };
    format!("{target}{sep}{query}")
}

/// Where a template submits: its declared target, or the owning resource's
/// `self` link when the target is absent or empty.
pub fn template_target<'a>(resource: &'a Resource, template: &'a Template) -> Option<&'a str> {
    template
        .target
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| resource.self_href())
}

fn named_template<'a>(resource: &'a Resource, key: &str) -> ClientResult<&'a Template> {
    resource
        .template(key)
        .ok_or_else(|| ClientError::InvalidRequest(format!("no template named {key:?}")))
}

/// Client for HAL + HAL-FORMS APIs.
///
/// Holds no resource state: every call fetches fresh.
#[derive(Clone)]
pub struct HypermediaClient {
    transport: Transport,
    on_auth_error: Option<AuthErrorHandler>,
}

impl std::fmt::Debug for HypermediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HypermediaClient")
            .field("transport", &self.transport)
            .field("on_auth_error", &self.on_auth_error.is_some())
            .finish()
    }
}

impl HypermediaClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::from_transport(Transport::new(config))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self {
            transport,
            on_auth_error: None,
        }
    }

    /// Install the 401 handler.
    pub fn with_auth_error_handler(mut self, handler: impl Fn(&ClientError) + Send + Sync + 'static) -> Self {
        self.on_auth_error = Some(Arc::new(handler));
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.transport.set_base_url(base_url);
    }

    pub fn set_headers(&mut self, headers: BTreeMap<String, String>) {
        self.transport.set_headers(headers);
    }

    /// GET a resource.
    pub async fn fetch(&self, url: &str) -> ClientResult<Outcome<Resource>> {
        self.fetch_with(url, RequestOptions::new(Method::GET)).await
    }

    /// GET a resource with caller options (cancel token, timeout, headers).
    pub async fn fetch_with(&self, url: &str, options: RequestOptions) -> ClientResult<Outcome<Resource>> {
        let options = RequestOptions {
            method: Method::GET,
            body: None,
            ..options
        }
        .with_header("Accept", HAL_JSON);
        self.settle(self.transport.request(url, options).await)
    }

    /// Resolve `rel` on `resource` and fetch it.
    pub async fn follow(
        &self,
        resource: &Resource,
        rel: &str,
        params: Option<&TemplateParams>,
    ) -> ClientResult<Outcome<Resource>> {
        let href = get_href(resource, rel, params).ok_or_else(|| ClientError::LinkNotFound(rel.to_string()))?;
        self.fetch(&href).await
    }

    /// Execute a template against its declared target.
    pub async fn execute_template(
        &self,
        template: &Template,
        data: &Map<String, Value>,
    ) -> ClientResult<Outcome<Resource>> {
        self.execute_template_with(template, data, RequestOptions::default())
            .await
    }

    /// [`execute_template`](Self::execute_template) with caller options
    /// (cancel token, timeout, headers). Method and body come from the template.
    pub async fn execute_template_with(
        &self,
        template: &Template,
        data: &Map<String, Value>,
        options: RequestOptions,
    ) -> ClientResult<Outcome<Resource>> {
        let target = template
            .target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::InvalidRequest("template has no target".to_string()))?;
        self.execute_at(template, target, data, options).await
    }

    /// Execute the template named `key` on `resource`; a missing target
    /// falls back to the resource's `self` link.
    pub async fn execute_named(
        &self,
        resource: &Resource,
        key: &str,
        data: &Map<String, Value>,
    ) -> ClientResult<Outcome<Resource>> {
        self.execute_named_with(resource, key, data, RequestOptions::default())
            .await
    }

    pub async fn execute_named_with(
        &self,
        resource: &Resource,
        key: &str,
        data: &Map<String, Value>,
        options: RequestOptions,
    ) -> ClientResult<Outcome<Resource>> {
        let template = named_template(resource, key)?;
        let target = template_target(resource, template)
            .ok_or_else(|| ClientError::InvalidRequest(format!("template {key:?} has no target")))?;
        self.execute_at(template, target, data, options).await
    }

    async fn execute_at(
        &self,
        template: &Template,
        target: &str,
        data: &Map<String, Value>,
        options: RequestOptions,
    ) -> ClientResult<Outcome<Resource>> {
        let prepared = prepare_template_request(template, target, data)?;
        tracing::debug!(
            declared = %template.method,
            wire = %prepared.method,
            target = %prepared.path,
            "executing template"
        );

        let options = RequestOptions {
            method: prepared.method,
            body: prepared.body,
            ..options
        }
        .with_header("Accept", HAL_JSON);
        self.settle(self.transport.request(&prepared.path, options).await)
    }

    /// Pre-flight validation; see [`validate_template_data`].
    pub fn validate_template_data(&self, template: &Template, data: &Map<String, Value>) -> Vec<ValidationError> {
        validate_template_data(template, data)
    }

    /// Validate, then execute only when there are no errors.
    pub async fn submit(&self, template: &Template, data: &Map<String, Value>) -> ClientResult<Submission> {
        let errors = validate_template_data(template, data);
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "submission rejected by pre-flight validation");
            return Ok(Submission::Invalid(errors));
        }
        self.execute_template(template, data).await.map(Submission::Sent)
    }

    /// Validate, then execute the template named `key` on `resource` with the
    /// same target fallback as [`execute_named`](Self::execute_named).
    pub async fn submit_named(
        &self,
        resource: &Resource,
        key: &str,
        data: &Map<String, Value>,
    ) -> ClientResult<Submission> {
        let errors = validate_template_data(named_template(resource, key)?, data);
        if !errors.is_empty() {
            tracing::debug!(template = key, errors = errors.len(), "submission rejected by pre-flight validation");
            return Ok(Submission::Invalid(errors));
        }
        self.execute_named(resource, key, data).await.map(Submission::Sent)
    }

    fn settle(&self, result: ClientResult<Resource>) -> ClientResult<Outcome<Resource>> {
        match result {
            Ok(resource) => Ok(Outcome::Ready(resource)),
            Err(e) if e.is_unauthorized() => match &self.on_auth_error {
                Some(handler) => {
                    tracing::info!("authentication required; handing off to auth handler");
                    handler(&e);
                    Ok(Outcome::Redirecting)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(v: Value) -> Template {
        serde_json::from_value(v).unwrap()
    }

    fn data(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_delete_overridden_to_post() {
        let t = template(json!({"method": "DELETE", "target": "/users/1"}));
        let req = prepare_template_request(&t, "/users/1", &Map::new()).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.body, Some(RequestBody::Json(json!({"_method": "delete"}))));
    }

    #[test]
    fn test_put_overridden_keeps_payload() {
        let t = template(json!({"method": "put"}));
        let req = prepare_template_request(&t, "/users/1", &data(json!({"name": "Ada"}))).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(
            req.body,
            Some(RequestBody::Json(json!({"name": "Ada", "_method": "put"})))
        );
    }

    #[test]
    fn test_patch_and_post_sent_as_declared() {
        let patch = prepare_template_request(&template(json!({"method": "PATCH"})), "/x", &Map::new()).unwrap();
        assert_eq!(patch.method, Method::PATCH);
        assert_eq!(patch.body, Some(RequestBody::Json(json!({}))));

        let post = prepare_template_request(&template(json!({"method": "POST"})), "/x", &Map::new()).unwrap();
        assert_eq!(post.method, Method::POST);
    }

    #[test]
    fn test_form_encoding() {
        let t = template(json!({
            "method": "DELETE",
            "contentType": "application/x-www-form-urlencoded; charset=utf-8"
        }));
        let req = prepare_template_request(&t, "/x", &data(json!({"reason": "spam", "count": 2, "note": null}))).unwrap();
        assert_eq!(
            req.body,
            Some(RequestBody::Form(vec![
                ("reason".to_string(), "spam".to_string()),
                ("count".to_string(), "2".to_string()),
                ("note".to_string(), String::new()),
                ("_method".to_string(), "delete".to_string()),
            ]))
        );
    }

    #[test]
    fn test_unknown_content_type_defaults_to_json() {
        let t = template(json!({"method": "POST", "contentType": "text/plain"}));
        let req = prepare_template_request(&t, "/x", &data(json!({"a": 1}))).unwrap();
        assert_eq!(req.body, Some(RequestBody::Json(json!({"a": 1}))));
    }

    #[test]
    fn test_get_uses_query_string() {
        let t = template(json!({"method": "GET"}));
        let req = prepare_template_request(&t, "/search?x=1", &data(json!({"q": "a b", "page": 2}))).unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/search?x=1&q=a+b&page=2");
        assert!(req.body.is_none());

        let bare = prepare_template_request(&t, "/search", &Map::new()).unwrap();
        assert_eq!(bare.path, "/search");
    }

    #[test]
    fn test_input_not_mutated() {
        let t = template(json!({"method": "DELETE"}));
        let input = data(json!({"id": 1}));
        let _ = prepare_template_request(&t, "/x", &input).unwrap();
        assert!(!input.contains_key(METHOD_OVERRIDE_FIELD));
    }

    #[test]
    fn test_outcome_helpers() {
        let ready: Outcome<u8> = Outcome::Ready(1);
        assert_eq!(ready.clone().map(|v| v + 1), Outcome::Ready(2));
        assert_eq!(ready.ready(), Some(1));
        assert!(Outcome::<u8>::Redirecting.is_redirecting());
        assert_eq!(Outcome::<u8>::Redirecting.ready(), None);
    }

    #[test]
    fn test_template_target_falls_back_to_self() {
        let resource = Resource::new().with_link("self", crate::resource::Link::new("/users/1"));
        let declared = template(json!({"method": "PUT", "target": "/users/1/profile"}));
        let blank = template(json!({"method": "PUT", "target": ""}));
        assert_eq!(template_target(&resource, &declared), Some("/users/1/profile"));
        assert_eq!(template_target(&resource, &blank), Some("/users/1"));
        assert_eq!(template_target(&Resource::new(), &blank), None);
    }
}
