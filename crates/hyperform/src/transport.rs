//! Async HTTP transport wrapping reqwest.
//!
//! One call, one response: header merging, a per-call timeout enforced by
//! racing the request against a timer, caller cancellation, and error
//! envelope parsing. No retries and no caching happen here.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use crate::config::{ClientConfig, Credentials};
use crate::error::{ClientError, ClientResult};
use crate::resource::Resource;

/// A request body, encoded according to its variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as `application/json`.
    Json(Value),
    /// Serialized as `application/x-www-form-urlencoded`, in pair order.
    Form(Vec<(String, String)>),
}

/// Per-call options for [`Transport::request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Call-specific headers; they override defaults with the same name.
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
    /// Overrides the configured timeout for this call only.
    pub timeout_ms: Option<u64>,
    pub cancel: Option<CancelToken>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Cancellation handle for one in-flight request.
///
/// Cloning shares the same token. Cancelling an already finished request is
/// a no-op.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            state: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// What a [`TransportHooks`] implementation is told about.
#[derive(Debug, Clone)]
pub enum TransportEvent<'a> {
    Request {
        method: &'a Method,
        url: &'a str,
    },
    Response {
        method: &'a Method,
        url: &'a str,
        status: u16,
        elapsed: Duration,
    },
}

/// Optional debug/error callbacks invoked per request. Both default to no-ops.
pub trait TransportHooks: Send + Sync {
    fn debug(&self, _event: &TransportEvent<'_>) {}

    fn error(&self, _url: &str, _error: &ClientError) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl TransportHooks for NoopHooks {}

/// HTTP transport bound to a base URL and default headers.
#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    config: ClientConfig,
    hooks: Arc<dyn TransportHooks>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Create a transport from its configuration.
    pub fn new(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(config.credentials == Credentials::Include)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            config,
            hooks: Arc::new(NoopHooks),
        }
    }

    /// Attach debug/error hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn TransportHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.config.base_url = base_url.into();
    }

    /// Merge headers into the defaults. Later values win.
    pub fn set_headers(&mut self, headers: BTreeMap<String, String>) {
        self.config.default_headers.extend(headers);
    }

    /// Resolve a path against the base URL. Absolute `http(s)` URLs pass through.
    pub fn resolve_url(&self, path: &str) -> ClientResult<Url> {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }

        let base = self.config.base_url.trim_end_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') || path.starts_with('?') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        Url::parse(&joined)
            .map_err(|e| ClientError::InvalidRequest(format!("cannot resolve URL {joined:?}: {e}")))
    }

    fn merged_headers(&self, call: &BTreeMap<String, String>) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.config.default_headers.iter().chain(call.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidRequest(format!("header {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidRequest(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// Issue one request and decode the response as a [`Resource`].
    pub async fn request(&self, path: &str, options: RequestOptions) -> ClientResult<Resource> {
        let url = self.resolve_url(path)?;
        let url_str = url.to_string();

        let result = self.send(url, &url_str, options).await;
        if let Err(e) = &result {
            tracing::warn!(url = %url_str, status = e.status(), code = e.code(), "request failed");
            self.hooks.error(&url_str, e);
        }
        result
    }

    async fn send(&self, url: Url, url_str: &str, options: RequestOptions) -> ClientResult<Resource> {
        let RequestOptions {
            method,
            headers,
            body,
            timeout_ms,
            cancel,
        } = options;

        if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ClientError::Cancelled);
        }

        let headers = self.merged_headers(&headers)?;
        let mut builder = self.client.request(method.clone(), url).headers(headers);
        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            None => builder,
        };

        tracing::debug!(method = %method, url = %url_str, "request");
        self.hooks.debug(&TransportEvent::Request {
            method: &method,
            url: url_str,
        });

        let timeout_ms = timeout_ms.unwrap_or(self.config.timeout_ms);
        let started = Instant::now();

        let exchange = async {
            let resp = builder.send().await?;
            let status = resp.status().as_u16();
            let text = resp.text().await?;
            Ok::<_, ClientError>((status, text))
        };

        let (status, text) = tokio::select! {
            res = exchange => res?,
            _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {
                return Err(ClientError::Timeout { timeout_ms });
            }
            _ = wait_cancelled(cancel.as_ref()) => {
                return Err(ClientError::Cancelled);
            }
        };

        let elapsed = started.elapsed();
        tracing::debug!(
            method = %method,
            url = %url_str,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "response"
        );
        self.hooks.debug(&TransportEvent::Response {
            method: &method,
            url: url_str,
            status,
            elapsed,
        });

        if !(200..300).contains(&status) {
            return Err(ClientError::from_response(status, &text));
        }

        decode_resource(status, &text)
    }
}

async fn wait_cancelled(cancel: Option<&CancelToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Decode a 2xx body. Empty bodies (204 and friends) become an empty resource.
fn decode_resource(status: u16, text: &str) -> ClientResult<Resource> {
    if text.trim().is_empty() {
        return Ok(Resource::default());
    }

    let value: Value = serde_json::from_str(text).map_err(|e| ClientError::InvalidResponse {
        status,
        message: e.to_string(),
    })?;

    if !value.is_object() {
        return Err(ClientError::InvalidResponse {
            status,
            message: "expected a JSON object".to_string(),
        });
    }

    Resource::from_value(value).map_err(|e| ClientError::InvalidResponse {
        status,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> Transport {
        Transport::new(ClientConfig::new(base))
    }

    #[test]
    fn test_resolve_relative_paths() {
        let t = transport("https://api.example.com/v1/");
        assert_eq!(
            t.resolve_url("/users").unwrap().as_str(),
            "https://api.example.com/v1/users"
        );
        assert_eq!(
            t.resolve_url("users?page=2").unwrap().as_str(),
            "https://api.example.com/v1/users?page=2"
        );
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let t = transport("https://api.example.com");
        assert_eq!(
            t.resolve_url("http://other.example.com/x").unwrap().as_str(),
            "http://other.example.com/x"
        );
    }

    #[test]
    fn test_resolve_without_base_fails() {
        let t = transport("");
        assert!(matches!(
            t.resolve_url("/users"),
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_call_headers_win() {
        let t = Transport::new(
            ClientConfig::new("http://localhost")
                .with_header("X-Tenant", "default")
                .with_header("Accept", "application/json"),
        );
        let mut call = BTreeMap::new();
        call.insert("x-tenant".to_string(), "acme".to_string());
        let headers = t.merged_headers(&call).unwrap();
        assert_eq!(headers.get("X-Tenant").unwrap(), "acme");
        assert_eq!(headers.get("accept").unwrap(), "application/json");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let t = transport("http://localhost");
        let mut call = BTreeMap::new();
        call.insert("bad header".to_string(), "x".to_string());
        assert!(t.merged_headers(&call).is_err());
    }

    #[test]
    fn test_set_headers_merges() {
        let mut t = Transport::new(ClientConfig::new("http://a").with_header("A", "1"));
        let mut extra = BTreeMap::new();
        extra.insert("B".to_string(), "2".to_string());
        t.set_headers(extra);
        t.set_base_url("http://b");
        assert_eq!(t.config().default_headers.len(), 2);
        assert_eq!(t.config().base_url, "http://b");
    }

    #[test]
    fn test_decode_empty_body() {
        assert_eq!(decode_resource(204, "").unwrap(), Resource::default());
    }

    #[test]
    fn test_decode_rejects_arrays() {
        assert!(matches!(
            decode_resource(200, "[1,2]"),
            Err(ClientError::InvalidResponse { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_token_resolves() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }
}
