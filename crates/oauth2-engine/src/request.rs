//! Protocol-neutral request/response envelope.
//!
//! The engine never touches a transport; hosts map their framework's
//! request/response into these structures per call. Header keys are
//! lower-cased on insert so lookups are case-insensitive.

use std::collections::HashMap;

use serde_json::Value;

/// An inbound request as seen by the engine.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    headers: HashMap<String, String>,
    body: HashMap<String, String>,
    query: HashMap<String, String>,
}

impl Request {
    /// Create an empty request with the given method (upper-cased).
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            headers: HashMap::new(),
            body: HashMap::new(),
            query: HashMap::new(),
        }
    }

    /// Add a header (key stored lower-cased).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Add a form-body parameter.
    #[must_use]
    pub fn with_body_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    /// Add a query-string parameter.
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// The HTTP method, upper-cased.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Form-body parameter lookup.
    #[must_use]
    pub fn body_param(&self, name: &str) -> Option<&str> {
        self.body.get(name).map(String::as_str)
    }

    /// Query-string parameter lookup.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Whether the request body is form-encoded
    /// (`application/x-www-form-urlencoded`, charset parameters ignored).
    #[must_use]
    pub fn is_form_encoded(&self) -> bool {
        self.header("content-type")
            .is_some_and(|ct| ct.split(';').next().map(str::trim)
                == Some("application/x-www-form-urlencoded"))
    }
}

/// A mutable response the engine writes status, headers and a JSON body into.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Option<Value>,
}

impl Response {
    /// Create an empty 200 response.
    #[must_use]
    pub fn new() -> Self {
        Self { status: 200, headers: HashMap::new(), body: None }
    }

    /// The response status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Set the response status code.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Set a header (key stored lower-cased).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// The JSON body, when one was written.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Set the JSON body.
    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
