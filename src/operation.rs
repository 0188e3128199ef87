//! GraphQL operations and the requests/replies that carry them.
//!
//! An [`Operation`] is the caller's payload. The link chain wraps it in a
//! [`PendingRequest`] that owns the headers for one dispatch; a replay after
//! renewal builds a new `PendingRequest` around the same `Arc<Operation>`.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::LinkError;
use crate::traits::Headers;

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// Header carrying the request content type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Shape of a GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Infer the kind of the first operation in a document.
    pub fn detect(document: &str) -> Self {
        Self::detect_named(document, None)
    }

    /// Infer the kind of the operation that `operation_name` selects.
    ///
    /// Fragment definitions are skipped, so a document may declare its
    /// fragments before the operation. Without a name, or when no operation
    /// carries it, the first operation decides. Anonymous shorthand
    /// documents (`{ ... }`) are queries.
    pub fn detect_named(document: &str, operation_name: Option<&str>) -> Self {
        let operations: Vec<Definition<'_>> = definitions(document)
            .into_iter()
            .filter(|d| matches!(d.keyword, None | Some("query" | "mutation" | "subscription")))
            .collect();

        let selected = operation_name
            .and_then(|wanted| operations.iter().find(|d| d.name == Some(wanted)))
            .or_else(|| operations.first());

        match selected.and_then(|d| d.keyword) {
            Some("mutation") => OperationKind::Mutation,
            Some("subscription") => OperationKind::Subscription,
            _ => OperationKind::Query,
        }
    }
}

/// A top-level definition: its keyword (`None` for shorthand) and name.
#[derive(Debug, PartialEq)]
struct Definition<'a> {
    keyword: Option<&'a str>,
    name: Option<&'a str>,
}

/// Scan the top-level definitions of a document.
///
/// Only the header of each definition is read; selection sets, argument
/// lists, comments and string literals are skipped.
fn definitions(document: &str) -> Vec<Definition<'_>> {
    let bytes = document.as_bytes();
    let mut found = Vec::new();
    let (mut braces, mut parens) = (0usize, 0usize);
    let (mut keyword, mut name) = (None, None);
    let mut directive = false;
    let mut i = 0;

    while i < bytes.len() {
        let top_level = braces == 0 && parens == 0;
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'{' => {
                if top_level {
                    found.push(Definition {
                        keyword: keyword.take(),
                        name: name.take(),
                    });
                    directive = false;
                }
                braces += 1;
            }
            b'}' => braces = braces.saturating_sub(1),
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'@' if top_level => directive = true,
            c if c == b'_' || c.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                if top_level {
                    let ident = &document[start..i];
                    if directive {
                        directive = false;
                    } else if keyword.is_none() {
                        keyword = Some(ident);
                    } else if name.is_none() {
                        name = Some(ident);
                    }
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    found
}

/// Index just past the string literal opening at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    if bytes[start..].starts_with(b"\"\"\"") {
        let mut i = start + 3;
        while i < bytes.len() {
            if bytes[i..].starts_with(b"\\\"\"\"") {
                i += 4;
            } else if bytes[i..].starts_with(b"\"\"\"") {
                return i + 3;
            } else {
                i += 1;
            }
        }
        return bytes.len();
    }

    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' | b'\n' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

/// A GraphQL operation as issued by a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub query: String,
    pub variables: serde_json::Value,
    #[serde(skip)]
    pub kind: OperationKind,
}

impl Operation {
    /// Create an operation, inferring its kind from the document.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let kind = OperationKind::detect(&query);
        Self {
            operation_name: None,
            query,
            variables: serde_json::Value::Object(Default::default()),
            kind,
        }
    }

    /// Set the operation name sent as `operationName`.
    ///
    /// The kind is re-inferred from the named operation, so call
    /// [`with_kind`](Self::with_kind) afterwards to override it.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.kind = OperationKind::detect_named(&self.query, Some(&name));
        self.operation_name = Some(name);
        self
    }

    /// Set the variables object.
    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = variables;
        self
    }

    /// Override the inferred kind.
    pub fn with_kind(mut self, kind: OperationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Name used in logs: the operation name, or the kind when anonymous.
    pub fn label(&self) -> String {
        match &self.operation_name {
            Some(name) => name.clone(),
            None => format!("anonymous {}", self.kind),
        }
    }

    /// JSON request body.
    pub fn to_body(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            serde_json::json!({ "query": self.query, "variables": self.variables }).to_string()
        })
    }
}

/// One in-flight dispatch of an operation.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Correlates the original dispatch with its replay in logs.
    pub request_id: Uuid,
    pub operation: Arc<Operation>,
    pub headers: Headers,
}

impl PendingRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation: Arc::new(operation),
            headers: Headers::new(),
        }
    }

    /// Set a header, replacing any existing value with the same name
    /// (compared case-insensitively).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }

    /// Remove a header (case-insensitive).
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    }

    /// Look up a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set `Authorization: Bearer <token>`.
    pub fn set_bearer(&mut self, token: &str) {
        self.set_header(AUTHORIZATION, format!("Bearer {}", token));
    }

    /// The replay of this request: same payload and id, headers to be
    /// rewritten by the caller.
    pub fn replay(&self) -> Self {
        Self {
            request_id: self.request_id,
            operation: Arc::clone(&self.operation),
            headers: self.headers.clone(),
        }
    }
}

/// An error entry from a GraphQL response's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: None,
        }
    }

    /// `extensions.code`, when the server sets one.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|code| code.as_str())
    }
}

/// A GraphQL response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl OperationResponse {
    pub fn from_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Convert a response carrying errors into a [`LinkError::Graphql`].
    pub fn into_result(self) -> Result<Self, LinkError> {
        if self.has_errors() {
            Err(LinkError::Graphql {
                errors: self.errors,
                data: self.data,
            })
        } else {
            Ok(self)
        }
    }
}

/// Events of a subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<OperationResponse, LinkError>> + Send>>;

/// Outcome of a successful dispatch.
pub enum Reply {
    Unary(OperationResponse),
    Stream(EventStream),
}

impl Reply {
    /// The unary response, or `None` for a stream.
    pub fn into_unary(self) -> Option<OperationResponse> {
        match self {
            Reply::Unary(response) => Some(response),
            Reply::Stream(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Reply::Stream(_))
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Unary(response) => f.debug_tuple("Unary").field(response).finish(),
            Reply::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}
