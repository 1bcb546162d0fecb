//! Request preparation.
//!
//! Turns an HTTP method, a resource path and a parameter mapping into a
//! [`PreparedRequest`]: page-size defaulting, query/body placement and blank
//! value elision all happen here, without any I/O, so the rules can be
//! checked in isolation from the network.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::EmsError;

/// Parameter mapping passed to the executor. Key presence is significant.
pub type Params = Map<String, Value>;

/// Parameters that always travel in the query string, even on POST.
pub const PAGING_FIELDS: &[&str] = &["page", "pageSize"];

/// HTTP methods the EMS API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = EmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(EmsError::UnsupportedMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// A request described as plain data, ready to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, Value)>,
    pub body: Option<Params>,
}

impl PreparedRequest {
    /// Build a request from a parameter mapping.
    ///
    /// * `default_page_size` – used when `pageSize` is absent, `null` or `""`
    /// * `query_fields` – extra fields moved to the query string on POST
    pub fn build(
        method: Method,
        path: &str,
        mut params: Params,
        default_page_size: Option<u32>,
        query_fields: &[&str],
    ) -> Self {
        let page_size_missing = match params.get("pageSize") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if page_size_missing {
            params.insert(
                "pageSize".into(),
                default_page_size.map_or(Value::Null, Value::from),
            );
        }

        match method {
            Method::Get => Self {
                method,
                path: path.to_string(),
                query: params.into_iter().collect(),
                body: None,
            },
            Method::Post => {
                let mut query = Vec::new();
                for field in PAGING_FIELDS.iter().chain(query_fields) {
                    if let Some(value) = params.remove(*field) {
                        query.push((field.to_string(), value));
                    }
                }
                elide_blank(&mut params);
                Self {
                    method,
                    path: path.to_string(),
                    query,
                    body: Some(params),
                }
            }
        }
    }

    /// Query pairs as sent on the wire.
    ///
    /// `null` entries are left out, arrays become repeated keys and booleans
    /// render as `true`/`false`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        if let Some(rendered) = render_scalar(item) {
                            pairs.push((key.clone(), rendered));
                        }
                    }
                }
                other => {
                    if let Some(rendered) = render_scalar(other) {
                        pairs.push((key.clone(), rendered));
                    }
                }
            }
        }
        pairs
    }
}

/// Remove body fields that are not meaningfully set.
///
/// Only `""` and `null` are dropped. `false`, `0` and arrays (even empty
/// ones) are explicit values and stay.
pub fn elide_blank(body: &mut Params) {
    body.retain(|_, value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    });
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
