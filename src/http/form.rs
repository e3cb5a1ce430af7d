//! URL-encoded form decoding
//!
//! Field lookup prefers the request body over the URL query string, the way
//! HTML form values are usually resolved.

use url::form_urlencoded;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Decoded form fields of one request.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    body: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl FormData {
    /// Decode the body when `content_type` says it is URL-encoded; other
    /// bodies contribute no fields.
    pub fn from_request(content_type: Option<&str>, body: &[u8], query: Option<&str>) -> Self {
        let body = if is_urlencoded(content_type) {
            decode(body)
        } else {
            Vec::new()
        };
        let query = query.map(|q| decode(q.as_bytes())).unwrap_or_default();
        Self { body, query }
    }

    /// First value for `name`, body fields before query fields.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.body_value(name).or_else(|| find(&self.query, name))
    }

    /// First value for `name` from the body only.
    pub fn body_value(&self, name: &str) -> Option<&str> {
        find(&self.body, name)
    }
}

fn decode(input: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(input).into_owned().collect()
}

fn find<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn is_urlencoded(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}
