// src/api/payload.rs
// =============================================================================
// Validation of the /load_urls request body.
//
// Accepted: Content-Type starting with application/json, and a body that is
// a JSON array whose elements are all strings. Anything else is rejected
// before a single URL is queued.
// =============================================================================

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedSubmission {
    #[error("content type must be application/json")]
    NotJson,

    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("body must be a JSON array of strings")]
    NotAnArray,

    #[error("element {0} of the array is not a string")]
    NonStringElement(usize),
}

// Checks headers + body and returns the submitted URLs in order
pub fn parse_url_batch(headers: &HeaderMap, body: &[u8]) -> Result<Vec<String>, MalformedSubmission> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(MalformedSubmission::NotJson);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| MalformedSubmission::InvalidJson(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(MalformedSubmission::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(url) => Ok(url),
            _ => Err(MalformedSubmission::NonStringElement(i)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json_headers(ct: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        headers
    }

    #[test]
    fn test_array_of_strings() {
        let urls = parse_url_batch(
            &json_headers("application/json"),
            br#"["http://a.test","http://a.test","http://b.test"]"#,
        )
        .unwrap();
        assert_eq!(urls, vec!["http://a.test", "http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_content_type_with_charset() {
        let urls = parse_url_batch(&json_headers("application/json; charset=utf-8"), b"[]").unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_missing_content_type() {
        let err = parse_url_batch(&HeaderMap::new(), br#"["http://a.test"]"#).unwrap_err();
        assert_eq!(err, MalformedSubmission::NotJson);
    }

    #[test]
    fn test_wrong_content_type() {
        let err = parse_url_batch(&json_headers("text/plain"), br#"["http://a.test"]"#).unwrap_err();
        assert_eq!(err, MalformedSubmission::NotJson);
    }

    #[test]
    fn test_object_body() {
        let err = parse_url_batch(&json_headers("application/json"), br#"{"x":1}"#).unwrap_err();
        assert_eq!(err, MalformedSubmission::NotAnArray);
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_url_batch(&json_headers("application/json"), b"[not json").unwrap_err();
        assert!(matches!(err, MalformedSubmission::InvalidJson(_)));
    }

    #[test]
    fn test_non_string_element() {
        let err =
            parse_url_batch(&json_headers("application/json"), br#"["http://a.test", 3]"#).unwrap_err();
        assert_eq!(err, MalformedSubmission::NonStringElement(1));
    }
}
