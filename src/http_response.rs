use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Raw(Vec<u8>),
}

impl ResponseBody {
    /// Parses the payload as JSON, keeping the bytes when it is not.
    pub fn from_bytes(bytes: Vec<u8>) -> ResponseBody {
        if bytes.is_empty() {
            return ResponseBody::Raw(bytes);
        }
        return match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(bytes),
        };
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Raw(bytes) if bytes.is_empty())
    }
}

/// Observed outcome of executing one request.
#[derive(Debug, Clone)]
pub struct ResponseResult {
    pub status_code: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody,
    pub duration: Duration,
}

impl ResponseResult {
    pub fn new(status_code: u16, headers: HeaderMap, body: ResponseBody, duration: Duration) -> ResponseResult {
        return ResponseResult { status_code, headers, body, duration };
    }

    pub fn duration_millis(&self) -> u128 {
        self.duration.as_millis()
    }

    /// Header value as text; lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        match &self.body {
            ResponseBody::Json(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            ResponseBody::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn json_payloads_are_parsed() {
        let body = ResponseBody::from_bytes(br#"{"args": {"name": "Cypress"}}"#.to_vec());
        assert_eq!(body.as_json(), Some(&json!({"args": {"name": "Cypress"}})));
    }

    #[test]
    fn other_payloads_stay_raw() {
        assert_eq!(ResponseBody::from_bytes(b"<html></html>".to_vec()), ResponseBody::Raw(b"<html></html>".to_vec()));

        let empty = ResponseBody::from_bytes(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.as_json(), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let result = ResponseResult::new(200, headers, ResponseBody::Raw(Vec::new()), Duration::from_millis(12));

        assert_eq!(result.header("Content-Type"), Some("application/json"));
        assert_eq!(result.header("x-missing"), None);
        assert_eq!(result.duration_millis(), 12);
    }
}
