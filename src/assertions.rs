use std::fmt::{Display, Formatter};

use regex::Regex;
use serde_json::Value;

use crate::errors::AssertionFailure;
use crate::http_response::{ResponseBody, ResponseResult};

/// One predicate evaluated against a response.
#[derive(Debug, Clone)]
pub enum Expectation {
    Status(u16),
    /// `path` is dotted (`args.random`); an empty path selects the whole body.
    BodyEquals { path: String, expected: Value },
    /// Header as echoed back under `body.headers`.
    EchoedHeader { name: String, expected: String },
    ResponseHeader { name: String, expected: String },
    BodyMatches { path: String, pattern: Regex },
    DurationBelow(u64),
}

impl Expectation {
    pub fn body_equals(path: &str, expected: Value) -> Expectation {
        Expectation::BodyEquals { path: path.to_string(), expected }
    }

    pub fn echoed_header(name: &str, expected: &str) -> Expectation {
        Expectation::EchoedHeader { name: name.to_string(), expected: expected.to_string() }
    }

    pub fn response_header(name: &str, expected: &str) -> Expectation {
        Expectation::ResponseHeader { name: name.to_string(), expected: expected.to_string() }
    }

    pub fn body_matches(path: &str, pattern: Regex) -> Expectation {
        Expectation::BodyMatches { path: path.to_string(), pattern }
    }

    pub fn check(&self, result: &ResponseResult) -> Result<(), AssertionFailure> {
        match self {
            Expectation::Status(expected) => assert_status(result, *expected),
            Expectation::BodyEquals { path, expected } => assert_body_equals(result, path, expected),
            Expectation::EchoedHeader { name, expected } => assert_header_equals(result, name, expected),
            Expectation::ResponseHeader { name, expected } => assert_response_header_equals(result, name, expected),
            Expectation::BodyMatches { path, pattern } => assert_body_matches(result, path, pattern),
            Expectation::DurationBelow(threshold) => assert_duration_below(result, *threshold),
        }
    }
}

impl Display for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Status(expected) => write!(f, "status == {}", expected),
            Expectation::BodyEquals { path, expected } => write!(f, "{} == {}", body_label(path), expected),
            Expectation::EchoedHeader { name, expected } => write!(f, "body.headers[{}] == {:?}", name, expected),
            Expectation::ResponseHeader { name, expected } => write!(f, "header {} == {:?}", name, expected),
            Expectation::BodyMatches { path, pattern } => write!(f, "{} =~ /{}/", body_label(path), pattern),
            Expectation::DurationBelow(threshold) => write!(f, "duration < {}ms", threshold),
        }
    }
}

/// Evaluates every expectation in order and stops at the first that fails.
pub fn check_all(result: &ResponseResult, expectations: &[Expectation]) -> Result<(), AssertionFailure> {
    for expectation in expectations {
        expectation.check(result)?;
    }
    Ok(())
}

pub fn assert_status(result: &ResponseResult, expected: u16) -> Result<(), AssertionFailure> {
    if result.status_code == expected {
        return Ok(());
    }
    Err(AssertionFailure::new("status", expected, result.status_code))
}

/// Deep equality; JSON objects compare as unordered key sets.
pub fn assert_body_equals(result: &ResponseResult, path: &str, expected: &Value) -> Result<(), AssertionFailure> {
    let label = body_label(path);
    let actual = select(result, path).map_err(|actual| AssertionFailure::new(&label, expected, actual))?;
    if actual == expected {
        return Ok(());
    }
    Err(AssertionFailure::new(label, expected, actual))
}

pub fn assert_header_equals(result: &ResponseResult, name: &str, expected: &str) -> Result<(), AssertionFailure> {
    let label = format!("body.headers[{}]", name);
    let echoed = select(result, "headers").map_err(|actual| AssertionFailure::new(&label, quoted(expected), actual))?;
    let actual = echoed
        .as_object()
        .and_then(|headers| headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
        .map(|(_, value)| value);

    return match actual {
        Some(Value::String(value)) if value == expected => Ok(()),
        Some(value) => Err(AssertionFailure::new(label, quoted(expected), value)),
        None => Err(AssertionFailure::new(label, quoted(expected), "<missing>")),
    };
}

pub fn assert_response_header_equals(result: &ResponseResult, name: &str, expected: &str) -> Result<(), AssertionFailure> {
    let label = format!("header {}", name);
    return match result.headers.get(name) {
        Some(value) if value.as_bytes() == expected.as_bytes() => Ok(()),
        Some(value) => Err(AssertionFailure::new(
            label,
            quoted(expected),
            quoted(&String::from_utf8_lossy(value.as_bytes())),
        )),
        None => Err(AssertionFailure::new(label, quoted(expected), "<missing>")),
    };
}

pub fn assert_body_matches(result: &ResponseResult, path: &str, pattern: &Regex) -> Result<(), AssertionFailure> {
    let label = body_label(path);
    let expected = format!("a string matching /{}/", pattern);
    let actual = select(result, path).map_err(|actual| AssertionFailure::new(&label, &expected, actual))?;
    return match actual {
        Value::String(text) if pattern.is_match(text) => Ok(()),
        other => Err(AssertionFailure::new(label, expected, other)),
    };
}

pub fn assert_duration_below(result: &ResponseResult, threshold_millis: u64) -> Result<(), AssertionFailure> {
    let actual = result.duration_millis();
    if actual < u128::from(threshold_millis) {
        return Ok(());
    }
    Err(AssertionFailure::new(
        "duration",
        format!("< {}ms", threshold_millis),
        format!("{}ms", actual),
    ))
}

/// Resolves a dotted path inside the JSON body. The error carries a
/// description of what was found instead.
fn select<'a>(result: &'a ResponseResult, path: &str) -> Result<&'a Value, String> {
    let root = match &result.body {
        ResponseBody::Json(value) => value,
        ResponseBody::Raw(bytes) => return Err(format!("<non-JSON body of {} bytes>", bytes.len())),
    };

    let mut current = root;
    for segment in path.split('.').filter(|segment| !segment.is_empty()) {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        };
        current = next.ok_or_else(|| "<missing>".to_string())?;
    }
    Ok(current)
}

fn body_label(path: &str) -> String {
    if path.is_empty() {
        "body".to_string()
    } else {
        format!("body.{}", path)
    }
}

fn quoted(value: &str) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::{HeaderMap, HeaderValue};
    use serde_json::json;
    use std::time::Duration;

    fn echo(body: Value) -> ResponseResult {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        ResponseResult::new(200, headers, ResponseBody::Json(body), Duration::from_millis(1200))
    }

    #[test]
    fn status_mismatch_reports_both_values() {
        let failure = assert_status(&echo(json!({})), 404).unwrap_err();
        assert_eq!(failure, AssertionFailure::new("status", 404, 200));
        assert!(assert_status(&echo(json!({})), 200).is_ok());
    }

    #[test]
    fn body_equality_ignores_key_order() {
        let result = echo(json!({"json": {"type": "test", "name": "Cypress"}}));
        assert!(assert_body_equals(&result, "json", &json!({"name": "Cypress", "type": "test"})).is_ok());
    }

    #[test]
    fn body_equality_requires_identical_key_sets() {
        let result = echo(json!({"args": {"name": "Cypress", "type": "test", "extra": "1"}}));
        let failure = assert_body_equals(&result, "args", &json!({"name": "Cypress", "type": "test"})).unwrap_err();
        assert_eq!(failure.expectation, "body.args");
        assert_eq!(failure.expected, r#"{"name":"Cypress","type":"test"}"#);
    }

    #[test]
    fn empty_path_selects_whole_body() {
        let result = echo(json!({"args": {}}));
        assert!(assert_body_equals(&result, "", &json!({"args": {}})).is_ok());
    }

    #[test]
    fn missing_path_is_reported() {
        let failure = assert_body_equals(&echo(json!({"args": {}})), "args.random", &json!("abc")).unwrap_err();
        assert_eq!(failure.actual, "<missing>");
    }

    #[test]
    fn array_segments_index_into_lists() {
        let result = echo(json!({"items": [{"id": 1}, {"id": 2}]}));
        assert!(assert_body_equals(&result, "items.1.id", &json!(2)).is_ok());
    }

    #[test]
    fn raw_bodies_fail_json_expectations() {
        let result = ResponseResult::new(200, HeaderMap::new(), ResponseBody::Raw(Vec::new()), Duration::ZERO);
        let failure = assert_body_equals(&result, "json", &json!({})).unwrap_err();
        assert_eq!(failure.actual, "<non-JSON body of 0 bytes>");
    }

    #[test]
    fn echoed_header_name_is_case_insensitive_value_is_not() {
        let result = echo(json!({"headers": {"User-Agent": "Cypress Test"}}));
        assert!(assert_header_equals(&result, "user-agent", "Cypress Test").is_ok());

        let failure = assert_header_equals(&result, "User-Agent", "cypress test").unwrap_err();
        assert_eq!(failure.expected, "\"cypress test\"");
        assert_eq!(failure.actual, "\"Cypress Test\"");
    }

    #[test]
    fn missing_echoed_header_is_reported() {
        let result = echo(json!({"headers": {"Host": "localhost"}}));
        let failure = assert_header_equals(&result, "X-Custom-Header", "Cypress Test Header").unwrap_err();
        assert_eq!(failure.actual, "<missing>");
    }

    #[test]
    fn response_headers_are_looked_up_case_insensitively() {
        let result = echo(json!({}));
        assert!(assert_response_header_equals(&result, "Content-Type", "application/json").is_ok());
        assert!(assert_response_header_equals(&result, "content-type", "Application/JSON").is_err());
        assert!(assert_response_header_equals(&result, "x-missing", "").is_err());
    }

    #[test]
    fn body_matches_requires_a_matching_string() {
        let result = echo(json!({"args": {"random": "k3x9qa", "count": 3}}));
        let pattern = Regex::new("^[a-z0-9]+$").unwrap();
        assert!(assert_body_matches(&result, "args.random", &pattern).is_ok());
        assert!(assert_body_matches(&result, "args.count", &pattern).is_err());
    }

    #[test]
    fn duration_bound_is_strict() {
        let result = echo(json!({}));
        assert!(assert_duration_below(&result, 2000).is_ok());

        let failure = assert_duration_below(&result, 1200).unwrap_err();
        assert_eq!(failure.to_string(), "duration: expected < 1200ms, got 1200ms");
    }

    #[test]
    fn check_all_stops_at_first_failure() {
        let result = echo(json!({"args": {"name": "Cypress"}}));
        let expectations = vec![
            Expectation::Status(200),
            Expectation::body_equals("args.name", json!("Other")),
            Expectation::DurationBelow(10),
        ];

        let failure = check_all(&result, &expectations).unwrap_err();
        assert_eq!(failure.expectation, "body.args.name");
        assert_eq!(expectations[1].to_string(), r#"body.args.name == "Other""#);
    }
}
