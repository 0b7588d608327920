use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde_json::Value;

use crate::errors::{HarnessError, HarnessResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "head" => Ok(HttpMethod::Head),
            _ => Err(HarnessError::InvalidRequest(format!("{} is a unknown http method", s))),
        }
    }
}

/// Immutable description of one HTTP call.
///
/// Built through [`RequestSpec::builder`], which validates the url and every
/// header up front; nothing can be changed after `build`.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: HttpMethod,
    url: Url,
    headers: HeaderMap,
    query_params: BTreeMap<String, String>,
    body: Option<Value>,
    tolerate_error_status: bool,
}

impl RequestSpec {
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> RequestSpecBuilder {
        return RequestSpecBuilder {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: BTreeMap::new(),
            body: None,
            tolerate_error_status: false,
        };
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn tolerate_error_status(&self) -> bool {
        self.tolerate_error_status
    }

    /// Url including the encoded query parameters, as sent on the wire.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query_params.iter());
        }
        return url;
    }
}

#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    query_params: BTreeMap<String, String>,
    body: Option<Value>,
    tolerate_error_status: bool,
}

impl RequestSpecBuilder {
    /// The value is sent as given, surrounding whitespace included.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn tolerate_error_status(mut self, tolerate: bool) -> Self {
        self.tolerate_error_status = tolerate;
        self
    }

    pub fn build(self) -> HarnessResult<RequestSpec> {
        let url = self
            .url
            .trim()
            .parse::<Url>()
            .map_err(|e| HarnessError::InvalidRequest(format!("{} @ '{}'", e, self.url)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(HarnessError::InvalidRequest(format!("unsupported scheme in '{}'", url)));
        }

        // later values for the same (case-insensitive) name replace earlier ones
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let key = HeaderName::try_from(name.trim())
                .map_err(|e| HarnessError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| HarnessError::InvalidRequest(format!("header value for '{}': {}", name, e)))?;
            headers.insert(key, value);
        }

        return Ok(RequestSpec {
            method: self.method,
            url,
            headers,
            query_params: self.query_params,
            body: self.body,
            tolerate_error_status: self.tolerate_error_status,
        });
    }
}

/// Splits a `Name: value` header line.
pub fn parse_header_line(line: &str) -> HarnessResult<(String, String)> {
    return match line.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
        _ => Err(HarnessError::InvalidRequest(format!("header '{}' is not of the form 'Name: value'", line))),
    };
}

/// Splits a `name=value` query parameter.
pub fn parse_query_pair(pair: &str) -> HarnessResult<(String, String)> {
    return match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(HarnessError::InvalidRequest(format!("query parameter '{}' is not of the form 'name=value'", pair))),
    };
}
