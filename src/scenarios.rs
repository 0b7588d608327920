use rand::Rng;
use regex::Regex;
use reqwest::Url;
use serde_json::{json, Value};

use crate::assertions::Expectation;
use crate::errors::{HarnessError, HarnessResult};
use crate::http_request::{HttpMethod, RequestSpec};

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 6;

/// A named request together with what its response has to satisfy.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub request: RequestSpec,
    pub expectations: Vec<Expectation>,
}

impl Scenario {
    pub fn matches(&self, filter: &str) -> bool {
        self.name.contains(filter)
    }
}

/// Fresh lowercase base-36 token.
pub fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

fn payload() -> Value {
    json!({"name": "Cypress", "type": "test"})
}

fn endpoint(base_url: &Url, path: &str) -> String {
    format!("{}{}", base_url.as_str().trim_end_matches('/'), path)
}

/// The echo-service checks, in execution order. Every request tolerates
/// error statuses so the status expectation reports the mismatch.
pub fn httpbin_suite(base_url: &Url) -> HarnessResult<Vec<Scenario>> {
    let get = |path: &str| RequestSpec::builder(HttpMethod::Get, endpoint(base_url, path)).tolerate_error_status(true);

    let token = random_token();
    let token_pattern =
        Regex::new("^[a-z0-9]+$").map_err(|e| HarnessError::InvalidRequest(format!("token pattern: {}", e)))?;

    let scenarios = vec![
        Scenario {
            name: "get",
            description: "GET request should return 200",
            request: get("/get").build()?,
            expectations: vec![Expectation::Status(200)],
        },
        Scenario {
            name: "post-json",
            description: "POST request with JSON body should return 200 and correct JSON",
            request: RequestSpec::builder(HttpMethod::Post, endpoint(base_url, "/post"))
                .json(payload())
                .tolerate_error_status(true)
                .build()?,
            expectations: vec![Expectation::Status(200), Expectation::body_equals("json", payload())],
        },
        Scenario {
            name: "put-json",
            description: "PUT request should return 200 and correct JSON",
            request: RequestSpec::builder(HttpMethod::Put, endpoint(base_url, "/put"))
                .json(payload())
                .tolerate_error_status(true)
                .build()?,
            expectations: vec![Expectation::Status(200), Expectation::body_equals("json", payload())],
        },
        Scenario {
            name: "delete",
            description: "DELETE request should return 200",
            request: RequestSpec::builder(HttpMethod::Delete, endpoint(base_url, "/delete"))
                .tolerate_error_status(true)
                .build()?,
            expectations: vec![Expectation::Status(200)],
        },
        Scenario {
            name: "head",
            description: "HEAD request should return 200",
            request: RequestSpec::builder(HttpMethod::Head, endpoint(base_url, "/get"))
                .tolerate_error_status(true)
                .build()?,
            expectations: vec![Expectation::Status(200)],
        },
        Scenario {
            name: "user-agent-header",
            description: "GET request with User-Agent header should return 200 and correct header",
            request: get("/headers").header("User-Agent", "Cypress Test").build()?,
            expectations: vec![Expectation::Status(200), Expectation::echoed_header("User-Agent", "Cypress Test")],
        },
        Scenario {
            name: "custom-header",
            description: "GET request with custom header should return 200 and correct header",
            request: get("/headers").header("X-Custom-Header", "Cypress Test Header").build()?,
            expectations: vec![
                Expectation::Status(200),
                Expectation::echoed_header("X-Custom-Header", "Cypress Test Header"),
            ],
        },
        Scenario {
            name: "query-params",
            description: "GET request with query parameters should return 200 and correct parameters",
            request: get("/get").query("name", "Cypress").query("type", "test").build()?,
            expectations: vec![Expectation::Status(200), Expectation::body_equals("args", payload())],
        },
        Scenario {
            name: "random-query-param",
            description: "GET request with random query parameters should return 200 and correct parameters",
            request: get("/get").query("random", token.as_str()).build()?,
            expectations: vec![
                Expectation::Status(200),
                Expectation::body_matches("args.random", token_pattern),
                Expectation::body_equals("args.random", Value::String(token)),
            ],
        },
        Scenario {
            name: "delay",
            description: "GET request to delay endpoint should return 200 and complete within 2 seconds",
            request: get("/delay/1").build()?,
            expectations: vec![Expectation::Status(200), Expectation::DurationBelow(2000)],
        },
    ];
    Ok(scenarios)
}
