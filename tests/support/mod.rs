//! Local stand-in for httpbin.org, so the checks run without network access.

#![allow(dead_code)]

use std::time::Duration;

use reqwest::Url;
use serde_json::{json, Map, Value};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub struct EchoServer {
    server: MockServer,
    // declared last so the server is dropped before its runtime
    runtime: tokio::runtime::Runtime,
}

impl EchoServer {
    pub fn start() -> EchoServer {
        let runtime = tokio::runtime::Runtime::new().expect("failed to build tokio runtime");
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(any()).respond_with(HttpbinEcho).mount(&server).await;
            server
        });
        EchoServer { server, runtime }
    }

    /// Server answering every request with `template`, expecting exactly
    /// `calls` requests.
    pub fn answering(template: ResponseTemplate, calls: u64) -> EchoServer {
        let runtime = tokio::runtime::Runtime::new().expect("failed to build tokio runtime");
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(any()).respond_with(template).expect(calls).mount(&server).await;
            server
        });
        EchoServer { server, runtime }
    }

    pub fn received_requests(&self) -> usize {
        self.runtime
            .block_on(self.server.received_requests())
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    pub fn verify(&self) {
        self.runtime.block_on(self.server.verify());
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&self.server.uri()).expect("mock server uri is a url")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }
}

/// Answers the way httpbin.org does for the endpoints the suite uses.
struct HttpbinEcho;

impl Respond for HttpbinEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();
        match (request.method.as_str(), path.as_str()) {
            ("GET" | "HEAD", "/get") => ResponseTemplate::new(200).set_body_json(json!({
                "args": args(request),
                "headers": headers(request),
                "origin": "127.0.0.1",
                "url": request.url.as_str(),
            })),
            ("GET", "/headers") => ResponseTemplate::new(200).set_body_json(json!({ "headers": headers(request) })),
            ("POST", "/post") | ("PUT", "/put") | ("DELETE", "/delete") => {
                ResponseTemplate::new(200).set_body_json(with_body(request))
            }
            ("GET", delay) if delay.starts_with("/delay/") => {
                let secs = delay["/delay/".len()..].parse::<u64>().unwrap_or(0).min(10);
                ResponseTemplate::new(200)
                    .set_body_json(with_body(request))
                    .set_delay(Duration::from_secs(secs))
            }
            (_, status) if status.starts_with("/status/") => {
                let code = status["/status/".len()..].parse::<u16>().unwrap_or(400);
                ResponseTemplate::new(code)
            }
            (_, "/get" | "/headers" | "/post" | "/put" | "/delete") => ResponseTemplate::new(405),
            _ => ResponseTemplate::new(404),
        }
    }
}

fn args(request: &Request) -> Value {
    let mut args = Map::new();
    for (name, value) in request.url.query_pairs() {
        args.insert(name.into_owned(), Value::String(value.into_owned()));
    }
    Value::Object(args)
}

fn headers(request: &Request) -> Value {
    let mut headers = Map::new();
    for (name, value) in request.headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers.insert(title_case(name.as_str()), Value::String(value));
    }
    Value::Object(headers)
}

fn with_body(request: &Request) -> Value {
    json!({
        "args": args(request),
        "data": String::from_utf8_lossy(&request.body),
        "files": {},
        "form": {},
        "headers": headers(request),
        "json": serde_json::from_slice::<Value>(&request.body).unwrap_or(Value::Null),
        "origin": "127.0.0.1",
        "url": request.url.as_str(),
    })
}

fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
