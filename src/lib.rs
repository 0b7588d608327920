pub mod assertions;
pub mod config;
pub mod errors;
pub mod execute;
pub mod http_request;
pub mod http_request_executor;
pub mod http_response;
pub mod scenarios;

pub use assertions::{check_all, Expectation};
pub use errors::{AssertionFailure, HarnessError, HarnessResult};
pub use http_request::{HttpMethod, RequestSpec};
pub use http_request_executor::{execute_http_request, ExecutionContext};
pub use http_response::{ResponseBody, ResponseResult};
