use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::assertions::check_all;
use crate::errors::{HarnessError, HarnessResult};
use crate::http_request_executor::{execute_http_request, ExecutionContext};
use crate::http_response::ResponseResult;
use crate::scenarios::Scenario;

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: &'static str,
    pub description: &'static str,
    pub elapsed: Duration,
    pub result: HarnessResult<u16>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.passed()).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "run {} started {}: {} passed, {} failed",
            self.run_id,
            self.started_at.to_rfc3339(),
            self.outcomes.len() - self.failed(),
            self.failed()
        )
    }
}

/// Executes one scenario: a single round trip, then every expectation.
pub fn run_scenario(scenario: &Scenario, context: &ExecutionContext) -> HarnessResult<ResponseResult> {
    let response = execute_http_request(&scenario.request, context)?;
    check_all(&response, &scenario.expectations)?;
    Ok(response)
}

/// Runs scenarios one after another. A failing scenario is recorded and the
/// next one still runs.
pub fn run_suite(scenarios: &[Scenario], context: &ExecutionContext) -> SuiteReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = info_span!("suite", %run_id);
    let _guard = span.enter();

    let mut outcomes = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let started = Instant::now();
        let result = run_scenario(scenario, context).map(|response| response.status_code);
        let elapsed = started.elapsed();

        match &result {
            Ok(status) => info!(scenario = scenario.name, status, elapsed_ms = elapsed.as_millis() as u64, "passed"),
            Err(HarnessError::Assertion(failure)) => warn!(scenario = scenario.name, %failure, "assertion failed"),
            Err(err) => warn!(scenario = scenario.name, error = %err, "request failed"),
        }

        outcomes.push(ScenarioOutcome { name: scenario.name, description: scenario.description, elapsed, result });
    }

    SuiteReport { run_id, started_at, outcomes }
}
