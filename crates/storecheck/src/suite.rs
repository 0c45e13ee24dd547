//! Scenario runner.
//!
//! Each scenario gets a fresh browsing session from the factory. A failed
//! scenario is screenshotted and recorded, and the suite moves on.

use crate::commands::{CommandContext, CommandRegistry};
use crate::config::SuiteConfig;
use crate::context::BrowserSession;
use crate::driver::BrowserDriver;
use crate::fixture::{FixtureStore, TaskRegistry};
use crate::helpers::file_stamp;
use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Page loads must finish under this
pub const PAGE_LOAD_BUDGET: Duration = Duration::from_millis(3000);

/// API calls must finish under this
pub const API_CALL_BUDGET: Duration = Duration::from_millis(2000);

/// Builds one driver per scenario
pub type SessionFactory = Arc<dyn Fn() -> Arc<dyn BrowserDriver> + Send + Sync>;

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        })
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    pub status: ScenarioStatus,
    /// Wall time including setup
    pub duration: Duration,
    /// Error message if failed
    pub error: Option<String>,
    /// Failure screenshot, when one could be taken
    pub screenshot: Option<PathBuf>,
}

impl ScenarioResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Results from running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Correlates this run's log lines
    pub run_id: Uuid,
    /// Individual results in run order
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ScenarioResult::passed)
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed()).collect()
    }

    /// `<suite>: N passed, M failed (T ms)`
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed ({} ms)",
            self.suite_name,
            self.passed_count(),
            self.failed_count(),
            self.duration().as_millis()
        )
    }
}

/// Everything a scenario body can reach
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Fresh session for this scenario
    pub session: BrowserSession,
    /// Command context over the same session
    pub commands: CommandContext,
    registry: Arc<CommandRegistry>,
    fixtures: FixtureStore,
    tasks: Arc<TaskRegistry>,
}

impl Scenario {
    /// Invoke a registered command by name
    pub async fn invoke(&self, name: &str, args: Vec<Value>) -> CheckResult<Value> {
        self.registry.invoke(&self.commands, name, args).await
    }

    #[must_use]
    pub fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    /// Run a named task
    pub fn task(&self, name: &str, arg: Value) -> CheckResult<Value> {
        self.tasks.run(name, arg)
    }
}

/// Runs scenarios one after another, each on its own session
pub struct Suite {
    name: String,
    run_id: Uuid,
    config: SuiteConfig,
    factory: SessionFactory,
    registry: Arc<CommandRegistry>,
    tasks: Arc<TaskRegistry>,
    clear_data: bool,
    results: Vec<ScenarioResult>,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("clear_data", &self.clear_data)
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

impl Suite {
    /// Suite with the default command and task registries
    pub fn new<F>(name: impl Into<String>, config: SuiteConfig, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn BrowserDriver> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run_id: Uuid::new_v4(),
            config,
            factory: Arc::new(factory),
            registry: Arc::new(CommandRegistry::with_defaults()),
            tasks: Arc::new(TaskRegistry::with_defaults()),
            clear_data: true,
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    #[must_use]
    pub fn with_tasks(mut self, tasks: TaskRegistry) -> Self {
        self.tasks = Arc::new(tasks);
        self
    }

    /// Skip clearing cookies and local storage before each scenario
    #[must_use]
    pub const fn keep_data(mut self) -> Self {
        self.clear_data = false;
        self
    }

    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run one scenario and record its outcome
    pub async fn run<F, Fut>(&mut self, name: &str, scenario: F) -> &ScenarioResult
    where
        F: FnOnce(Scenario) -> Fut,
        Fut: Future<Output = CheckResult<()>>,
    {
        let started = Instant::now();
        info!(suite = %self.name, run_id = %self.run_id, scenario = name, "scenario start");

        let session = BrowserSession::new((self.factory)(), self.config.clone());
        let outcome = match self.prepare(&session).await {
            Ok(ctx) => scenario(ctx).await,
            Err(e) => Err(e),
        };

        let (status, error, screenshot) = match outcome {
            Ok(()) => (ScenarioStatus::Passed, None, None),
            Err(e) => {
                error!(scenario = name, error = %e, "scenario failed");
                let shot = match session.capture_screenshot(&format!("failed-test-{}", file_stamp())).await {
                    Ok(path) => Some(path),
                    Err(shot_err) => {
                        warn!(error = %shot_err, "could not capture failure screenshot");
                        None
                    }
                };
                (ScenarioStatus::Failed, Some(e.to_string()), shot)
            }
        };
        if let Err(e) = session.driver().close().await {
            warn!(error = %e, "session close failed");
        }

        let duration = started.elapsed();
        info!(
            run_id = %self.run_id,
            scenario = name,
            %status,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "scenario end"
        );
        self.results.push(ScenarioResult {
            name: name.to_string(),
            status,
            duration,
            error,
            screenshot,
        });
        let last = self.results.len() - 1;
        &self.results[last]
    }

    async fn prepare(&self, session: &BrowserSession) -> CheckResult<Scenario> {
        if self.clear_data {
            session.clear_cookies().await?;
            session.clear_local_storage().await?;
        }
        session.set_viewport(self.config.viewport).await?;
        Ok(Scenario {
            session: session.clone(),
            commands: CommandContext::new(session.clone())?,
            registry: self.registry.clone(),
            fixtures: FixtureStore::new(self.config.fixtures_dir.clone()),
            tasks: self.tasks.clone(),
        })
    }

    /// Results so far
    #[must_use]
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    /// Close the suite and hand back its report
    #[must_use]
    pub fn finish(self) -> SuiteReport {
        let report = SuiteReport {
            suite_name: self.name,
            run_id: self.run_id,
            results: self.results,
        };
        info!(run_id = %report.run_id, summary = %report.summary(), "suite finished");
        report
    }
}

/// Log a named step with optional structured details
pub fn log_step(step: &str, details: Option<&Value>) {
    match details {
        Some(details) => info!(target: "storecheck::step", step, %details, "STEP"),
        None => info!(target: "storecheck::step", step, "STEP"),
    }
}

/// Elapsed time since `started`, checked against a budget picked from
/// the operation name
///
/// Names containing `page load` must finish under [`PAGE_LOAD_BUDGET`],
/// names containing `api call` under [`API_CALL_BUDGET`]. Other names are
/// only measured.
pub fn measure_performance(operation: &str, started: Instant) -> CheckResult<Duration> {
    let elapsed = started.elapsed();
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    info!(operation, elapsed_ms, "performance");
    let budget = if operation.contains("page load") {
        Some(PAGE_LOAD_BUDGET)
    } else if operation.contains("api call") {
        Some(API_CALL_BUDGET)
    } else {
        None
    };
    match budget {
        Some(limit) if elapsed >= limit => Err(CheckError::assertion(format!(
            "{operation} should be under {} ms, but took {elapsed_ms} ms",
            limit.as_millis()
        ))),
        _ => Ok(elapsed),
    }
}
