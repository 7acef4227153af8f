//! Scenario runner: drives each scenario through the browser or the API and
//! collects the results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::api::ApiInvoker;
use crate::browser::{BrowserDriver, BrowserLauncher};
use crate::config::HarnessConfig;
use crate::dashboard::Dashboard;
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::persistence::PersistenceVerifier;
use crate::scenario::{Plan, Scenario, StorageCheck};
use crate::ui_text::UiText;
use crate::verify;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub struct ScenarioRunner {
    config: HarnessConfig,
    text: &'static UiText,
    launcher: Box<dyn BrowserLauncher>,
    api: ApiInvoker,
    /// Opened on the first API scenario so UI-only runs need no database
    storage: Option<PersistenceVerifier>,
}

impl ScenarioRunner {
    pub fn new(config: HarnessConfig, launcher: Box<dyn BrowserLauncher>) -> E2eResult<Self> {
        let api = ApiInvoker::new(&config)?;
        Ok(Self {
            text: UiText::for_locale(config.ui.locale),
            config,
            launcher,
            api,
            storage: None,
        })
    }

    /// Use an already-open storage connection
    pub fn with_storage(mut self, storage: PersistenceVerifier) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.config.run.output_dir
    }

    pub async fn run_all(&mut self, scenarios: &[Scenario]) -> E2eResult<TestSuiteResult> {
        self.run_scenarios(scenarios.iter()).await
    }

    /// Run scenarios carrying `tag`
    pub async fn run_tagged(
        &mut self,
        scenarios: &[Scenario],
        tag: &str,
    ) -> E2eResult<TestSuiteResult> {
        self.run_scenarios(scenarios.iter().filter(|s| s.has_tag(tag)))
            .await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&mut self, scenarios: &[Scenario], name: &str) -> E2eResult<TestResult> {
        let scenario = scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::Config(format!("Scenario not found: {}", name)))?;
        Ok(self.run_scenario(scenario).await)
    }

    pub async fn run_scenarios<'a, I>(&mut self, scenarios: I) -> E2eResult<TestSuiteResult>
    where
        I: IntoIterator<Item = &'a Scenario>,
    {
        let scenarios: Vec<&Scenario> = scenarios.into_iter().collect();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in &scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(TestSuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run one scenario; failures are recorded in the result, never returned
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> TestResult {
        let start = Instant::now();
        debug!("Running scenario: {} ({})", scenario.name, scenario.description);

        let outcome = if scenario.plan.uses_browser() {
            self.run_ui(scenario).await
        } else {
            self.run_api(scenario).await
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => TestResult {
                name: scenario.name.clone(),
                success: true,
                duration_ms,
                error: None,
                failure: None,
            },
            Err(e) => TestResult {
                name: scenario.name.clone(),
                success: false,
                duration_ms,
                failure: Some(e.kind()),
                error: Some(e.to_string()),
            },
        }
    }

    async fn run_ui(&self, scenario: &Scenario) -> E2eResult<()> {
        let driver = self.launcher.launch().await?;
        let result = self.drive_form(driver.as_ref(), scenario).await;
        let closed = driver.close().await;

        match (result, closed) {
            (Err(e), Err(close_err)) => {
                warn!("Failed to close browser after '{}': {}", scenario.name, close_err);
                Err(e)
            }
            (result, closed) => result.and(closed),
        }
    }

    async fn drive_form(&self, driver: &dyn BrowserDriver, scenario: &Scenario) -> E2eResult<()> {
        let timeouts = self.config.ui.timeouts();
        let dashboard = Dashboard::open(driver, &self.config.base_url, self.text, timeouts).await?;
        let mut form = dashboard.open_form(scenario.kind).await?;

        match &scenario.plan {
            Plan::FillForm { card } => {
                form.fill(card).await?;
            }
            Plan::SubmitBlank => {
                form.submit().await?;
            }
            Plan::BlankThenFill { card, blank } => {
                form.submit().await?;
                form.expect_outcome(blank).await?;
                form.fill(card).await?;
            }
            Plan::ApiCreate { .. } => {
                return Err(E2eError::Config(format!(
                    "scenario '{}' has no UI plan",
                    scenario.name
                )))
            }
        }
        form.expect_outcome(&scenario.expected).await
    }

    async fn run_api(&mut self, scenario: &Scenario) -> E2eResult<()> {
        let Plan::ApiCreate { card, check } = &scenario.plan else {
            return Err(E2eError::Config(format!(
                "scenario '{}' has no API plan",
                scenario.name
            )));
        };

        if self.storage.is_none() {
            self.storage = Some(PersistenceVerifier::open(&self.config.db).await?);
        }
        let storage = self
            .storage
            .as_mut()
            .ok_or_else(|| E2eError::Config("storage unavailable".to_string()))?;

        if self.config.run.reset_storage {
            storage.reset().await?;
        }

        let window = self.api.create(scenario.kind, card).await?;

        let row = storage.latest_transaction(scenario.kind).await?.ok_or_else(|| {
            E2eError::AssertionFailed(format!("no {} row stored after the call", scenario.kind))
        })?;

        match check {
            StorageCheck::Status => {
                let expected = scenario.expected.status().ok_or_else(|| {
                    E2eError::Config(format!(
                        "scenario '{}' expects {}, which stores nothing",
                        scenario.name, scenario.expected
                    ))
                })?;
                verify::expect_status(&row, expected)
            }
            StorageCheck::CreatedTimestamp => verify::expect_created_within(&row, &window),
            StorageCheck::OrderLink => {
                let order = storage.latest_order_link().await?.ok_or_else(|| {
                    E2eError::AssertionFailed("no order row stored after the call".to_string())
                })?;
                verify::expect_order_link(&order, &row)
            }
        }
    }

    /// Write results to `<output_dir>/test-results.json`
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.run.output_dir)?;

        let path = self.config.run.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
