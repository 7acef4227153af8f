//! Tourpay E2E Verification Harness
//!
//! This crate verifies the tour purchase card flow end to end:
//! - Drives the payment and credit forms through Playwright
//! - Posts cards straight to the API
//! - Reads the resulting rows back from the shop's database
//! - Checks every observation against the predicted [`tourpay_common::Outcome`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ScenarioRunner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  catalogue(factory) -> [Scenario]                           │
//! │    ├── FillForm / SubmitBlank / BlankThenFill               │
//! │    │     Dashboard -> CardForm(FormProfile)                 │
//! │    │       └── BrowserDriver (Playwright bridge)            │
//! │    └── ApiCreate { check }                                  │
//! │          ApiInvoker -> PersistenceVerifier -> verify::*     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HarnessConfig: TOML + TOURPAY_* env + CLI flags            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod browser;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod persistence;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod ui_text;
pub mod verify;

pub use api::{ApiInvoker, CallWindow};
pub use browser::{BrowserDriver, BrowserLauncher, Locator};
pub use config::{HarnessConfig, Timeouts};
pub use dashboard::Dashboard;
pub use error::{E2eError, E2eResult, FailureKind, StorageError};
pub use form::{CardForm, FormProfile, FormState};
pub use persistence::{PersistenceVerifier, TransactionRow};
pub use runner::{ScenarioRunner, TestResult, TestSuiteResult};
pub use scenario::{catalogue, Plan, Scenario, StorageCheck};
pub use ui_text::{Locale, UiText};
