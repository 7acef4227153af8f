//! Harness configuration
//!
//! Loaded from TOML, then overridden by `TOURPAY_*` environment variables and
//! finally by command-line flags. Every component receives the piece it needs
//! at construction; nothing is read from process-wide state afterwards.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;
use crate::ui_text::Locale;

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the system under test
    pub base_url: String,

    /// HTTP surface
    pub api: ApiConfig,

    /// Storage surface
    pub db: DbConfig,

    /// Browser surface
    pub ui: UiConfig,

    /// Scenario execution
    pub run: RunConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api: ApiConfig::default(),
            db: DbConfig::default(),
            ui: UiConfig::default(),
            run: RunConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub payment_path: String,
    pub credit_path: String,

    /// Status that means "accepted", whatever the bank decided
    pub expected_status: u16,

    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            payment_path: "/api/v1/pay".to_string(),
            credit_path: "/api/v1/credit".to_string(),
            expected_status: 200,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// SQLite file (optionally `sqlite://`), or a `postgresql://` / `mysql://`
    /// server URL. A leading `jdbc:` is accepted.
    pub url: String,

    /// Server login; replaces any user in the URL
    pub username: Option<String>,

    pub password: Option<String>,
}

/// SQL flavour of a database server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::MySql => write!(f, "mysql"),
        }
    }
}

/// Resolved location of the shop's database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    Sqlite(PathBuf),
    /// Connect URL with the configured credentials applied
    Server { dialect: Dialect, url: Url },
}

impl DbTarget {
    /// Printable form with the password masked
    pub fn redacted(&self) -> String {
        match self {
            DbTarget::Sqlite(path) => path.display().to_string(),
            DbTarget::Server { url, .. } => {
                let mut url = url.clone();
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.to_string()
            }
        }
    }
}

impl DbConfig {
    pub fn target(&self) -> E2eResult<DbTarget> {
        let raw = self.url.trim();
        if raw.is_empty() {
            return Err(E2eError::Config("db.url is not set".to_string()));
        }
        let (url, jdbc) = match raw.strip_prefix("jdbc:") {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        if let Some(path) = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            return Ok(self.sqlite(path));
        }
        if !jdbc && !url.contains("://") {
            return Ok(self.sqlite(url));
        }

        let scheme = url
            .split_once("://")
            .or_else(|| url.split_once(':'))
            .map_or(url, |(scheme, _)| scheme);
        let dialect = match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::MySql,
            _ => {
                return Err(E2eError::Config(format!(
                    "unsupported database url '{}': expected a SQLite file, postgresql:// or mysql://",
                    raw
                )))
            }
        };

        let mut parsed = Url::parse(url)
            .map_err(|e| E2eError::Config(format!("invalid database url '{}': {}", raw, e)))?;
        if let Some(user) = &self.username {
            parsed.set_username(user).map_err(|_| {
                E2eError::Config(format!("database url '{}' cannot carry a username", raw))
            })?;
        }
        if let Some(password) = &self.password {
            parsed.set_password(Some(password)).map_err(|_| {
                E2eError::Config(format!("database url '{}' cannot carry a password", raw))
            })?;
        }
        Ok(DbTarget::Server {
            dialect,
            url: parsed,
        })
    }

    fn sqlite(&self, path: &str) -> DbTarget {
        if self.username.is_some() || self.password.is_some() {
            debug!("SQLite does not authenticate; db.username/db.password are not used");
        }
        DbTarget::Sqlite(PathBuf::from(path))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Language the web application renders
    pub locale: Locale,

    pub browser: Browser,

    pub headless: bool,

    pub viewport_width: u32,

    pub viewport_height: u32,

    /// Wait for ordinary elements (headings, warnings)
    pub element_timeout_ms: u64,

    /// Wait for the bank's approved/declined banner
    pub outcome_timeout_ms: u64,

    /// Visibility polling interval
    pub poll_interval_ms: u64,

    /// Node executable running the Playwright bridge
    pub node_binary: PathBuf,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            element_timeout_ms: 4_000,
            outcome_timeout_ms: 10_000,
            poll_interval_ms: 100,
            node_binary: PathBuf::from("node"),
        }
    }
}

impl UiConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            element: Duration::from_millis(self.element_timeout_ms),
            outcome: Duration::from_millis(self.outcome_timeout_ms),
            poll: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Bounded waits used by the form and dashboard models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub element: Duration,
    pub outcome: Duration,
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        UiConfig::default().timeouts()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Delete all rows before each API scenario so "latest row" is ours
    pub reset_storage: bool,

    /// Directory for test-results.json
    pub output_dir: PathBuf,

    /// Seed for generated names and digits; entropy when unset
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reset_storage: true,
            output_dir: PathBuf::from("test-results"),
            seed: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file; a missing file yields defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `TOURPAY_*` overrides from the process environment
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TOURPAY_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("TOURPAY_DB_URL") {
            self.db.url = v;
        }
        if let Some(v) = lookup("TOURPAY_DB_USERNAME") {
            self.db.username = Some(v);
        }
        if let Some(v) = lookup("TOURPAY_DB_PASSWORD") {
            self.db.password = Some(v);
        }
        if let Some(v) = lookup("TOURPAY_LOCALE") {
            self.ui.locale = v.parse().map_err(E2eError::Config)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(E2eError::Config("base_url is empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(E2eError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.ui.element_timeout_ms == 0
            || self.ui.outcome_timeout_ms == 0
            || self.ui.poll_interval_ms == 0
        {
            return Err(E2eError::Config("UI timeouts must be positive".to_string()));
        }
        if !self.db.url.is_empty() {
            self.db.target()?;
        }
        Ok(())
    }

    /// Absolute URL for a path on the system under test
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
