//! Browser seam: locators, the driver trait and bounded waits
//!
//! Page models only talk to a [`BrowserDriver`]. Waiting is done here by
//! polling, so every driver gets the same timeout semantics: a wait that runs
//! out is a terminal [`E2eError::Timeout`], never a retry.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// How an element is found on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// `<h{level}>` with exactly this text
    pub fn heading(level: u8, text: &str) -> Self {
        Self::xpath(format!("//h{}[text()={}]", level, xpath_literal(text)))
    }

    /// Button caption span
    pub fn button(text: &str) -> Self {
        Self::xpath(format!("//span[text()={}]", xpath_literal(text)))
    }

    /// Notification body
    pub fn banner(text: &str) -> Self {
        Self::xpath(format!("//div[text()={}]", xpath_literal(text)))
    }

    /// Input following a field label
    pub fn field_input(label: &str) -> Self {
        Self::xpath(format!(
            "//span[text()={}]/following-sibling::span/input",
            xpath_literal(label)
        ))
    }

    /// Inline warning following a field label
    pub fn field_warning(label: &str) -> Self {
        Self::xpath(format!(
            "//span[text()={}]/following-sibling::span[@class='input__sub']",
            xpath_literal(label)
        ))
    }

    /// Selector string understood by Playwright
    pub fn selector(&self) -> String {
        match self {
            Self::XPath(expr) => format!("xpath={}", expr),
            Self::Css(sel) => format!("css={}", sel),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XPath(expr) => f.write_str(expr),
            Self::Css(sel) => f.write_str(sel),
        }
    }
}

/// XPath 1.0 has no escapes; texts with both quote kinds need `concat()`
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A live page the harness can drive.
///
/// Methods act immediately; none of them waits for an element to appear
/// beyond what the underlying engine does for a single action.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    /// Replace the input's value
    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    /// Text content of the first match, `None` when nothing matches
    async fn text(&self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Release the session
    async fn close(&self) -> E2eResult<()> {
        Ok(())
    }
}

/// Opens a fresh browser session per scenario
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> E2eResult<Box<dyn BrowserDriver>>;
}

/// Poll until `locator` is visible
pub async fn wait_visible(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    what: &str,
    timeout: Duration,
    poll: Duration,
) -> E2eResult<()> {
    wait_until(driver, locator, what, timeout, poll, true).await
}

/// Poll until `locator` is absent or hidden
pub async fn wait_hidden(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    what: &str,
    timeout: Duration,
    poll: Duration,
) -> E2eResult<()> {
    wait_until(driver, locator, what, timeout, poll, false).await
}

async fn wait_until(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    what: &str,
    timeout: Duration,
    poll: Duration,
    visible: bool,
) -> E2eResult<()> {
    let start = Instant::now();
    loop {
        if driver.is_visible(locator).await? == visible {
            debug!("{} {} after {:?}", what, if visible { "visible" } else { "hidden" }, start.elapsed());
            return Ok(());
        }
        if start.elapsed() >= timeout {
            let state = if visible { "visible" } else { "hidden" };
            return Err(E2eError::Timeout {
                what: format!("{} to be {} ({})", what, state, locator),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        sleep(poll).await;
    }
}

/// Poll until the element's text equals `expected`
pub async fn wait_text(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    what: &str,
    expected: &str,
    timeout: Duration,
    poll: Duration,
) -> E2eResult<()> {
    let start = Instant::now();
    loop {
        let actual = driver.text(locator).await?;
        if actual.as_deref().map(str::trim) == Some(expected) {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(E2eError::AssertionFailed(format!(
                "{}: expected text '{}', found {}",
                what,
                expected,
                actual
                    .map(|t| format!("'{}'", t.trim()))
                    .unwrap_or_else(|| "no element".to_string())
            )));
        }
        sleep(poll).await;
    }
}
