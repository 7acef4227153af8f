//! Playwright browser automation
//!
//! A [`PlaywrightSession`] runs one Node process that owns one browser page.
//! Commands go to the bridge as JSON lines on stdin and each gets exactly one
//! JSON line back on stdout, so page state survives between form actions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::{BrowserDriver, BrowserLauncher, Locator};
use crate::config::UiConfig;
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "webkit" => Ok(Self::Webkit),
            _ => Err(format!("unknown browser: {}", s)),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub node_binary: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Upper bound for a single click or fill
    pub action_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self::from(&UiConfig::default())
    }
}

impl From<&UiConfig> for PlaywrightConfig {
    fn from(ui: &UiConfig) -> Self {
        Self {
            node_binary: ui.node_binary.clone(),
            browser: ui.browser,
            headless: ui.headless,
            viewport_width: ui.viewport_width,
            viewport_height: ui.viewport_height,
            action_timeout_ms: ui.element_timeout_ms,
        }
    }
}

/// One command to the bridge
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeCommand {
    Goto { url: String },
    Click { selector: String, timeout_ms: u64 },
    Fill { selector: String, value: String, timeout_ms: u64 },
    Visible { selector: String },
    Text { selector: String },
    Close,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

struct Bridge {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl Bridge {
    async fn read_reply(&mut self) -> E2eResult<BridgeReply> {
        match self.stdout.next_line().await? {
            Some(line) => Ok(serde_json::from_str(&line)?),
            None => Err(E2eError::SessionClosed(
                "bridge process exited".to_string(),
            )),
        }
    }
}

/// Live browser page behind a Node/Playwright bridge
pub struct PlaywrightSession {
    bridge: Mutex<Bridge>,
    action_timeout_ms: u64,
    // Keeps the bridge script on disk for the lifetime of the process.
    _script_dir: TempDir,
}

impl PlaywrightSession {
    /// Start Node, launch the browser and wait for the ready handshake
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed().await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, Self::bridge_script(config))?;

        info!("Launching {} via Playwright bridge", config.browser.as_str());

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Playwright(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let mut bridge = Bridge {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
        };

        let ready = bridge.read_reply().await?;
        if !ready.ok || ready.id != 0 {
            return Err(E2eError::Playwright(format!(
                "browser failed to start: {}",
                ready.error.unwrap_or_else(|| "no ready handshake".to_string())
            )));
        }

        Ok(Self {
            bridge: Mutex::new(bridge),
            action_timeout_ms: config.action_timeout_ms,
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is installed
    async fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Node bridge for a configuration
    fn bridge_script(config: &PlaywrightConfig) -> String {
        BRIDGE_TEMPLATE
            .replace("__BROWSER__", config.browser.as_str())
            .replace("__HEADLESS__", if config.headless { "true" } else { "false" })
            .replace("__WIDTH__", &config.viewport_width.to_string())
            .replace("__HEIGHT__", &config.viewport_height.to_string())
    }

    async fn call(&self, command: BridgeCommand) -> E2eResult<serde_json::Value> {
        let mut bridge = self.bridge.lock().await;
        let id = bridge.next_id;
        bridge.next_id += 1;

        let mut line = serde_json::to_string(&Envelope { id, command: &command })?;
        line.push('\n');
        debug!("bridge <- {}", line.trim_end());

        bridge.stdin.write_all(line.as_bytes()).await?;
        bridge.stdin.flush().await?;

        let reply = bridge.read_reply().await?;
        if reply.id != id {
            return Err(E2eError::Playwright(format!(
                "reply out of order: expected id {}, got {}",
                id, reply.id
            )));
        }
        if reply.ok {
            Ok(reply.value)
        } else {
            Err(E2eError::Playwright(
                reply.error.unwrap_or_else(|| "unknown bridge error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Goto { url: url.to_string() }).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.call(BridgeCommand::Click {
            selector: locator.selector(),
            timeout_ms: self.action_timeout_ms,
        })
        .await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Fill {
            selector: locator.selector(),
            value: value.to_string(),
            timeout_ms: self.action_timeout_ms,
        })
        .await?;
        Ok(())
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let value = self
            .call(BridgeCommand::Visible { selector: locator.selector() })
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self
            .call(BridgeCommand::Text { selector: locator.selector() })
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn close(&self) -> E2eResult<()> {
        let result = self.call(BridgeCommand::Close).await;
        let mut bridge = self.bridge.lock().await;
        if let Err(e) = &result {
            warn!("Bridge did not close cleanly: {}", e);
            let _ = bridge.child.kill().await;
        }
        let _ = bridge.child.wait().await;
        result.map(|_| ())
    }
}

/// Launches a [`PlaywrightSession`] per scenario
pub struct PlaywrightLauncher {
    config: PlaywrightConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    async fn launch(&self) -> E2eResult<Box<dyn BrowserDriver>> {
        Ok(Box::new(PlaywrightSession::launch(&self.config).await?))
    }
}

const BRIDGE_TEMPLATE: &str = r#"
const { chromium, firefox, webkit } = require('playwright');
const readline = require('readline');

const reply = (message) => process.stdout.write(JSON.stringify(message) + '\n');

(async () => {
  const browser = await __BROWSER__.launch({ headless: __HEADLESS__ });
  const context = await browser.newContext({
    viewport: { width: __WIDTH__, height: __HEIGHT__ }
  });
  const page = await context.newPage();
  reply({ id: 0, ok: true, value: 'ready' });

  const input = readline.createInterface({ input: process.stdin });
  for await (const line of input) {
    const cmd = JSON.parse(line);
    try {
      let value = null;
      switch (cmd.op) {
        case 'goto':
          await page.goto(cmd.url);
          break;
        case 'click':
          await page.locator(cmd.selector).first().click({ timeout: cmd.timeout_ms });
          break;
        case 'fill':
          await page.locator(cmd.selector).first().fill(cmd.value, { timeout: cmd.timeout_ms });
          break;
        case 'visible':
          value = await page.locator(cmd.selector).first().isVisible();
          break;
        case 'text': {
          const target = page.locator(cmd.selector);
          value = (await target.count()) > 0 ? await target.first().textContent() : null;
          break;
        }
        case 'close':
          await browser.close();
          reply({ id: cmd.id, ok: true, value: null });
          process.exit(0);
        default:
          throw new Error('unknown op: ' + cmd.op);
      }
      reply({ id: cmd.id, ok: true, value });
    } catch (error) {
      reply({ id: cmd.id, ok: false, error: error.message });
    }
  }
  await browser.close();
})().catch((error) => {
  reply({ id: 0, ok: false, error: error.message });
  process.exit(1);
});
"#;
