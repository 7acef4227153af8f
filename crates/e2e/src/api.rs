//! Direct calls to the transaction-creation endpoints, bypassing the UI

use chrono::{Local, NaiveDateTime};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tourpay_common::{CardRecord, TransactionKind};
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, HarnessConfig};
use crate::error::{E2eError, E2eResult};

/// Local wall-clock interval around one API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallWindow {
    pub started: NaiveDateTime,
    pub finished: NaiveDateTime,
}

pub struct ApiInvoker {
    client: reqwest::Client,
    base_url: String,
    config: ApiConfig,
}

impl ApiInvoker {
    pub fn new(config: &HarnessConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.api.clone(),
        })
    }

    pub async fn create_payment(&self, card: &CardRecord) -> E2eResult<CallWindow> {
        self.create(TransactionKind::Payment, card).await
    }

    pub async fn create_credit(&self, card: &CardRecord) -> E2eResult<CallWindow> {
        self.create(TransactionKind::Credit, card).await
    }

    /// POST the card; only the acceptance status is checked here
    pub async fn create(&self, kind: TransactionKind, card: &CardRecord) -> E2eResult<CallWindow> {
        let path = match kind {
            TransactionKind::Payment => &self.config.payment_path,
            TransactionKind::Credit => &self.config.credit_path,
        };
        let url = format!("{}{}", self.base_url, path);

        debug!("POST {} {}", url, serde_json::to_string(card)?);
        let started = Local::now().naive_local();
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(card)
            .send()
            .await?;
        let finished = Local::now().naive_local();

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => debug!("{} {} -> {} {}", kind, path, status, body),
            Err(e) => warn!("{} {} -> {}, body unreadable: {}", kind, path, status, e),
        }

        if status != self.config.expected_status {
            return Err(E2eError::UnexpectedStatus {
                path: path.clone(),
                expected: self.config.expected_status,
                actual: status,
            });
        }
        info!("Created {} via API ({})", kind, status);
        Ok(CallWindow { started, finished })
    }

    /// Poll the base URL until the system answers
    pub async fn wait_until_ready(&self, timeout: Duration) -> E2eResult<()> {
        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match self.client.get(&self.base_url).send().await {
                Ok(resp) if !resp.status().is_server_error() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Readiness probe returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for {} to start...", self.base_url);
                    }
                    // Connection refused is expected while the system is starting
                    if !e.is_connect() {
                        warn!("Readiness probe error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(200)).await;
        }

        Err(E2eError::NotReady(attempts))
    }
}
