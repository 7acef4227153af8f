//! Landing page: entry point to both card forms

use tourpay_common::TransactionKind;
use tracing::info;

use crate::browser::{wait_visible, BrowserDriver, Locator};
use crate::config::Timeouts;
use crate::error::E2eResult;
use crate::form::{CardForm, FormProfile};
use crate::ui_text::UiText;

pub struct Dashboard<'d> {
    driver: &'d dyn BrowserDriver,
    text: &'static UiText,
    timeouts: Timeouts,
}

impl<'d> Dashboard<'d> {
    /// Navigate to the landing page and wait for its heading
    pub async fn open(
        driver: &'d dyn BrowserDriver,
        base_url: &str,
        text: &'static UiText,
        timeouts: Timeouts,
    ) -> E2eResult<Self> {
        info!("Opening dashboard at {}", base_url);
        driver.goto(base_url).await?;
        wait_visible(
            driver,
            &Locator::heading(2, text.dashboard_heading),
            "dashboard heading",
            timeouts.element,
            timeouts.poll,
        )
        .await?;
        Ok(Self {
            driver,
            text,
            timeouts,
        })
    }

    pub async fn open_payment(&self) -> E2eResult<CardForm<'d>> {
        self.open_form(TransactionKind::Payment).await
    }

    pub async fn open_credit(&self) -> E2eResult<CardForm<'d>> {
        self.open_form(TransactionKind::Credit).await
    }

    /// Click through to a form; returns once its heading is visible
    pub async fn open_form(&self, kind: TransactionKind) -> E2eResult<CardForm<'d>> {
        self.driver
            .click(&Locator::button(self.text.open_button(kind)))
            .await?;
        CardForm::attach(self.driver, FormProfile::new(kind, self.text), self.timeouts).await
    }
}
