//! Card form page model shared by the payment and credit flows
//!
//! Both forms have the same five inputs, submit control, banners and warning
//! slots. Everything that differs between them lives in [`FormProfile`].

use serde::{Deserialize, Serialize};
use tourpay_common::{CardField, CardRecord, Outcome, TransactionKind, Warning};
use tracing::{debug, info};

use crate::browser::{wait_hidden, wait_text, wait_visible, BrowserDriver, Locator};
use crate::config::Timeouts;
use crate::error::{E2eError, E2eResult};
use crate::ui_text::UiText;

/// Locators and texts of one form
#[derive(Debug, Clone)]
pub struct FormProfile {
    pub kind: TransactionKind,
    pub text: &'static UiText,
    pub heading: Locator,
    pub continue_button: Locator,
    pub approved_banner: Locator,
    pub declined_banner: Locator,
    inputs: [Locator; 5],
    warnings: [Locator; 5],
}

impl FormProfile {
    pub fn new(kind: TransactionKind, text: &'static UiText) -> Self {
        Self {
            kind,
            text,
            heading: Locator::heading(3, text.heading(kind)),
            continue_button: Locator::button(text.continue_button),
            approved_banner: Locator::banner(text.approved_banner),
            declined_banner: Locator::banner(text.declined_banner),
            inputs: CardField::ALL.map(|f| Locator::field_input(text.label(f))),
            warnings: CardField::ALL.map(|f| Locator::field_warning(text.label(f))),
        }
    }

    pub fn input(&self, field: CardField) -> &Locator {
        &self.inputs[field.index()]
    }

    pub fn warning(&self, field: CardField) -> &Locator {
        &self.warnings[field.index()]
    }

    /// Literal message this form shows for `warning`
    pub fn warning_text(&self, warning: Warning) -> &'static str {
        self.text.warning(warning, self.kind)
    }
}

/// Form state as last observed through an expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Unsubmitted,
    /// The bank answered
    SubmittedValid,
    /// At least one field failed local validation
    SubmittedInvalid,
}

/// An open payment or credit form
pub struct CardForm<'d> {
    driver: &'d dyn BrowserDriver,
    profile: FormProfile,
    timeouts: Timeouts,
    state: FormState,
    submissions: u32,
}

impl<'d> CardForm<'d> {
    /// Wait for the heading; returns only once the form is on screen
    pub async fn attach(
        driver: &'d dyn BrowserDriver,
        profile: FormProfile,
        timeouts: Timeouts,
    ) -> E2eResult<Self> {
        wait_visible(
            driver,
            &profile.heading,
            &format!("{} form heading", profile.kind),
            timeouts.element,
            timeouts.poll,
        )
        .await?;
        Ok(Self {
            driver,
            profile,
            timeouts,
            state: FormState::Unsubmitted,
            submissions: 0,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &FormProfile {
        &self.profile
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn submissions(&self) -> u32 {
        self.submissions
    }

    /// Type all five fields, then submit
    pub async fn fill(&mut self, card: &CardRecord) -> E2eResult<()> {
        debug!("Filling {} form: {:?}", self.profile.kind, card);
        for field in CardField::ALL {
            self.driver
                .fill(self.profile.input(field), card.field(field))
                .await?;
        }
        self.submit().await
    }

    /// Submit without touching the fields
    pub async fn submit(&mut self) -> E2eResult<()> {
        self.driver.click(&self.profile.continue_button).await?;
        self.submissions += 1;
        Ok(())
    }

    pub async fn expect_approved(&mut self) -> E2eResult<()> {
        let banner = self.profile.approved_banner.clone();
        self.expect_banner(&banner, "approved banner").await
    }

    pub async fn expect_declined(&mut self) -> E2eResult<()> {
        let banner = self.profile.declined_banner.clone();
        self.expect_banner(&banner, "declined banner").await
    }

    async fn expect_banner(&mut self, banner: &Locator, what: &str) -> E2eResult<()> {
        wait_visible(self.driver, banner, what, self.timeouts.outcome, self.timeouts.poll).await?;
        info!("{} form shows {}", self.profile.kind, what);
        self.state = FormState::SubmittedValid;
        Ok(())
    }

    /// The field's warning is visible and reads exactly `text`
    pub async fn expect_field_warning(&mut self, field: CardField, text: &str) -> E2eResult<()> {
        let locator = self.profile.warning(field);
        let what = format!("{} warning", field);
        wait_visible(self.driver, locator, &what, self.timeouts.element, self.timeouts.poll)
            .await
            .map_err(|e| match e {
                E2eError::Timeout { .. } => {
                    E2eError::AssertionFailed(format!("{} '{}' is not shown", what, text))
                }
                other => other,
            })?;
        wait_text(self.driver, locator, &what, text, self.timeouts.element, self.timeouts.poll)
            .await?;
        self.state = FormState::SubmittedInvalid;
        Ok(())
    }

    pub async fn expect_warning(&mut self, field: CardField, warning: Warning) -> E2eResult<()> {
        let text = self.profile.warning_text(warning);
        self.expect_field_warning(field, text).await
    }

    /// No field shows a warning
    pub async fn expect_no_warnings(&mut self) -> E2eResult<()> {
        for field in CardField::ALL {
            self.expect_field_clean(field).await?;
        }
        Ok(())
    }

    async fn expect_field_clean(&self, field: CardField) -> E2eResult<()> {
        let what = format!("{} warning", field);
        wait_hidden(
            self.driver,
            self.profile.warning(field),
            &what,
            self.timeouts.element,
            self.timeouts.poll,
        )
        .await
        .map_err(|e| match e {
            E2eError::Timeout { .. } => {
                E2eError::AssertionFailed(format!("{} is still shown", what))
            }
            other => other,
        })
    }

    /// Check the whole screen against a predicted outcome
    pub async fn expect_outcome(&mut self, outcome: &Outcome) -> E2eResult<()> {
        match outcome {
            Outcome::Approved => {
                self.expect_approved().await?;
                self.expect_no_warnings().await
            }
            Outcome::Declined => {
                self.expect_declined().await?;
                self.expect_no_warnings().await
            }
            Outcome::Rejected(warnings) => {
                for w in warnings {
                    self.expect_warning(w.field, w.warning).await?;
                }
                for field in CardField::ALL {
                    if !warnings.iter().any(|w| w.field == field) {
                        self.expect_field_clean(field).await?;
                    }
                }
                for (banner, what) in [
                    (&self.profile.approved_banner, "approved banner"),
                    (&self.profile.declined_banner, "declined banner"),
                ] {
                    if self.driver.is_visible(banner).await? {
                        return Err(E2eError::AssertionFailed(format!(
                            "{} shown although validation failed",
                            what
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}
