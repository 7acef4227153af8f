//! Checks joining what the API was asked to do with what storage recorded

use chrono::{Duration, NaiveDateTime, Timelike};
use tourpay_common::TransactionStatus;

use crate::api::CallWindow;
use crate::error::{E2eError, E2eResult};
use crate::persistence::{OrderLinkRecord, TransactionRow};

pub fn expect_status(row: &TransactionRow, expected: TransactionStatus) -> E2eResult<()> {
    if row.status() == expected {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "latest {} row has status {}, expected {}",
            row.kind(),
            row.status(),
            expected
        )))
    }
}

/// `created` lies within the minute(s) spanned by the call
pub fn expect_created_within(row: &TransactionRow, window: &CallWindow) -> E2eResult<()> {
    let from = truncate_to_minute(window.started);
    let until = truncate_to_minute(window.finished) + Duration::minutes(1);
    let created = row.created();

    if created >= from && created < until {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "latest {} row created at {}, outside {} .. {}",
            row.kind(),
            created.format("%Y-%m-%d %H:%M:%S"),
            from.format("%Y-%m-%d %H:%M"),
            until.format("%Y-%m-%d %H:%M")
        )))
    }
}

/// The order row references `row` and nothing else
pub fn expect_order_link(order: &OrderLinkRecord, row: &TransactionRow) -> E2eResult<()> {
    let (linked, other, column) = match row {
        TransactionRow::Payment(_) => (&order.payment_id, &order.credit_id, "payment_id"),
        TransactionRow::Credit(_) => (&order.credit_id, &order.payment_id, "credit_id"),
    };

    let Some(expected) = row.reference() else {
        return Err(E2eError::AssertionFailed(format!(
            "latest {} row has no reference identifier",
            row.kind()
        )));
    };
    if linked.as_deref() != Some(expected) {
        return Err(E2eError::AssertionFailed(format!(
            "order {} has {} {:?}, expected '{}'",
            order.id, column, linked, expected
        )));
    }
    if let Some(stray) = other {
        return Err(E2eError::AssertionFailed(format!(
            "order {} for a {} also references '{}'",
            order.id,
            row.kind(),
            stray
        )));
    }
    Ok(())
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}
