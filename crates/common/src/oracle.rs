//! Expected outcome of submitting a card
//!
//! This is a second, independent implementation of the form's validation
//! rules and of the bank simulator's decision. Every scenario's declared
//! expectation is checked against it, so an off-by-one in the calendar shows
//! up here instead of as a false failure against the live system.

use serde::{Deserialize, Serialize};

use crate::calendar::{ExpiryCalendar, MonthYear};
use crate::card::{CardField, CardRecord, TransactionStatus};

pub const HOLDER_MIN_LEN: usize = 2;
pub const HOLDER_MAX_LEN: usize = 21;

/// Inline validation message kinds. The rendered text depends on locale and,
/// for [`Warning::TooLong`], on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    InvalidFormat,
    InvalidValidityPeriod,
    Expired,
    Required,
    TooShort,
    TooLong,
    ForbiddenCharacters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldWarning {
    pub field: CardField,
    pub warning: Warning,
}

impl FieldWarning {
    pub const fn new(field: CardField, warning: Warning) -> Self {
        Self { field, warning }
    }
}

/// What a submission ends in. Exactly one per scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "warnings", rename_all = "snake_case")]
pub enum Outcome {
    Approved,
    Declined,
    /// Local validation failed; warnings are in field order
    Rejected(Vec<FieldWarning>),
}

impl Outcome {
    pub fn rejected(field: CardField, warning: Warning) -> Self {
        Self::Rejected(vec![FieldWarning::new(field, warning)])
    }

    /// Stored status, if the submission reaches the bank
    pub fn status(&self) -> Option<TransactionStatus> {
        match self {
            Self::Approved => Some(TransactionStatus::Approved),
            Self::Declined => Some(TransactionStatus::Declined),
            Self::Rejected(_) => None,
        }
    }

    pub fn warnings(&self) -> &[FieldWarning] {
        match self {
            Self::Rejected(warnings) => warnings,
            _ => &[],
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Declined => write!(f, "declined"),
            Self::Rejected(warnings) => {
                write!(f, "rejected [")?;
                for (i, w) in warnings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", w.field, w.warning)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Predict the outcome of submitting `card` on the calendar's day
pub fn classify(card: &CardRecord, calendar: &ExpiryCalendar) -> Outcome {
    let mut warnings = Vec::new();

    if !is_card_number(&card.number) {
        warnings.push(FieldWarning::new(CardField::Number, Warning::InvalidFormat));
    }

    let month = parse_month(&card.month);
    let year = parse_year(&card.year).map(|yy| calendar.resolve_year(yy));

    match month {
        None => warnings.push(FieldWarning::new(CardField::Month, Warning::InvalidFormat)),
        Some(m) if !(1..=12).contains(&m) => {
            warnings.push(FieldWarning::new(CardField::Month, Warning::InvalidValidityPeriod))
        }
        Some(m) => {
            if let Some(y) = year {
                let expiry = MonthYear::new(m, y);
                let current = calendar.current();
                let same_or_later_year = y >= current.year;
                if same_or_later_year
                    && (expiry < current || expiry > calendar.max_horizon())
                {
                    warnings.push(FieldWarning::new(
                        CardField::Month,
                        Warning::InvalidValidityPeriod,
                    ));
                }
            }
        }
    }

    match year {
        None => warnings.push(FieldWarning::new(CardField::Year, Warning::InvalidFormat)),
        Some(y) if y < calendar.current().year => {
            warnings.push(FieldWarning::new(CardField::Year, Warning::Expired))
        }
        Some(_) => {}
    }

    if let Some(warning) = holder_warning(&card.holder) {
        warnings.push(FieldWarning::new(CardField::Holder, warning));
    }

    if !(card.cvc.len() == 3 && card.cvc.chars().all(|c| c.is_ascii_digit())) {
        warnings.push(FieldWarning::new(CardField::Cvc, Warning::InvalidFormat));
    }

    if warnings.is_empty() {
        match TransactionStatus::for_number(&card.number) {
            TransactionStatus::Approved => Outcome::Approved,
            TransactionStatus::Declined => Outcome::Declined,
        }
    } else {
        warnings.sort_by_key(|w| w.field);
        Outcome::Rejected(warnings)
    }
}

/// Holder rule; the charset check wins over the length checks
pub fn holder_warning(holder: &str) -> Option<Warning> {
    if holder.is_empty() {
        return Some(Warning::Required);
    }
    if !holder
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-')
    {
        return Some(Warning::ForbiddenCharacters);
    }
    let len = holder.chars().count();
    if len < HOLDER_MIN_LEN {
        Some(Warning::TooShort)
    } else if len > HOLDER_MAX_LEN {
        Some(Warning::TooLong)
    } else {
        None
    }
}

fn is_card_number(number: &str) -> bool {
    number.chars().all(|c| c.is_ascii_digit() || c == ' ')
        && number.chars().filter(char::is_ascii_digit).count() == 16
}

/// One or two digits; single-digit months carry no leading zero
fn parse_month(month: &str) -> Option<u32> {
    if (1..=2).contains(&month.len()) && month.chars().all(|c| c.is_ascii_digit()) {
        month.parse().ok()
    } else {
        None
    }
}

fn parse_year(year: &str) -> Option<u32> {
    if year.len() == 2 && year.chars().all(|c| c.is_ascii_digit()) {
        year.parse().ok()
    } else {
        None
    }
}
