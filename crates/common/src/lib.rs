//! Tourpay Common Library
//!
//! Pure building blocks of the verification harness: the card model, the
//! expiry calendar that generates boundary dates, the card factory, and the
//! outcome classifier that predicts what the system under test should do.

pub mod calendar;
pub mod card;
pub mod factory;
pub mod oracle;
pub mod random;

// Re-export commonly used types
pub use calendar::{ExpiryCalendar, MonthYear, MAX_VALIDITY_YEARS};
pub use card::{
    CardField, CardRecord, TransactionKind, TransactionStatus, APPROVED_CARD_NUMBER,
    DECLINED_CARD_NUMBER,
};
pub use factory::CardFactory;
pub use oracle::{classify, FieldWarning, Outcome, Warning};
pub use random::{Faker, RandomSource};
