//! Card record and transaction vocabulary shared by every surface

use serde::{Deserialize, Serialize};

/// Card number the bank simulator always approves
pub const APPROVED_CARD_NUMBER: &str = "4444 4444 4444 4441";

/// Card number the bank simulator always declines
pub const DECLINED_CARD_NUMBER: &str = "4444 4444 4444 4442";

/// One synthetic card as typed into the form or posted to the API.
///
/// Nothing is validated here: empty fields, out-of-range months and foreign
/// characters are exactly what many scenarios need to carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRecord {
    pub number: String,
    pub month: String,
    pub year: String,
    pub holder: String,
    pub cvc: String,
}

impl CardRecord {
    pub fn new(
        number: impl Into<String>,
        month: impl Into<String>,
        year: impl Into<String>,
        holder: impl Into<String>,
        cvc: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            month: month.into(),
            year: year.into(),
            holder: holder.into(),
            cvc: cvc.into(),
        }
    }

    /// A record with every field empty
    pub fn blank() -> Self {
        Self::default()
    }

    /// Replace a single field, keeping the others
    pub fn with_field(mut self, field: CardField, value: impl Into<String>) -> Self {
        *self.field_mut(field) = value.into();
        self
    }

    pub fn field(&self, field: CardField) -> &str {
        match field {
            CardField::Number => &self.number,
            CardField::Month => &self.month,
            CardField::Year => &self.year,
            CardField::Holder => &self.holder,
            CardField::Cvc => &self.cvc,
        }
    }

    fn field_mut(&mut self, field: CardField) -> &mut String {
        match field {
            CardField::Number => &mut self.number,
            CardField::Month => &mut self.month,
            CardField::Year => &mut self.year,
            CardField::Holder => &mut self.holder,
            CardField::Cvc => &mut self.cvc,
        }
    }

    /// Card number with the grouping spaces removed
    pub fn compact_number(&self) -> String {
        self.number.chars().filter(|c| *c != ' ').collect()
    }
}

/// The five logical inputs of the card form, in on-screen order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardField {
    Number,
    Month,
    Year,
    Holder,
    Cvc,
}

impl CardField {
    pub const ALL: [CardField; 5] = [
        CardField::Number,
        CardField::Month,
        CardField::Year,
        CardField::Holder,
        CardField::Cvc,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Month => "month",
            Self::Year => "year",
            Self::Holder => "holder",
            Self::Cvc => "cvc",
        }
    }

    /// Position in [`CardField::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Self::Number => 0,
            Self::Month => 1,
            Self::Year => 2,
            Self::Holder => 3,
            Self::Cvc => 4,
        }
    }
}

impl std::fmt::Display for CardField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two purchase flows a card goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Payment,
    Credit,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Payment, TransactionKind::Credit];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Credit => "credit",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bank decision as stored by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Approved,
    Declined,
}

impl TransactionStatus {
    /// Decision the bank simulator makes for a well-formed number
    pub fn for_number(number: &str) -> Self {
        let compact: String = number.chars().filter(|c| *c != ' ').collect();
        let approved: String = APPROVED_CARD_NUMBER.chars().filter(|c| *c != ' ').collect();
        if compact == approved {
            Self::Approved
        } else {
            Self::Declined
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::Declined => write!(f, "DECLINED"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(Self::Approved),
            "DECLINED" => Ok(Self::Declined),
            _ => Err(format!("unknown transaction status: {}", s)),
        }
    }
}
