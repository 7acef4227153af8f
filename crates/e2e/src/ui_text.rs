//! Text rendered by the web application, per locale
//!
//! Elements are located by their visible text, so this catalogue is both the
//! locator source and the expected-message table. The Russian catalogue is the
//! one the deployed shop renders; the English one mirrors it word for word.

use serde::{Deserialize, Serialize};
use tourpay_common::{CardField, TransactionKind, Warning};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            _ => Err(format!("unknown locale: {}", s)),
        }
    }
}

#[derive(Debug)]
pub struct UiText {
    pub dashboard_heading: &'static str,
    pub payment_button: &'static str,
    pub credit_button: &'static str,
    pub payment_heading: &'static str,
    pub credit_heading: &'static str,
    pub continue_button: &'static str,
    pub approved_banner: &'static str,
    pub declined_banner: &'static str,
    /// Input labels in [`CardField::ALL`] order
    pub labels: [&'static str; 5],
    pub invalid_format: &'static str,
    pub invalid_validity_period: &'static str,
    pub expired: &'static str,
    pub required: &'static str,
    pub too_short: &'static str,
    pub too_long_payment: &'static str,
    pub too_long_credit: &'static str,
    pub forbidden_characters: &'static str,
}

static ENGLISH: UiText = UiText {
    dashboard_heading: "Journey of the day",
    payment_button: "Buy",
    credit_button: "Buy on credit",
    payment_heading: "Card payment",
    credit_heading: "Credit by card details",
    continue_button: "Continue",
    approved_banner: "Operation approved by the bank.",
    declined_banner: "Error! The bank declined the operation.",
    labels: ["Card number", "Month", "Year", "Holder", "CVC/CVV"],
    invalid_format: "Invalid format",
    invalid_validity_period: "Card validity period is incorrect",
    expired: "Card has expired",
    required: "This field is required",
    too_short: "Name must not be shorter than 2 characters",
    too_long_payment: "Name must not exceed 21 characters",
    too_long_credit: "Name/surname must not exceed 21 characters",
    forbidden_characters: "Only Latin letters, space and hyphen are allowed",
};

static RUSSIAN: UiText = UiText {
    dashboard_heading: "Путешествие дня",
    payment_button: "Купить",
    credit_button: "Купить в кредит",
    payment_heading: "Оплата по карте",
    credit_heading: "Кредит по данным карты",
    continue_button: "Продолжить",
    approved_banner: "Операция одобрена Банком.",
    declined_banner: "Ошибка! Банк отказал в проведении операции.",
    labels: ["Номер карты", "Месяц", "Год", "Владелец", "CVC/CVV"],
    invalid_format: "Неверный формат",
    invalid_validity_period: "Неверно указан срок действия карты",
    expired: "Истёк срок действия карты",
    required: "Поле обязательно для заполнения",
    too_short: "Имя не должно быть короче 2 символов",
    too_long_payment: "Имя не должно быть длинее 21 символа",
    too_long_credit: "Имя и фамилия не должны быть длиннее 21 символа",
    forbidden_characters: "Допускаются только латинские буквы, пробел и дефис",
};

impl UiText {
    pub fn for_locale(locale: Locale) -> &'static UiText {
        match locale {
            Locale::En => &ENGLISH,
            Locale::Ru => &RUSSIAN,
        }
    }

    pub fn label(&self, field: CardField) -> &'static str {
        self.labels[field.index()]
    }

    pub fn heading(&self, kind: TransactionKind) -> &'static str {
        match kind {
            TransactionKind::Payment => self.payment_heading,
            TransactionKind::Credit => self.credit_heading,
        }
    }

    pub fn open_button(&self, kind: TransactionKind) -> &'static str {
        match kind {
            TransactionKind::Payment => self.payment_button,
            TransactionKind::Credit => self.credit_button,
        }
    }

    /// Literal warning text as the given form renders it
    pub fn warning(&self, warning: Warning, kind: TransactionKind) -> &'static str {
        match warning {
            Warning::InvalidFormat => self.invalid_format,
            Warning::InvalidValidityPeriod => self.invalid_validity_period,
            Warning::Expired => self.expired,
            Warning::Required => self.required,
            Warning::TooShort => self.too_short,
            Warning::TooLong => match kind {
                TransactionKind::Payment => self.too_long_payment,
                TransactionKind::Credit => self.too_long_credit,
            },
            Warning::ForbiddenCharacters => self.forbidden_characters,
        }
    }
}
