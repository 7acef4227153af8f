//! Scenario catalogue
//!
//! Every scenario runs once per transaction kind. Cards are generated up
//! front so a run can be listed, filtered and reproduced from a seed.

use serde::Serialize;
use tourpay_common::{
    CardFactory, CardField, CardRecord, FieldWarning, Outcome, RandomSource, TransactionKind,
    Warning,
};

/// What is checked in storage after an API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCheck {
    Status,
    CreatedTimestamp,
    OrderLink,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum Plan {
    /// Fill all fields through the UI and submit
    FillForm { card: CardRecord },
    /// Submit without typing anything
    SubmitBlank,
    /// Submit blank, see `blank` on screen, then fill and submit `card`
    BlankThenFill { card: CardRecord, blank: Outcome },
    /// Create through the API, then read storage
    ApiCreate { card: CardRecord, check: StorageCheck },
}

impl Plan {
    /// Card the final submission uses
    pub fn card(&self) -> CardRecord {
        match self {
            Plan::FillForm { card }
            | Plan::BlankThenFill { card, .. }
            | Plan::ApiCreate { card, .. } => card.clone(),
            Plan::SubmitBlank => CardRecord::blank(),
        }
    }

    pub fn uses_browser(&self) -> bool {
        !matches!(self, Plan::ApiCreate { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub tags: Vec<&'static str>,
    pub kind: TransactionKind,
    pub plan: Plan,
    pub expected: Outcome,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }
}

/// Build the full catalogue for both forms
pub fn catalogue<R: RandomSource>(factory: &mut CardFactory<R>) -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    for kind in TransactionKind::ALL {
        ui_scenarios(factory, kind, &mut scenarios);
    }
    for kind in TransactionKind::ALL {
        api_scenarios(factory, kind, &mut scenarios);
    }
    scenarios
}

struct Builder<'a> {
    kind: TransactionKind,
    out: &'a mut Vec<Scenario>,
}

impl Builder<'_> {
    fn push(
        &mut self,
        slug: &str,
        description: &str,
        tags: &[&'static str],
        plan: Plan,
        expected: Outcome,
    ) {
        let surface = if plan.uses_browser() { "ui" } else { "api" };
        let mut all_tags = vec![surface, self.kind.as_str()];
        all_tags.extend_from_slice(tags);
        self.out.push(Scenario {
            name: format!("{}-{}", self.kind, slug),
            description: format!("{}: {}", self.kind, description),
            tags: all_tags,
            kind: self.kind,
            plan,
            expected,
        });
    }

    fn form(
        &mut self,
        slug: &str,
        description: &str,
        tags: &[&'static str],
        card: CardRecord,
        expected: Outcome,
    ) {
        self.push(slug, description, tags, Plan::FillForm { card }, expected);
    }
}

fn ui_scenarios<R: RandomSource>(
    factory: &mut CardFactory<R>,
    kind: TransactionKind,
    out: &mut Vec<Scenario>,
) {
    let mut b = Builder { kind, out };
    let current = factory.calendar().current();
    let next_year = factory.valid_expiry().year_str();
    let rejected = Outcome::rejected;

    b.form("approved", "approved card is accepted by the bank", &[], factory.approved(), Outcome::Approved);
    b.form("declined", "declined card is refused by the bank", &[], factory.declined(), Outcome::Declined);
    b.form(
        "single-digit-month",
        "month without a leading zero is accepted",
        &["boundary"],
        factory.with_month_year("5", &next_year),
        Outcome::Approved,
    );
    b.form(
        "max-date",
        "expiry five years ahead is accepted",
        &["boundary"],
        factory.max_horizon(),
        Outcome::Approved,
    );
    b.form(
        "max-date-minus-month",
        "expiry one month before the horizon is accepted",
        &["boundary"],
        factory.max_horizon_minus_one_month(),
        Outcome::Approved,
    );
    b.form(
        "min-date",
        "card expiring this month is accepted",
        &["boundary"],
        factory.with_month_year(&current.month_str(), &current.year_str()),
        Outcome::Approved,
    );
    b.form(
        "next-month",
        "card expiring next month is accepted",
        &["boundary"],
        factory.next_month(),
        Outcome::Approved,
    );
    b.form(
        "holder-max-length",
        "21-letter holder is accepted",
        &["holder", "boundary"],
        factory.with_holder_name_of_length(21),
        Outcome::Approved,
    );
    b.form(
        "holder-min-length",
        "2-letter holder is accepted",
        &["holder", "boundary"],
        factory.with_holder_name_of_length(2),
        Outcome::Approved,
    );
    b.form(
        "unknown-number",
        "number unknown to the bank is declined",
        &[],
        factory.unknown_number(),
        Outcome::Declined,
    );

    for (field, warning) in [
        (CardField::Number, Warning::InvalidFormat),
        (CardField::Month, Warning::InvalidFormat),
        (CardField::Year, Warning::InvalidFormat),
        (CardField::Holder, Warning::Required),
        (CardField::Cvc, Warning::InvalidFormat),
    ] {
        b.form(
            &format!("empty-{}", field),
            &format!("empty {} field shows a warning", field),
            &["validation"],
            factory.approved().with_field(field, ""),
            rejected(field, warning),
        );
    }

    let blank_warnings = Outcome::Rejected(vec![
        FieldWarning::new(CardField::Number, Warning::InvalidFormat),
        FieldWarning::new(CardField::Month, Warning::InvalidFormat),
        FieldWarning::new(CardField::Year, Warning::InvalidFormat),
        FieldWarning::new(CardField::Holder, Warning::Required),
        FieldWarning::new(CardField::Cvc, Warning::InvalidFormat),
    ]);
    b.push(
        "all-empty",
        "submitting an untouched form warns under every field",
        &["validation"],
        Plan::SubmitBlank,
        blank_warnings.clone(),
    );
    b.push(
        "warnings-cleared",
        "warnings disappear once the form is filled correctly",
        &["validation"],
        Plan::BlankThenFill {
            card: factory.approved(),
            blank: blank_warnings,
        },
        Outcome::Approved,
    );

    let last_year = factory.calendar().years_from_now(-1);
    b.form(
        "expired-by-year",
        "card that expired last year is rejected",
        &["boundary", "validation"],
        factory.with_month_year(&current.month_str(), &last_year.year_str()),
        rejected(CardField::Year, Warning::Expired),
    );

    // In January last month belongs to last year
    let expired_by_month = if factory.calendar().one_month_before().year < current.year {
        rejected(CardField::Year, Warning::Expired)
    } else {
        rejected(CardField::Month, Warning::InvalidValidityPeriod)
    };
    b.form(
        "expired-by-month",
        "card that expired last month is rejected",
        &["boundary", "validation"],
        factory.expired_by_one_month(),
        expired_by_month,
    );
    b.form(
        "month-00",
        "month 00 is rejected",
        &["boundary", "validation"],
        factory.with_month_year("00", &next_year),
        rejected(CardField::Month, Warning::InvalidValidityPeriod),
    );
    b.form(
        "month-13",
        "month 13 is rejected",
        &["boundary", "validation"],
        factory.with_month_year("13", &current.year_str()),
        rejected(CardField::Month, Warning::InvalidValidityPeriod),
    );
    b.form(
        "beyond-max-date",
        "expiry one month past the horizon is rejected",
        &["boundary", "validation"],
        factory.beyond_max_horizon(),
        rejected(CardField::Month, Warning::InvalidValidityPeriod),
    );
    b.form(
        "holder-too-long",
        "22-letter holder is rejected",
        &["holder", "boundary", "validation"],
        factory.with_holder_name_of_length(22),
        rejected(CardField::Holder, Warning::TooLong),
    );
    b.form(
        "holder-too-short",
        "1-letter holder is rejected",
        &["holder", "boundary", "validation"],
        factory.with_holder_name_of_length(1),
        rejected(CardField::Holder, Warning::TooShort),
    );
    for (slug, description, holder) in [
        ("holder-cyrillic", "Cyrillic holder is rejected", "Иванов Иван"),
        ("holder-digits", "holder with digits is rejected", "123 Иван"),
        ("holder-punctuation", "holder with punctuation is rejected", "!№;%:?"),
    ] {
        b.form(
            slug,
            description,
            &["holder", "validation"],
            factory.with_holder_name(holder),
            rejected(CardField::Holder, Warning::ForbiddenCharacters),
        );
    }
}

fn api_scenarios<R: RandomSource>(
    factory: &mut CardFactory<R>,
    kind: TransactionKind,
    out: &mut Vec<Scenario>,
) {
    let mut b = Builder { kind, out };

    let cases = [
        ("approved-status", "approved card is stored as APPROVED", StorageCheck::Status, true),
        ("declined-status", "declined card is stored as DECLINED", StorageCheck::Status, false),
        (
            "approved-created",
            "approved row is created within the call minute",
            StorageCheck::CreatedTimestamp,
            true,
        ),
        (
            "declined-created",
            "declined row is created within the call minute",
            StorageCheck::CreatedTimestamp,
            false,
        ),
        ("order-link", "order row references the transaction", StorageCheck::OrderLink, true),
    ];
    for (slug, description, check, approved) in cases {
        let (card, expected) = if approved {
            (factory.approved(), Outcome::Approved)
        } else {
            (factory.declined(), Outcome::Declined)
        };
        b.push(
            &format!("api-{}", slug),
            description,
            &["storage"],
            Plan::ApiCreate { card, check },
            expected,
        );
    }
}
