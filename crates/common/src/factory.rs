//! Named card scenarios

use tracing::debug;

use crate::calendar::{ExpiryCalendar, MonthYear};
use crate::card::{CardField, CardRecord, APPROVED_CARD_NUMBER, DECLINED_CARD_NUMBER};
use crate::random::{Faker, RandomSource};

/// Builds [`CardRecord`]s for the catalogue of scenarios.
///
/// Cards that are meant to be valid expire one year after the current
/// month; boundary cards take their dates from the [`ExpiryCalendar`].
pub struct CardFactory<R = Faker> {
    calendar: ExpiryCalendar,
    random: R,
}

impl CardFactory<Faker> {
    /// Factory anchored to the local clock with an entropy-seeded faker
    pub fn today() -> Self {
        Self::new(ExpiryCalendar::today(), Faker::new())
    }
}

impl<R: RandomSource> CardFactory<R> {
    pub fn new(calendar: ExpiryCalendar, random: R) -> Self {
        Self { calendar, random }
    }

    pub fn calendar(&self) -> &ExpiryCalendar {
        &self.calendar
    }

    /// Expiry used by cards that should pass date validation
    pub fn valid_expiry(&self) -> MonthYear {
        self.calendar.years_from_now(1)
    }

    pub fn approved(&mut self) -> CardRecord {
        self.card_expiring(APPROVED_CARD_NUMBER.to_string(), self.valid_expiry())
    }

    pub fn declined(&mut self) -> CardRecord {
        self.card_expiring(DECLINED_CARD_NUMBER.to_string(), self.valid_expiry())
    }

    /// Well-formed number the bank does not know
    pub fn unknown_number(&mut self) -> CardRecord {
        let approved: String = APPROVED_CARD_NUMBER.split(' ').collect();
        let declined: String = DECLINED_CARD_NUMBER.split(' ').collect();
        let number = loop {
            let candidate = self.random.digits(16);
            if candidate != approved && candidate != declined {
                break candidate;
            }
        };
        self.card_expiring(number, self.valid_expiry())
    }

    /// Approved number with a literal month and year
    pub fn with_month_year(&mut self, month: &str, year: &str) -> CardRecord {
        let holder = self.random.full_name();
        let cvc = self.random.digits(3);
        CardRecord::new(APPROVED_CARD_NUMBER, month, year, holder, cvc)
    }

    pub fn with_expiry(&mut self, expiry: MonthYear) -> CardRecord {
        self.card_expiring(APPROVED_CARD_NUMBER.to_string(), expiry)
    }

    /// Approved number with a holder of exactly `len` Latin letters
    pub fn with_holder_name_of_length(&mut self, len: usize) -> CardRecord {
        let holder = self.random.latin_letters(len);
        self.approved().with_field(CardField::Holder, holder)
    }

    /// Approved number with a literal holder
    pub fn with_holder_name(&mut self, name: &str) -> CardRecord {
        self.approved().with_field(CardField::Holder, name)
    }

    pub fn expired_by_one_month(&mut self) -> CardRecord {
        let expiry = self.calendar.one_month_before();
        self.with_expiry(expiry)
    }

    pub fn expired_by_one_year(&mut self) -> CardRecord {
        let expiry = self.calendar.years_from_now(-1);
        self.with_expiry(expiry)
    }

    pub fn next_month(&mut self) -> CardRecord {
        let expiry = self.calendar.one_month_after();
        self.with_expiry(expiry)
    }

    pub fn max_horizon(&mut self) -> CardRecord {
        let expiry = self.calendar.max_horizon();
        self.with_expiry(expiry)
    }

    pub fn max_horizon_minus_one_month(&mut self) -> CardRecord {
        let expiry = self.calendar.max_horizon_minus_one_month();
        self.with_expiry(expiry)
    }

    pub fn beyond_max_horizon(&mut self) -> CardRecord {
        let expiry = self.calendar.beyond_max_horizon();
        self.with_expiry(expiry)
    }

    fn card_expiring(&mut self, number: String, expiry: MonthYear) -> CardRecord {
        let holder = self.random.full_name();
        let cvc = self.random.digits(3);
        debug!("Generated card {} expiring {}", number, expiry);
        CardRecord::new(number, expiry.month_str(), expiry.year_str(), holder, cvc)
    }
}
