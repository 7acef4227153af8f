//! Expiry calendar: month/year pairs relative to an injected "today"
//!
//! Only month and year are modelled, so no day-of-month or leap-day logic is
//! involved. Every shift goes through a single month-index arithmetic so that
//! January/December and century rollovers cannot drift apart.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Years a card may be issued ahead of the current month
pub const MAX_VALIDITY_YEARS: i32 = 5;

/// A card expiry: calendar month and full year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthYear {
    // Field order gives chronological `Ord`.
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.month(), date.year())
    }

    /// Shift by a signed number of months with year rollover
    pub fn plus_months(self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn plus_years(self, years: i32) -> Self {
        Self {
            year: self.year + years,
            month: self.month,
        }
    }

    /// Month zero-padded to two digits
    pub fn month_str(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Year as the two digits printed on a card
    pub fn year_str(&self) -> String {
        format!("{:02}", self.year.rem_euclid(100))
    }
}

impl std::fmt::Display for MonthYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.month_str(), self.year_str())
    }
}

/// Boundary generator anchored to one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryCalendar {
    today: NaiveDate,
}

impl ExpiryCalendar {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Anchor to the local clock
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn anchor(&self) -> NaiveDate {
        self.today
    }

    pub fn current(&self) -> MonthYear {
        MonthYear::from_date(self.today)
    }

    pub fn current_month(&self) -> String {
        self.current().month_str()
    }

    pub fn current_year(&self) -> String {
        self.current().year_str()
    }

    pub fn one_month_before(&self) -> MonthYear {
        self.current().plus_months(-1)
    }

    pub fn one_month_after(&self) -> MonthYear {
        self.current().plus_months(1)
    }

    pub fn years_from_now(&self, years: i32) -> MonthYear {
        self.current().plus_years(years)
    }

    /// Last valid expiry: this month, five years ahead
    pub fn max_horizon(&self) -> MonthYear {
        self.years_from_now(MAX_VALIDITY_YEARS)
    }

    pub fn max_horizon_minus_one_month(&self) -> MonthYear {
        self.max_horizon().plus_months(-1)
    }

    /// First expiry past the horizon
    pub fn beyond_max_horizon(&self) -> MonthYear {
        self.max_horizon().plus_months(1)
    }

    /// Resolve a two-digit year to the full year closest to today.
    ///
    /// The window is [today - 50, today + 49], so "03" read in 2098 means 2103.
    pub fn resolve_year(&self, two_digit: u32) -> i32 {
        let this_year = self.today.year();
        let century = this_year.div_euclid(100) * 100;
        let candidate = century + (two_digit % 100) as i32;
        if candidate < this_year - 50 {
            candidate + 100
        } else if candidate > this_year + 49 {
            candidate - 100
        } else {
            candidate
        }
    }
}
