//! Calendar distance between two dates, as "X years, Y months, Z days".
//!
//! Chrono has no year/month/day difference. Whole months are counted by
//! stepping `from` forward with month arithmetic (which clamps to the end of
//! shorter months, so Jan 31 + 1 month is Feb 28/29); the remainder is days.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl Span {
    /// Distance from `from` to `to`. Reversed inputs are swapped.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };

        let mut total_months = ((to.year() - from.year()) * 12 + to.month() as i32
            - from.month() as i32)
            .max(0) as u32;
        let mut anchor = add_months(from, total_months);
        while anchor > to && total_months > 0 {
            total_months -= 1;
            anchor = add_months(from, total_months);
        }

        Self {
            years: total_months / 12,
            months: total_months % 12,
            days: (to - anchor).num_days().max(0) as u32,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} year{}, {} month{}, {} day{}",
            self.years,
            plural(self.years),
            self.months,
            plural(self.months),
            self.days,
            plural(self.days)
        )
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
