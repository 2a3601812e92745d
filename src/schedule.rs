// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Due-date resolution for recurring rules.
//!
//! Everything here is a pure function of the rule snapshot and the as-of date,
//! so callers can recompute on every read instead of trusting the persisted
//! `next_due_date` hint.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::{Frequency, RecurringRule};
use crate::utils::days_in_month;

/// Next date on or after `as_of` at which `rule` falls due.
///
/// Custom rules return their one-shot date even when it already passed, so
/// callers building "upcoming" lists must still compare against `as_of`.
pub fn next_occurrence(rule: &RecurringRule, as_of: NaiveDate) -> Option<NaiveDate> {
    if let Some(end) = rule.end_date {
        if as_of > end {
            return None;
        }
    }

    let from = match rule.start_date {
        Some(start) if start > as_of => start,
        _ => as_of,
    };

    let candidate = match (
        rule.frequency,
        rule.day_of_month,
        rule.month_of_year,
        rule.day_of_week,
    ) {
        // Out-of-range fields are treated like missing ones.
        (Some(Frequency::Monthly), Some(day), _, _) if (1..=31).contains(&day) => {
            monthly(from, day)
        }
        (Some(Frequency::Weekly), _, _, Some(dow)) if dow <= 6 => weekly(from, dow),
        (Some(Frequency::Yearly), Some(day), Some(month), _)
            if (1..=31).contains(&day) && (1..=12).contains(&month) =>
        {
            yearly(from, month, day)
        }
        (Some(Frequency::Custom), ..) => rule.custom_date,
        _ => fallback(rule, as_of),
    }?;

    match rule.end_date {
        Some(end) if candidate > end => None,
        _ => Some(candidate),
    }
}

fn monthly(from: NaiveDate, day: u32) -> Option<NaiveDate> {
    let candidate = rolling_date(from.year(), from.month(), day)?;
    if candidate >= from {
        return Some(candidate);
    }
    let (year, month) = if from.month() == 12 {
        (from.year() + 1, 1)
    } else {
        (from.year(), from.month() + 1)
    };
    rolling_date(year, month, day)
}

fn weekly(from: NaiveDate, day_of_week: u32) -> Option<NaiveDate> {
    let today = from.weekday().num_days_from_sunday();
    let offset = (7 + day_of_week - today) % 7;
    let mut candidate = from.checked_add_days(Days::new(u64::from(offset)))?;
    if candidate < from {
        candidate = candidate.checked_add_days(Days::new(7))?;
    }
    Some(candidate)
}

fn yearly(from: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let candidate = clamped_date(from.year(), month, day)?;
    if candidate >= from {
        return Some(candidate);
    }
    clamped_date(from.year() + 1, month, day)
}

fn fallback(rule: &RecurringRule, as_of: NaiveDate) -> Option<NaiveDate> {
    let start = rule.start_date.unwrap_or(as_of);
    (start >= as_of).then_some(start)
}

/// `day` counted from the first of the month; overflow spills into the next
/// month (day 31 of April is 1 May).
fn rolling_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_days(Days::new(u64::from(day.checked_sub(1)?)))
}

/// `day` clamped to the last day of the month (29 February -> 28 February).
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if day == 0 {
        return None;
    }
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}
