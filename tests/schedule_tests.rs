// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Days, NaiveDate};
use duebook::models::{Frequency, RecurringRule};
use duebook::schedule::next_occurrence;
use rust_decimal::Decimal;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn rule(frequency: Option<Frequency>) -> RecurringRule {
    RecurringRule {
        id: 1,
        user_id: "alice".into(),
        name: "Bill".into(),
        frequency,
        day_of_month: None,
        month_of_year: None,
        day_of_week: None,
        custom_date: None,
        start_date: None,
        end_date: None,
        active: true,
        total_amount: None,
        installment_amount: Decimal::new(1000, 0),
        tab_type: None,
        payment_method: None,
        account_id: None,
        credit_card_id: None,
        next_due_date: None,
    }
}

fn monthly(day: u32) -> RecurringRule {
    RecurringRule {
        day_of_month: Some(day),
        ..rule(Some(Frequency::Monthly))
    }
}

fn weekly(dow: u32) -> RecurringRule {
    RecurringRule {
        day_of_week: Some(dow),
        ..rule(Some(Frequency::Weekly))
    }
}

fn yearly(month: u32, day: u32) -> RecurringRule {
    RecurringRule {
        month_of_year: Some(month),
        day_of_month: Some(day),
        ..rule(Some(Frequency::Yearly))
    }
}

#[test]
fn monthly_already_passed_moves_to_next_month() {
    assert_eq!(
        next_occurrence(&monthly(15), d("2024-03-20")),
        Some(d("2024-04-15"))
    );
}

#[test]
fn monthly_due_today_counts() {
    assert_eq!(
        next_occurrence(&monthly(20), d("2024-03-20")),
        Some(d("2024-03-20"))
    );
}

#[test]
fn monthly_wraps_december_into_next_year() {
    assert_eq!(
        next_occurrence(&monthly(5), d("2024-12-20")),
        Some(d("2025-01-05"))
    );
}

#[test]
fn monthly_day_past_month_end_rolls_over() {
    // April has 30 days: day 31 spills into 1 May.
    assert_eq!(
        next_occurrence(&monthly(31), d("2024-04-10")),
        Some(d("2024-05-01"))
    );
    // 30 February in a leap year lands on 1 March.
    assert_eq!(
        next_occurrence(&monthly(30), d("2024-01-31")),
        Some(d("2024-03-01"))
    );
}

#[test]
fn monthly_never_before_as_of() {
    let start = d("2023-12-01");
    for offset in 0..400u64 {
        let as_of = start.checked_add_days(Days::new(offset)).unwrap();
        for day in 1..=31 {
            let next = next_occurrence(&monthly(day), as_of).unwrap();
            assert!(next >= as_of, "day {} as of {} gave {}", day, as_of, next);
        }
    }
}

#[test]
fn weekly_same_weekday_is_due_today() {
    // 2024-03-20 is a Wednesday.
    assert_eq!(
        next_occurrence(&weekly(3), d("2024-03-20")),
        Some(d("2024-03-20"))
    );
}

#[test]
fn weekly_finds_following_weekday() {
    assert_eq!(
        next_occurrence(&weekly(0), d("2024-03-20")),
        Some(d("2024-03-24"))
    );
    assert_eq!(
        next_occurrence(&weekly(2), d("2024-03-20")),
        Some(d("2024-03-26"))
    );
}

#[test]
fn yearly_this_year_or_next() {
    assert_eq!(
        next_occurrence(&yearly(6, 15), d("2024-03-01")),
        Some(d("2024-06-15"))
    );
    assert_eq!(
        next_occurrence(&yearly(6, 15), d("2024-07-01")),
        Some(d("2025-06-15"))
    );
}

#[test]
fn yearly_leap_day_clamps_in_common_years() {
    assert_eq!(
        next_occurrence(&yearly(2, 29), d("2024-03-01")),
        Some(d("2025-02-28"))
    );
    assert_eq!(
        next_occurrence(&yearly(2, 29), d("2027-03-01")),
        Some(d("2028-02-29"))
    );
}

#[test]
fn custom_returns_date_even_when_past() {
    let r = RecurringRule {
        custom_date: Some(d("2024-01-10")),
        ..rule(Some(Frequency::Custom))
    };
    assert_eq!(next_occurrence(&r, d("2024-03-01")), Some(d("2024-01-10")));

    let missing = rule(Some(Frequency::Custom));
    assert_eq!(next_occurrence(&missing, d("2024-03-01")), None);
}

#[test]
fn fallback_uses_start_date() {
    let future = RecurringRule {
        start_date: Some(d("2024-05-01")),
        ..rule(Some(Frequency::Monthly))
    };
    assert_eq!(next_occurrence(&future, d("2024-03-01")), Some(d("2024-05-01")));

    let past = RecurringRule {
        start_date: Some(d("2024-01-01")),
        ..rule(None)
    };
    assert_eq!(next_occurrence(&past, d("2024-03-01")), None);

    assert_eq!(next_occurrence(&rule(None), d("2024-03-01")), Some(d("2024-03-01")));
}

#[test]
fn start_date_in_future_delays_first_occurrence() {
    let r = RecurringRule {
        start_date: Some(d("2024-06-20")),
        ..monthly(15)
    };
    assert_eq!(next_occurrence(&r, d("2024-03-01")), Some(d("2024-07-15")));
}

#[test]
fn end_date_terminates_series() {
    let r = RecurringRule {
        end_date: Some(d("2024-03-31")),
        ..monthly(15)
    };
    assert_eq!(next_occurrence(&r, d("2024-03-10")), Some(d("2024-03-15")));
    // The April occurrence lies past the end date.
    assert_eq!(next_occurrence(&r, d("2024-03-20")), None);
    assert_eq!(next_occurrence(&r, d("2024-04-01")), None);

    for rule in [weekly(1), yearly(1, 1), monthly(1)] {
        let ended = RecurringRule {
            end_date: Some(d("2024-01-31")),
            ..rule
        };
        assert_eq!(next_occurrence(&ended, d("2024-02-01")), None);
    }
}

#[test]
fn stale_fields_from_other_frequencies_are_ignored() {
    let r = RecurringRule {
        day_of_month: Some(15),
        month_of_year: Some(12),
        custom_date: Some(d("2020-01-01")),
        ..weekly(3)
    };
    assert_eq!(next_occurrence(&r, d("2024-03-18")), Some(d("2024-03-20")));
}

#[test]
fn resolution_is_idempotent() {
    let as_of = d("2024-03-20");
    for r in [monthly(31), weekly(6), yearly(2, 29), rule(None)] {
        let first = next_occurrence(&r, as_of);
        let second = next_occurrence(&r, as_of);
        assert_eq!(first, second);
    }
}

#[test]
fn out_of_range_fields_fall_back_to_start_date() {
    let zero_day = RecurringRule {
        start_date: Some(d("2024-05-01")),
        ..monthly(0)
    };
    assert_eq!(next_occurrence(&zero_day, d("2024-03-01")), Some(d("2024-05-01")));

    assert_eq!(next_occurrence(&weekly(9), d("2024-03-20")), Some(d("2024-03-20")));

    let bad_month = RecurringRule {
        start_date: Some(d("2024-01-01")),
        ..yearly(13, 1)
    };
    assert_eq!(next_occurrence(&bad_month, d("2024-03-01")), None);
}
