// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::LedgerResult;
use crate::models::{PaymentMethod, RecurringRule};
use crate::recurring::load_rules;
use crate::schedule::next_occurrence;
use crate::utils::month_bounds;

pub const DEFAULT_WINDOW_DAYS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingItem {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub next_due_date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub account_id: Option<i64>,
    pub credit_card_id: Option<i64>,
}

/// Active rules due within `[today, today + window_days]` that have not been
/// paid this month.
///
/// `satisfied` is checked against the current month only, so a rule paid
/// this month stays quiet even when next month's due date enters the window.
pub fn upcoming(
    rules: &[RecurringRule],
    today: NaiveDate,
    satisfied: &HashSet<i64>,
    window_days: u32,
) -> Vec<UpcomingItem> {
    let horizon = today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX);
    let mut items: Vec<UpcomingItem> = rules
        .iter()
        .filter(|r| r.active && !satisfied.contains(&r.id))
        .filter_map(|r| {
            let due = next_occurrence(r, today)?;
            (due >= today && due <= horizon).then(|| UpcomingItem {
                id: r.id,
                name: r.name.clone(),
                amount: r.installment_amount,
                next_due_date: due,
                payment_method: r.payment_method,
                account_id: r.account_id,
                credit_card_id: r.credit_card_id,
            })
        })
        .collect();
    items.sort_by(|a, b| a.next_due_date.cmp(&b.next_due_date).then(a.id.cmp(&b.id)));
    items
}

/// Rule ids with an expense linked to them dated within the month of `today`.
pub fn satisfied_this_month(
    conn: &Connection,
    user: &str,
    today: NaiveDate,
) -> LedgerResult<HashSet<i64>> {
    let (start, end) = month_bounds(today);
    let mut stmt = conn.prepare(
        "SELECT DISTINCT recurring_id FROM transactions
         WHERE user_id=?1 AND type='expense' AND recurring_id IS NOT NULL
           AND date>=?2 AND date<=?3",
    )?;
    let rows = stmt.query_map(params![user, start.to_string(), end.to_string()], |r| {
        r.get::<_, i64>(0)
    })?;
    let mut ids = HashSet::new();
    for id in rows {
        ids.insert(id?);
    }
    Ok(ids)
}

pub fn upcoming_for_user(
    conn: &Connection,
    user: &str,
    today: NaiveDate,
    window_days: u32,
) -> LedgerResult<Vec<UpcomingItem>> {
    let rules = load_rules(conn, user, true)?;
    let satisfied = satisfied_this_month(conn, user, today)?;
    let items = upcoming(&rules, today, &satisfied, window_days);
    tracing::debug!(
        user,
        rules = rules.len(),
        satisfied = satisfied.len(),
        due = items.len(),
        "upcoming alerts computed"
    );
    Ok(items)
}
