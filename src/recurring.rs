// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::RecurringRule;
use crate::schedule::next_occurrence;

const RULE_COLUMNS: &str = "id, user_id, name, frequency, day_of_month, month_of_year, day_of_week,
     custom_date, start_date, end_date, active, total_amount, installment_amount, tab_type,
     payment_method, account_id, credit_card_id, next_due_date";

fn opt_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

fn opt_decimal(s: Option<String>) -> Option<Decimal> {
    s.and_then(|s| s.trim().parse::<Decimal>().ok())
}

/// Unparseable stored values are read as absent, which routes the rule
/// through the resolver's fallback branch instead of failing the whole list.
fn rule_from_row(r: &Row<'_>) -> rusqlite::Result<RecurringRule> {
    let frequency: String = r.get(3)?;
    let tab_type: Option<String> = r.get(13)?;
    let payment_method: Option<String> = r.get(14)?;
    let installment: String = r.get(12)?;
    Ok(RecurringRule {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        frequency: frequency.parse().ok(),
        day_of_month: r.get(4)?,
        month_of_year: r.get(5)?,
        day_of_week: r.get(6)?,
        custom_date: opt_date(r.get(7)?),
        start_date: opt_date(r.get(8)?),
        end_date: opt_date(r.get(9)?),
        active: r.get(10)?,
        total_amount: opt_decimal(r.get(11)?),
        installment_amount: installment.parse().unwrap_or(Decimal::ZERO),
        tab_type: tab_type.and_then(|s| s.parse().ok()),
        payment_method: payment_method.and_then(|s| s.parse().ok()),
        account_id: r.get(15)?,
        credit_card_id: r.get(16)?,
        next_due_date: opt_date(r.get(17)?),
    })
}

/// Persists `rule` for its owner together with the computed next-due hint.
pub fn insert_rule(conn: &Connection, rule: &RecurringRule, today: NaiveDate) -> LedgerResult<i64> {
    for (table, kind, id) in [
        ("accounts", "account", rule.account_id),
        ("credit_cards", "credit card", rule.credit_card_id),
    ] {
        if let Some(id) = id {
            let found: Option<i64> = conn
                .query_row(
                    &format!("SELECT 1 FROM {} WHERE id=?1 AND user_id=?2", table),
                    params![id, rule.user_id],
                    |r| r.get(0),
                )
                .optional()?;
            if found.is_none() {
                return Err(LedgerError::Reference { kind, id });
            }
        }
    }

    let next_due = next_occurrence(rule, today);
    conn.execute(
        "INSERT INTO recurring_rules(user_id, name, frequency, day_of_month, month_of_year,
             day_of_week, custom_date, start_date, end_date, active, total_amount,
             installment_amount, tab_type, payment_method, account_id, credit_card_id, next_due_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            rule.user_id,
            rule.name,
            rule.frequency.map(|f| f.as_str()).unwrap_or(""),
            rule.day_of_month,
            rule.month_of_year,
            rule.day_of_week,
            rule.custom_date.map(|d| d.to_string()),
            rule.start_date.map(|d| d.to_string()),
            rule.end_date.map(|d| d.to_string()),
            rule.active,
            rule.total_amount.map(|d| d.to_string()),
            rule.installment_amount.to_string(),
            rule.tab_type.map(|t| t.as_str()),
            rule.payment_method.map(|m| m.as_str()),
            rule.account_id,
            rule.credit_card_id,
            next_due.map(|d| d.to_string()),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, next_due = ?next_due, "recurring rule stored");
    Ok(id)
}

pub fn load_rules(
    conn: &Connection,
    user: &str,
    active_only: bool,
) -> LedgerResult<Vec<RecurringRule>> {
    let mut sql = format!("SELECT {} FROM recurring_rules WHERE user_id=?1", RULE_COLUMNS);
    if active_only {
        sql.push_str(" AND active=1");
    }
    sql.push_str(" ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], rule_from_row)?;
    let mut rules = Vec::new();
    for row in rows {
        rules.push(row?);
    }
    Ok(rules)
}

pub fn get_rule(conn: &Connection, user: &str, id: i64) -> LedgerResult<RecurringRule> {
    conn.query_row(
        &format!(
            "SELECT {} FROM recurring_rules WHERE id=?1 AND user_id=?2",
            RULE_COLUMNS
        ),
        params![id, user],
        rule_from_row,
    )
    .optional()?
    .ok_or(LedgerError::Reference {
        kind: "recurring rule",
        id,
    })
}

pub fn delete_rule(conn: &Connection, user: &str, id: i64) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM recurring_rules WHERE id=?1 AND user_id=?2",
        params![id, user],
    )?;
    if n == 0 {
        return Err(LedgerError::Reference {
            kind: "recurring rule",
            id,
        });
    }
    Ok(())
}

pub fn set_active(conn: &Connection, user: &str, id: i64, active: bool) -> LedgerResult<()> {
    let n = conn.execute(
        "UPDATE recurring_rules SET active=?1 WHERE id=?2 AND user_id=?3",
        params![active, id, user],
    )?;
    if n == 0 {
        return Err(LedgerError::Reference {
            kind: "recurring rule",
            id,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmiProgress {
    pub paid: Decimal,
    pub pending: Option<Decimal>,
    pub remaining_installments: Option<u32>,
}

impl EmiProgress {
    pub fn compute(total: Option<Decimal>, installment: Decimal, paid: Decimal) -> Self {
        let pending = total.map(|t| (t - paid).max(Decimal::ZERO));
        let remaining_installments = match pending {
            Some(p) if installment > Decimal::ZERO => (p / installment).ceil().to_u32(),
            _ => None,
        };
        EmiProgress {
            paid,
            pending,
            remaining_installments,
        }
    }
}

/// Sums the expense transactions linked to the rule.
pub fn emi_progress(conn: &Connection, rule: &RecurringRule) -> LedgerResult<EmiProgress> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions WHERE user_id=?1 AND type='expense' AND recurring_id=?2",
    )?;
    let mut rows = stmt.query(params![rule.user_id, rule.id])?;
    let mut paid = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let a: String = r.get(0)?;
        paid += a.parse::<Decimal>().unwrap_or(Decimal::ZERO);
    }
    Ok(EmiProgress::compute(
        rule.total_amount,
        rule.installment_amount,
        paid,
    ))
}
