// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::recurring::load_rules;
use crate::schedule::next_occurrence;
use crate::utils::{as_of, from_cents, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    let rows = check(conn, user, as_of(m)?)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn check(conn: &Connection, user: &str, today: NaiveDate) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Cards outside [0, limit]
    let mut stmt = conn.prepare(
        "SELECT name, credit_limit_cents, available_cents FROM credit_cards
         WHERE user_id=?1 AND (available_cents < 0 OR available_cents > credit_limit_cents)",
    )?;
    let mut cur = stmt.query(params![user])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        let limit: i64 = r.get(1)?;
        let available: i64 = r.get(2)?;
        rows.push(vec![
            "card_limit_out_of_range".into(),
            format!("{}: available {} of {}", name, from_cents(available), from_cents(limit)),
        ]);
    }

    // 2) Transactions pointing at another user's account or card
    let mut stmt2 = conn.prepare(
        "SELECT t.id FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN credit_cards c ON t.credit_card_id=c.id
         WHERE t.user_id=?1 AND (a.user_id != t.user_id OR c.user_id != t.user_id)",
    )?;
    let mut cur2 = stmt2.query(params![user])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["foreign_reference".into(), format!("transaction {}", id)]);
    }

    // 3) Persisted next-due hints that no longer match
    for rule in load_rules(conn, user, false)? {
        let fresh = next_occurrence(&rule, today);
        if fresh != rule.next_due_date {
            let show =
                |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
            rows.push(vec![
                "stale_due_hint".into(),
                format!(
                    "rule {} '{}': stored {}, now {}",
                    rule.id,
                    rule.name,
                    show(rule.next_due_date),
                    show(fresh)
                ),
            ]);
        }
    }

    Ok(rows)
}
