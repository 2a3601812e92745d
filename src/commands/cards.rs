// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CreditCard;
use crate::utils::{fmt_money, from_cents, maybe_print_json, parse_decimal, pretty_table, to_cents};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
            let available = sub
                .get_one::<String>("available")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let bank = sub
                .get_one::<String>("bank")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            add(conn, user, name, bank, limit, available)?;
            println!("Added card '{}' with limit {}", name, fmt_money(&limit));
        }
        Some(("list", sub)) => {
            let data = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.bank_name.clone().unwrap_or_default(),
                            fmt_money(&c.credit_limit),
                            fmt_money(&c.available_limit),
                            fmt_money(&c.outstanding()),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Bank", "Limit", "Available", "Outstanding"],
                        rows
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let n = conn.execute(
                "DELETE FROM credit_cards WHERE user_id=?1 AND name=?2",
                params![user, name],
            )?;
            if n == 0 {
                bail!("Credit card '{}' not found", name);
            }
            println!("Removed card '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

/// `available` defaults to the full limit and must lie within `[0, limit]`.
pub fn add(
    conn: &Connection,
    user: &str,
    name: &str,
    bank: Option<&str>,
    limit: Decimal,
    available: Option<Decimal>,
) -> Result<i64> {
    if name.is_empty() {
        bail!("Card name is required");
    }
    if limit < Decimal::ZERO {
        bail!("Credit limit cannot be negative");
    }
    let available = available.unwrap_or(limit);
    if available < Decimal::ZERO || available > limit {
        bail!(
            "Available limit {} must be between 0 and the credit limit {}",
            available,
            limit
        );
    }
    conn.execute(
        "INSERT INTO credit_cards(user_id, name, bank_name, credit_limit_cents, available_cents)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user, name, bank, to_cents(limit)?, to_cents(available)?],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list(conn: &Connection, user: &str) -> Result<Vec<CreditCard>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, bank_name, credit_limit_cents, available_cents FROM credit_cards
         WHERE user_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok(CreditCard {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            bank_name: r.get(3)?,
            credit_limit: from_cents(r.get(4)?),
            available_limit: from_cents(r.get(5)?),
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
