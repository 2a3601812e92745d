// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Account;
use crate::utils::{fmt_money, from_cents, maybe_print_json, parse_decimal, pretty_table, to_cents};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind = sub.get_one::<String>("kind").unwrap().trim();
            let bank = sub
                .get_one::<String>("bank")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            let opening = parse_decimal(sub.get_one::<String>("opening").unwrap())?;
            add(conn, user, name, kind, bank, opening)?;
            println!("Added account '{}' ({}) with balance {}", name, kind, fmt_money(&opening));
        }
        Some(("list", sub)) => {
            let data = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), &data)? {
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.kind.clone(),
                            a.bank_name.clone().unwrap_or_default(),
                            fmt_money(&a.balance),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Kind", "Bank", "Balance"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let n = conn.execute(
                "DELETE FROM accounts WHERE user_id=?1 AND name=?2",
                params![user, name],
            )?;
            if n == 0 {
                bail!("Account '{}' not found", name);
            }
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn add(
    conn: &Connection,
    user: &str,
    name: &str,
    kind: &str,
    bank: Option<&str>,
    opening: rust_decimal::Decimal,
) -> Result<i64> {
    if name.is_empty() {
        bail!("Account name is required");
    }
    conn.execute(
        "INSERT INTO accounts(user_id, name, bank_name, kind, balance_cents) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user, name, bank, kind, to_cents(opening)?],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list(conn: &Connection, user: &str) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, bank_name, kind, balance_cents FROM accounts
         WHERE user_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok(Account {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            bank_name: r.get(3)?,
            kind: r.get(4)?,
            balance: from_cents(r.get(5)?),
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
