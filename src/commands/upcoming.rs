// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::upcoming::upcoming_for_user;
use crate::utils::{alert_window_days, as_of, fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    let today = as_of(m)?;
    let days = match m.get_one::<u32>("days") {
        Some(d) => *d,
        None => alert_window_days(conn)?,
    };
    let items = upcoming_for_user(conn, user, today, days)?;
    if maybe_print_json(m.get_flag("json"), &items)? {
        return Ok(());
    }
    if items.is_empty() {
        println!("Nothing due in the next {} days", days);
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|i| {
            vec![
                i.id.to_string(),
                i.name.clone(),
                fmt_money(&i.amount),
                i.next_due_date.to_string(),
                i.payment_method.map(|p| p.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Name", "Amount", "Due", "Pay with"], rows)
    );
    Ok(())
}
