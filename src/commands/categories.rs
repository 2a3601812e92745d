// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxType;
use crate::utils::pretty_table;
use anyhow::{Result, bail};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind: TxType = sub.get_one::<String>("kind").unwrap().parse()?;
            if name.is_empty() {
                bail!("Category name is required");
            }
            conn.execute(
                "INSERT INTO categories(user_id, name, kind) VALUES (?1, ?2, ?3)",
                params![user, name, kind.as_str()],
            )?;
            println!("Added {} category '{}'", kind, name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT name, kind FROM categories WHERE user_id=?1 ORDER BY kind, name")?;
            let rows = stmt.query_map(params![user], |r| {
                Ok(vec![r.get::<_, String>(0)?, r.get::<_, String>(1)?])
            })?;
            let mut data = Vec::new();
            for row in rows {
                data.push(row?);
            }
            println!("{}", pretty_table(&["Name", "Kind"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            conn.execute(
                "DELETE FROM categories WHERE user_id=?1 AND name=?2",
                params![user, name],
            )?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
