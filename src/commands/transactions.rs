// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::forms::{ExpenseForm, IncomeForm};
use crate::ledger::{EntityKind, PostedTransaction, delete_transaction, post_transaction};
use crate::utils::{
    fmt_money, id_for_account, id_for_card, id_for_category, maybe_print_json, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expense", sub)) => {
            let form = expense_form(conn, user, sub)?;
            let posted = post_transaction(conn, user, form.parse()?)?;
            report(&posted);
        }
        Some(("income", sub)) => {
            let form = income_form(conn, user, sub)?;
            let posted = post_transaction(conn, user, form.parse()?)?;
            report(&posted);
        }
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("rm", sub)) => {
            let raw = sub.get_one::<String>("id").unwrap();
            let id = raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid id '{}'", raw))?;
            delete_transaction(conn, user, id)?;
            println!(
                "Removed transaction {} (balances were not changed)",
                id
            );
        }
        _ => {}
    }
    Ok(())
}

fn lookup<F>(sub: &clap::ArgMatches, arg: &str, f: F) -> Result<Option<i64>>
where
    F: Fn(&str) -> Result<i64>,
{
    sub.get_one::<String>(arg)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(f)
        .transpose()
}

pub fn expense_form(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<ExpenseForm> {
    let recurring_id = sub
        .get_one::<String>("recurring")
        .map(|s| {
            s.trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid recurring id '{}'", s))
        })
        .transpose()?;
    Ok(ExpenseForm {
        amount: sub.get_one::<String>("amount").cloned().unwrap_or_default(),
        date: sub.get_one::<String>("date").cloned().unwrap_or_default(),
        payment_method: sub.get_one::<String>("method").cloned().unwrap_or_default(),
        description: sub.get_one::<String>("desc").cloned(),
        account_id: lookup(sub, "account", |n| id_for_account(conn, user, n))?,
        credit_card_id: lookup(sub, "card", |n| id_for_card(conn, user, n))?,
        recurring_id,
        category_id: lookup(sub, "category", |n| id_for_category(conn, user, n))?,
        card_repayment: sub.get_flag("repayment"),
    })
}

pub fn income_form(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<IncomeForm> {
    let credit_card_id = lookup(sub, "card", |n| id_for_card(conn, user, n))?;
    Ok(IncomeForm {
        amount: sub.get_one::<String>("amount").cloned().unwrap_or_default(),
        date: sub.get_one::<String>("date").cloned().unwrap_or_default(),
        source: sub.get_one::<String>("source").cloned().unwrap_or_default(),
        description: sub.get_one::<String>("desc").cloned(),
        account_id: lookup(sub, "account", |n| id_for_account(conn, user, n))?,
        apply_to_card: credit_card_id.is_some(),
        credit_card_id,
        category_id: lookup(sub, "category", |n| id_for_category(conn, user, n))?,
    })
}

fn report(posted: &PostedTransaction) {
    let tx = &posted.transaction;
    println!(
        "Recorded {} {} on {} (id {})",
        tx.details.tx_type,
        fmt_money(&tx.details.amount),
        tx.details.date,
        tx.id
    );
    for change in &posted.delta.changes {
        let what = match change.kind {
            EntityKind::Account => "account balance",
            EntityKind::CreditCard => "card available limit",
        };
        println!(
            "  {} #{}: {} -> {}",
            what,
            change.id,
            fmt_money(&change.before),
            fmt_money(&change.after)
        );
    }
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub tx_type: String,
    pub amount: String,
    pub method: String,
    pub target: String,
    pub recurring: String,
    pub description: String,
}

pub fn query_rows(
    conn: &Connection,
    user: &str,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.type, t.amount, COALESCE(t.payment_method, ''),
                COALESCE(a.name, c.name, ''), COALESCE(r.name, ''),
                COALESCE(t.description, t.source, '')
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN credit_cards c ON t.credit_card_id=c.id
         LEFT JOIN recurring_rules r ON t.recurring_id=r.id
         WHERE t.user_id=?1",
    );
    let mut params_vec: Vec<String> = vec![user.to_string()];

    if let Some(month) = sub.get_one::<String>("month") {
        params_vec.push(month.trim().to_string());
        sql.push_str(&format!(" AND substr(t.date,1,7)=?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            tx_type: r.get(2)?,
            amount: r.get(3)?,
            method: r.get(4)?,
            target: r.get(5)?,
            recurring: r.get(6)?,
            description: r.get(7)?,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, user, sub)?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.tx_type.clone(),
                    r.amount.clone(),
                    r.method.clone(),
                    r.target.clone(),
                    r.recurring.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Amount", "Method", "Account/Card", "Recurring", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

