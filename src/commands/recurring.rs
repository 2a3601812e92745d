// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::forms::RuleForm;
use crate::models::RecurringRule;
use crate::recurring::{delete_rule, emi_progress, get_rule, insert_rule, load_rules, set_active};
use crate::schedule::next_occurrence;
use crate::utils::{as_of, fmt_money, id_for_account, id_for_card, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("show", sub)) => show(conn, user, sub)?,
        Some(("next", sub)) => {
            let id = parse_id(sub)?;
            let today = as_of(sub)?;
            let rule = get_rule(conn, user, id)?;
            match next_occurrence(&rule, today) {
                Some(d) => println!("{}", d),
                None => println!("none"),
            }
        }
        Some(("pause", sub)) => {
            let id = parse_id(sub)?;
            set_active(conn, user, id, false)?;
            println!("Paused rule {}", id);
        }
        Some(("resume", sub)) => {
            let id = parse_id(sub)?;
            set_active(conn, user, id, true)?;
            println!("Resumed rule {}", id);
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub)?;
            delete_rule(conn, user, id)?;
            println!("Removed rule {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn parse_id(sub: &clap::ArgMatches) -> Result<i64> {
    let raw = sub.get_one::<String>("id").unwrap();
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", raw))
}

pub fn form_from_args(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<RuleForm> {
    let text = |name: &str| sub.get_one::<String>(name).cloned();
    let account_id = text("account")
        .map(|n| id_for_account(conn, user, &n))
        .transpose()?;
    let credit_card_id = text("card").map(|n| id_for_card(conn, user, &n)).transpose()?;
    Ok(RuleForm {
        name: text("name").unwrap_or_default(),
        amount: text("amount").unwrap_or_default(),
        frequency: text("frequency").unwrap_or_default(),
        day_of_month: text("day_of_month"),
        month_of_year: text("month_of_year"),
        day_of_week: text("day_of_week"),
        custom_date: text("custom_date"),
        start_date: text("start"),
        end_date: text("end"),
        active: !sub.get_flag("inactive"),
        total_amount: text("total"),
        tab_type: text("tab"),
        payment_method: text("method"),
        account_id,
        credit_card_id,
    })
}

fn add(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let today = as_of(sub)?;
    let rule = form_from_args(conn, user, sub)?.parse(user, today)?;
    let id = insert_rule(conn, &rule, today)?;
    match next_occurrence(&rule, today) {
        Some(d) => println!("Added rule {} '{}', next due {}", id, rule.name, d),
        None => println!("Added rule {} '{}', no further occurrence", id, rule.name),
    }
    Ok(())
}

#[derive(Serialize)]
pub struct RuleRow {
    pub id: i64,
    pub name: String,
    pub tab: String,
    pub frequency: String,
    pub amount: String,
    pub next_due: Option<NaiveDate>,
    pub active: bool,
}

/// Rules ordered by their recomputed due date; ended series sort last.
pub fn query_rows(
    conn: &Connection,
    user: &str,
    include_paused: bool,
    today: NaiveDate,
) -> Result<Vec<RuleRow>> {
    let rules = load_rules(conn, user, !include_paused)?;
    let mut rows: Vec<RuleRow> = rules
        .iter()
        .map(|r| RuleRow {
            id: r.id,
            name: r.name.clone(),
            tab: r.tab_type.map(|t| t.to_string()).unwrap_or_default(),
            frequency: describe(r),
            amount: fmt_money(&r.installment_amount),
            next_due: next_occurrence(r, today),
            active: r.active,
        })
        .collect();
    rows.sort_by_key(|r| (r.next_due.is_none(), r.next_due, r.id));
    Ok(rows)
}

fn list(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let today = as_of(sub)?;
    let data = query_rows(conn, user, sub.get_flag("all"), today)?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.name.clone(),
                    r.tab.clone(),
                    r.frequency.clone(),
                    r.amount.clone(),
                    r.next_due.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                    if r.active { "yes".into() } else { "paused".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Tab", "Schedule", "Amount", "Next due", "Active"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(sub)?;
    let today = as_of(sub)?;
    let rule = get_rule(conn, user, id)?;
    let progress = emi_progress(conn, &rule)?;
    let next_due = next_occurrence(&rule, today);

    #[derive(Serialize)]
    struct Detail<'a> {
        rule: &'a RecurringRule,
        next_due: Option<NaiveDate>,
        progress: &'a crate::recurring::EmiProgress,
    }
    let detail = Detail {
        rule: &rule,
        next_due,
        progress: &progress,
    };
    if maybe_print_json(sub.get_flag("json"), &detail)? {
        return Ok(());
    }

    let mut rows = vec![
        vec!["Name".to_string(), rule.name.clone()],
        vec!["Schedule".to_string(), describe(&rule)],
        vec!["Amount".to_string(), fmt_money(&rule.installment_amount)],
        vec![
            "Next due".to_string(),
            next_due.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        ],
        vec!["Paid so far".to_string(), fmt_money(&progress.paid)],
    ];
    if let Some(total) = rule.total_amount {
        rows.push(vec!["Total".to_string(), fmt_money(&total)]);
    }
    if let Some(pending) = progress.pending {
        rows.push(vec!["Pending".to_string(), fmt_money(&pending)]);
    }
    if let Some(n) = progress.remaining_installments {
        rows.push(vec!["Installments left".to_string(), n.to_string()]);
    }
    println!("{}", pretty_table(&["Field", "Value"], rows));
    Ok(())
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn describe(rule: &RecurringRule) -> String {
    use crate::models::Frequency::*;
    match (rule.frequency, rule.day_of_month, rule.month_of_year, rule.day_of_week) {
        (Some(Monthly), Some(d), _, _) => format!("monthly on day {}", d),
        (Some(Weekly), _, _, Some(w)) => format!(
            "weekly on {}",
            WEEKDAYS.get(w as usize).copied().unwrap_or("?")
        ),
        (Some(Yearly), Some(d), Some(m), _) => format!("yearly on {:02}-{:02}", m, d),
        (Some(Custom), ..) => match rule.custom_date {
            Some(d) => format!("once on {}", d),
            None => "once".to_string(),
        },
        _ => "from start date".to_string(),
    }
}
