// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use duebook::commands::{accounts, cards};
use duebook::db;
use duebook::forms::{ExpenseForm, IncomeForm};
use duebook::ledger::{
    LedgerEffect, delete_transaction, effects_for, get_account, get_card, post_transaction,
};
use duebook::models::NewTransaction;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::thread;

struct Fixture {
    conn: Connection,
    savings: i64,
    gold: i64,
    bob_card: i64,
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> Fixture {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let savings = accounts::add(&conn, "alice", "Savings", "savings", None, dec("10000")).unwrap();
    let gold = cards::add(&conn, "alice", "Gold", Some("HDFC"), dec("50000"), None).unwrap();
    accounts::add(&conn, "bob", "Savings", "savings", None, dec("700")).unwrap();
    let bob_card = cards::add(&conn, "bob", "Gold", None, dec("20000"), None).unwrap();
    Fixture {
        conn,
        savings,
        gold,
        bob_card,
    }
}

fn expense(
    amount: &str,
    method: &str,
    account: Option<i64>,
    card: Option<i64>,
    repay: bool,
) -> NewTransaction {
    ExpenseForm {
        amount: amount.into(),
        date: "2024-03-20".into(),
        payment_method: method.into(),
        account_id: account,
        credit_card_id: card,
        card_repayment: repay,
        ..Default::default()
    }
    .parse()
    .unwrap()
}

fn income_to_card(amount: &str, card: i64) -> NewTransaction {
    IncomeForm {
        amount: amount.into(),
        date: "2024-03-21".into(),
        source: "Refund".into(),
        credit_card_id: Some(card),
        apply_to_card: true,
        ..Default::default()
    }
    .parse()
    .unwrap()
}

fn available(f: &Fixture) -> Decimal {
    get_card(&f.conn, "alice", f.gold).unwrap().available_limit
}

fn balance(f: &Fixture) -> Decimal {
    get_account(&f.conn, "alice", f.savings).unwrap().balance
}

fn tx_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn card_spend_reduces_available_limit() {
    let mut f = setup();
    let posted = post_transaction(
        &mut f.conn,
        "alice",
        expense("12000", "credit_card", None, Some(f.gold), false),
    )
    .unwrap();
    assert_eq!(available(&f), dec("38000"));
    let change = posted.delta.for_card(f.gold).unwrap();
    assert_eq!(change.before, dec("50000"));
    assert_eq!(change.after, dec("38000"));
    assert_eq!(change.delta(), dec("-12000"));
    assert_eq!(tx_count(&f.conn), 1);
}

#[test]
fn repayment_debits_account_and_restores_card() {
    let mut f = setup();
    post_transaction(
        &mut f.conn,
        "alice",
        expense("12000", "credit_card", None, Some(f.gold), false),
    )
    .unwrap();

    let posted = post_transaction(
        &mut f.conn,
        "alice",
        expense("5000", "upi", Some(f.savings), Some(f.gold), true),
    )
    .unwrap();
    assert_eq!(available(&f), dec("43000"));
    assert_eq!(balance(&f), dec("5000"));
    assert_eq!(posted.delta.changes.len(), 2);

    // Over-repayment never pushes the available limit past the credit limit.
    post_transaction(
        &mut f.conn,
        "alice",
        expense("20000", "net_banking", Some(f.savings), Some(f.gold), true),
    )
    .unwrap();
    assert_eq!(available(&f), dec("50000"));
    assert_eq!(balance(&f), dec("-15000"));
}

#[test]
fn card_spend_clamps_at_zero() {
    let mut f = setup();
    let posted = post_transaction(
        &mut f.conn,
        "alice",
        expense("60000", "credit_card", None, Some(f.gold), false),
    )
    .unwrap();
    assert_eq!(available(&f), Decimal::ZERO);
    assert_eq!(posted.delta.for_card(f.gold).unwrap().after, Decimal::ZERO);
}

#[test]
fn account_payment_may_overdraw() {
    let mut f = setup();
    post_transaction(
        &mut f.conn,
        "alice",
        expense("15000", "upi", Some(f.savings), None, false),
    )
    .unwrap();
    assert_eq!(balance(&f), dec("-5000"));
}

#[test]
fn cash_records_without_touching_balances() {
    let mut f = setup();
    let posted = post_transaction(&mut f.conn, "alice", expense("500", "cash", None, None, false))
        .unwrap();
    assert!(posted.delta.is_empty());
    assert_eq!(balance(&f), dec("10000"));
    assert_eq!(available(&f), dec("50000"));
    assert_eq!(tx_count(&f.conn), 1);
}

#[test]
fn income_credits_account() {
    let mut f = setup();
    let tx = IncomeForm {
        amount: "2500.50".into(),
        date: "2024-03-01".into(),
        source: "Salary".into(),
        account_id: Some(f.savings),
        ..Default::default()
    }
    .parse()
    .unwrap();
    let posted = post_transaction(&mut f.conn, "alice", tx).unwrap();
    assert_eq!(balance(&f), dec("12500.50"));
    assert_eq!(posted.delta.for_account(f.savings).unwrap().delta(), dec("2500.50"));
}

#[test]
fn card_refund_rebuilds_limit_without_exceeding_it() {
    let mut f = setup();
    post_transaction(
        &mut f.conn,
        "alice",
        expense("12000", "credit_card", None, Some(f.gold), false),
    )
    .unwrap();
    post_transaction(&mut f.conn, "alice", income_to_card("2000", f.gold)).unwrap();
    assert_eq!(available(&f), dec("40000"));

    post_transaction(&mut f.conn, "alice", income_to_card("50000", f.gold)).unwrap();
    assert_eq!(available(&f), dec("50000"));
}

#[test]
fn foreign_card_is_rejected_without_side_effects() {
    let mut f = setup();
    let err = post_transaction(
        &mut f.conn,
        "alice",
        expense("100", "credit_card", None, Some(f.bob_card), false),
    )
    .unwrap_err();
    assert!(err.is_reference());
    assert_eq!(tx_count(&f.conn), 0);
    let bob = get_card(&f.conn, "bob", f.bob_card).unwrap();
    assert_eq!(bob.available_limit, dec("20000"));
    // Alice cannot even read it.
    assert!(get_card(&f.conn, "alice", f.bob_card).unwrap_err().is_reference());
}

#[test]
fn missing_account_is_rejected() {
    let mut f = setup();
    let err = post_transaction(
        &mut f.conn,
        "alice",
        expense("100", "debit_card", Some(999), None, false),
    )
    .unwrap_err();
    assert!(err.is_reference());
    assert_eq!(tx_count(&f.conn), 0);
    assert_eq!(balance(&f), dec("10000"));
}

#[test]
fn foreign_recurring_rule_is_rejected() {
    let mut f = setup();
    f.conn
        .execute(
            "INSERT INTO recurring_rules(user_id, name, frequency, day_of_month, installment_amount)
             VALUES ('bob', 'Rent', 'monthly', 1, '900')",
            [],
        )
        .unwrap();
    let rule_id = f.conn.last_insert_rowid();
    let mut tx = expense("900", "upi", Some(f.savings), None, false);
    tx.recurring_id = Some(rule_id);
    let err = post_transaction(&mut f.conn, "alice", tx).unwrap_err();
    assert!(err.is_reference());
    assert_eq!(tx_count(&f.conn), 0);
    assert_eq!(balance(&f), dec("10000"));
}

#[test]
fn card_spends_are_conserved() {
    let mut f = setup();
    let amounts = ["100.10", "250.25", "999.99", "0.01"];
    for a in amounts {
        post_transaction(
            &mut f.conn,
            "alice",
            expense(a, "credit_card", None, Some(f.gold), false),
        )
        .unwrap();
    }
    let total: Decimal = amounts.iter().map(|a| dec(a)).sum();
    let card = get_card(&f.conn, "alice", f.gold).unwrap();
    assert_eq!(card.credit_limit - card.available_limit, total);
    assert_eq!(card.outstanding(), total);
}

#[test]
fn available_limit_stays_within_bounds() {
    let mut f = setup();
    let steps: Vec<NewTransaction> = vec![
        expense("30000", "credit_card", None, Some(f.gold), false),
        expense("45000", "credit_card", None, Some(f.gold), false),
        expense("1000", "upi", Some(f.savings), Some(f.gold), true),
        income_to_card("70000", f.gold),
        expense("49999.99", "credit_card", None, Some(f.gold), false),
        expense("80000", "cheque", Some(f.savings), Some(f.gold), true),
        expense("0.01", "credit_card", None, Some(f.gold), false),
    ];
    for tx in steps {
        post_transaction(&mut f.conn, "alice", tx).unwrap();
        let a = available(&f);
        assert!(a >= Decimal::ZERO && a <= dec("50000"), "available {}", a);
    }
    assert_eq!(available(&f), dec("49999.99"));
}

#[test]
fn deleting_a_transaction_keeps_its_effect() {
    let mut f = setup();
    let posted = post_transaction(
        &mut f.conn,
        "alice",
        expense("12000", "credit_card", None, Some(f.gold), false),
    )
    .unwrap();
    delete_transaction(&f.conn, "alice", posted.transaction.id).unwrap();
    assert_eq!(tx_count(&f.conn), 0);
    assert_eq!(available(&f), dec("38000"));
    assert!(
        delete_transaction(&f.conn, "alice", posted.transaction.id)
            .unwrap_err()
            .is_reference()
    );
}

#[test]
fn repayment_yields_account_and_card_effects() {
    let tx = expense("5000", "upi", Some(1), Some(2), true);
    assert_eq!(
        effects_for(&tx),
        vec![
            LedgerEffect::AdjustAccount {
                account_id: 1,
                delta: dec("-5000"),
            },
            LedgerEffect::RepayCard {
                card_id: 2,
                amount: dec("5000"),
            },
        ]
    );
    assert!(effects_for(&expense("5", "cash", None, None, false)).is_empty());
}

#[test]
fn malformed_amounts_are_rejected_before_posting() {
    let mut f = setup();
    for raw in ["-5000", "0", "10.005"] {
        let mut tx = expense("1", "credit_card", None, Some(f.gold), false);
        tx.amount = dec(raw);
        let err = post_transaction(&mut f.conn, "alice", tx).unwrap_err();
        assert!(
            matches!(err, duebook::errors::LedgerError::Validation(_)),
            "amount {}",
            raw
        );
    }
    assert_eq!(tx_count(&f.conn), 0);
    assert_eq!(available(&f), dec("50000"));

    // Trailing zeros beyond two places are still a two-decimal amount.
    let mut tx = expense("1", "credit_card", None, Some(f.gold), false);
    tx.amount = dec("10.500");
    post_transaction(&mut f.conn, "alice", tx).unwrap();
    assert_eq!(available(&f), dec("49989.50"));
}

#[test]
fn concurrent_card_spends_are_all_applied() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duebook.sqlite");
    let card = {
        let conn = db::open_at(&path).unwrap();
        cards::add(&conn, "alice", "Gold", None, dec("50000"), None).unwrap()
    };
    let tx = expense("10", "credit_card", None, Some(card), false);

    thread::scope(|s| {
        for _ in 0..THREADS {
            let path = &path;
            let tx = tx.clone();
            s.spawn(move || {
                let mut conn = db::open_at(path).unwrap();
                for _ in 0..PER_THREAD {
                    post_transaction(&mut conn, "alice", tx.clone()).unwrap();
                }
            });
        }
    });

    let conn = db::open_at(&path).unwrap();
    let spent = dec("10") * Decimal::from(THREADS * PER_THREAD);
    assert_eq!(
        get_card(&conn, "alice", card).unwrap().available_limit,
        dec("50000") - spent
    );
    assert_eq!(tx_count(&conn), (THREADS * PER_THREAD) as i64);
}
