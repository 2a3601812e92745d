// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance side effects of recorded transactions.
//!
//! A posting inserts the transaction and applies its effects inside one
//! `BEGIN IMMEDIATE` transaction. Balances change only through relative,
//! clamped `UPDATE` statements so two postings against the same card cannot
//! overwrite each other's deduction.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{LedgerError, LedgerResult};
use crate::models::{Account, CreditCard, NewTransaction, PaymentMethod, Transaction, TxType};
use crate::utils::{from_cents, to_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LedgerEffect {
    /// Signed change to an account balance; balances may go negative.
    AdjustAccount { account_id: i64, delta: Decimal },
    SpendOnCard { card_id: i64, amount: Decimal },
    /// Bill payment towards the card.
    RepayCard { card_id: i64, amount: Decimal },
    /// Refund or adjustment credited to the card.
    RefundToCard { card_id: i64, amount: Decimal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    CreditCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceChange {
    pub kind: EntityKind,
    pub id: i64,
    pub before: Decimal,
    pub after: Decimal,
}

impl BalanceChange {
    pub fn delta(&self) -> Decimal {
        self.after - self.before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerDelta {
    pub changes: Vec<BalanceChange>,
}

impl LedgerDelta {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn for_account(&self, id: i64) -> Option<&BalanceChange> {
        self.changes
            .iter()
            .find(|c| c.kind == EntityKind::Account && c.id == id)
    }

    pub fn for_card(&self, id: i64) -> Option<&BalanceChange> {
        self.changes
            .iter()
            .find(|c| c.kind == EntityKind::CreditCard && c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostedTransaction {
    pub transaction: Transaction,
    pub delta: LedgerDelta,
}

pub fn effects_for(tx: &NewTransaction) -> Vec<LedgerEffect> {
    let mut effects = Vec::new();
    match tx.tx_type {
        TxType::Income => {
            if let Some(card_id) = tx.credit_card_id {
                effects.push(LedgerEffect::RefundToCard {
                    card_id,
                    amount: tx.amount,
                });
            } else if let Some(account_id) = tx.account_id {
                effects.push(LedgerEffect::AdjustAccount {
                    account_id,
                    delta: tx.amount,
                });
            }
        }
        TxType::Expense => match tx.payment_method {
            Some(PaymentMethod::CreditCard) => {
                if let Some(card_id) = tx.credit_card_id {
                    effects.push(LedgerEffect::SpendOnCard {
                        card_id,
                        amount: tx.amount,
                    });
                }
            }
            Some(m) if m.is_account_backed() => {
                if let Some(account_id) = tx.account_id {
                    effects.push(LedgerEffect::AdjustAccount {
                        account_id,
                        delta: -tx.amount,
                    });
                }
                if tx.card_repayment {
                    if let Some(card_id) = tx.credit_card_id {
                        effects.push(LedgerEffect::RepayCard {
                            card_id,
                            amount: tx.amount,
                        });
                    }
                }
            }
            _ => {}
        },
    }
    effects
}

/// Records `tx` for `user` and applies its balance effects atomically.
///
/// Nothing is committed when any referenced account, card, rule or category
/// is missing or belongs to someone else.
pub fn post_transaction(
    conn: &mut Connection,
    user: &str,
    tx: NewTransaction,
) -> LedgerResult<PostedTransaction> {
    match post_inner(conn, user, tx) {
        Ok(posted) => {
            info!(
                id = posted.transaction.id,
                user,
                tx_type = %posted.transaction.details.tx_type,
                amount = %posted.transaction.details.amount,
                changes = posted.delta.changes.len(),
                "transaction posted"
            );
            Ok(posted)
        }
        Err(err) => {
            warn!(user, error = %err, "transaction rejected");
            Err(err)
        }
    }
}

fn post_inner(
    conn: &mut Connection,
    user: &str,
    tx: NewTransaction,
) -> LedgerResult<PostedTransaction> {
    if tx.amount <= Decimal::ZERO || tx.amount.normalize().scale() > 2 {
        return Err(LedgerError::validation(format!(
            "amount {} must be positive with at most 2 decimal places",
            tx.amount
        )));
    }
    let effects = effects_for(&tx);
    let db_tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if let Some(id) = tx.account_id {
        ensure_owned(&db_tx, "accounts", "account", id, user)?;
    }
    if let Some(id) = tx.credit_card_id {
        ensure_owned(&db_tx, "credit_cards", "credit card", id, user)?;
    }
    if let Some(id) = tx.recurring_id {
        ensure_owned(&db_tx, "recurring_rules", "recurring rule", id, user)?;
    }
    if let Some(id) = tx.category_id {
        ensure_owned(&db_tx, "categories", "category", id, user)?;
    }

    db_tx.execute(
        "INSERT INTO transactions(user_id, type, amount, date, description, source, payment_method,
                                  account_id, credit_card_id, recurring_id, category_id, card_repayment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user,
            tx.tx_type.as_str(),
            tx.amount.to_string(),
            tx.date.to_string(),
            tx.description,
            tx.source,
            tx.payment_method.map(|m| m.as_str()),
            tx.account_id,
            tx.credit_card_id,
            tx.recurring_id,
            tx.category_id,
            tx.card_repayment,
        ],
    )?;
    let id = db_tx.last_insert_rowid();

    let mut delta = LedgerDelta::default();
    for effect in &effects {
        delta.changes.push(apply_effect(&db_tx, user, effect)?);
    }
    db_tx.commit()?;

    Ok(PostedTransaction {
        transaction: Transaction {
            id,
            user_id: user.to_string(),
            details: tx,
        },
        delta,
    })
}

fn ensure_owned(
    conn: &Connection,
    table: &str,
    kind: &'static str,
    id: i64,
    user: &str,
) -> LedgerResult<()> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id=?1 AND user_id=?2", table),
            params![id, user],
            |r| r.get(0),
        )
        .optional()?;
    found.map(|_| ()).ok_or(LedgerError::Reference { kind, id })
}

fn apply_effect(
    conn: &Connection,
    user: &str,
    effect: &LedgerEffect,
) -> LedgerResult<BalanceChange> {
    match *effect {
        LedgerEffect::AdjustAccount { account_id, delta } => {
            let before = get_account(conn, user, account_id)?.balance;
            let after: Option<i64> = conn
                .query_row(
                    "UPDATE accounts SET balance_cents = balance_cents + ?1
                     WHERE id=?2 AND user_id=?3 RETURNING balance_cents",
                    params![to_cents(delta)?, account_id, user],
                    |r| r.get(0),
                )
                .optional()?;
            let after = after.ok_or(LedgerError::Reference {
                kind: "account",
                id: account_id,
            })?;
            Ok(BalanceChange {
                kind: EntityKind::Account,
                id: account_id,
                before,
                after: from_cents(after),
            })
        }
        LedgerEffect::SpendOnCard { card_id, amount } => update_card(
            conn,
            user,
            card_id,
            "MIN(credit_limit_cents, MAX(0, available_cents - ?1))",
            amount,
        ),
        LedgerEffect::RepayCard { card_id, amount } => update_card(
            conn,
            user,
            card_id,
            "MAX(0, MIN(credit_limit_cents, available_cents + ?1))",
            amount,
        ),
        // Outstanding balance is floored at zero before the limit is rebuilt.
        LedgerEffect::RefundToCard { card_id, amount } => update_card(
            conn,
            user,
            card_id,
            "MAX(0, MIN(credit_limit_cents, \
             credit_limit_cents - MAX(0, credit_limit_cents - available_cents - ?1)))",
            amount,
        ),
    }
}

fn update_card(
    conn: &Connection,
    user: &str,
    card_id: i64,
    new_available: &str,
    amount: Decimal,
) -> LedgerResult<BalanceChange> {
    let before = get_card(conn, user, card_id)?.available_limit;
    let sql = format!(
        "UPDATE credit_cards SET available_cents = {}
         WHERE id=?2 AND user_id=?3 RETURNING available_cents",
        new_available
    );
    let after: Option<i64> = conn
        .query_row(&sql, params![to_cents(amount)?, card_id, user], |r| r.get(0))
        .optional()?;
    let after = after.ok_or(LedgerError::Reference {
        kind: "credit card",
        id: card_id,
    })?;
    Ok(BalanceChange {
        kind: EntityKind::CreditCard,
        id: card_id,
        before,
        after: from_cents(after),
    })
}

pub fn get_account(conn: &Connection, user: &str, id: i64) -> LedgerResult<Account> {
    conn.query_row(
        "SELECT id, user_id, name, bank_name, kind, balance_cents FROM accounts
         WHERE id=?1 AND user_id=?2",
        params![id, user],
        |r| {
            Ok(Account {
                id: r.get(0)?,
                user_id: r.get(1)?,
                name: r.get(2)?,
                bank_name: r.get(3)?,
                kind: r.get(4)?,
                balance: from_cents(r.get(5)?),
            })
        },
    )
    .optional()?
    .ok_or(LedgerError::Reference { kind: "account", id })
}

pub fn get_card(conn: &Connection, user: &str, id: i64) -> LedgerResult<CreditCard> {
    conn.query_row(
        "SELECT id, user_id, name, bank_name, credit_limit_cents, available_cents FROM credit_cards
         WHERE id=?1 AND user_id=?2",
        params![id, user],
        |r| {
            Ok(CreditCard {
                id: r.get(0)?,
                user_id: r.get(1)?,
                name: r.get(2)?,
                bank_name: r.get(3)?,
                credit_limit: from_cents(r.get(4)?),
                available_limit: from_cents(r.get(5)?),
            })
        },
    )
    .optional()?
    .ok_or(LedgerError::Reference {
        kind: "credit card",
        id,
    })
}

/// Removes the transaction record only. Its balance effect stays in place:
/// postings are append-only ledger entries.
pub fn delete_transaction(conn: &Connection, user: &str, id: i64) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
        params![id, user],
    )?;
    if n == 0 {
        return Err(LedgerError::Reference {
            kind: "transaction",
            id,
        });
    }
    warn!(id, user, "transaction deleted without reversing its balance effect");
    Ok(())
}
