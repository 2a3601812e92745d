// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::LedgerError;

macro_rules! string_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(LedgerError::validation(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Weekly,
    Yearly,
    Custom,
}

string_enum!(Frequency, "frequency", {
    Monthly => "monthly",
    Weekly => "weekly",
    Yearly => "yearly",
    Custom => "custom",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabType {
    Emi,
    Subscription,
    #[serde(rename = "utilitybill")]
    UtilityBill,
}

string_enum!(TabType, "tab type", {
    Emi => "emi",
    Subscription => "subscription",
    UtilityBill => "utilitybill",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Income,
    Expense,
}

string_enum!(TxType, "transaction type", {
    Income => "income",
    Expense => "expense",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    CreditCard,
    DebitCard,
    NetBanking,
    Cheque,
}

string_enum!(PaymentMethod, "payment method", {
    Cash => "cash",
    Upi => "upi",
    CreditCard => "credit_card",
    DebitCard => "debit_card",
    NetBanking => "net_banking",
    Cheque => "cheque",
});

impl PaymentMethod {
    /// Methods that move money out of a bank account.
    pub fn is_account_backed(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Upi
                | PaymentMethod::DebitCard
                | PaymentMethod::NetBanking
                | PaymentMethod::Cheque
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    /// `None` when the stored value is not a recognized frequency.
    pub frequency: Option<Frequency>,
    pub day_of_month: Option<u32>,
    pub month_of_year: Option<u32>,
    pub day_of_week: Option<u32>,
    pub custom_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub total_amount: Option<Decimal>,
    pub installment_amount: Decimal,
    pub tab_type: Option<TabType>,
    pub payment_method: Option<PaymentMethod>,
    pub account_id: Option<i64>,
    pub credit_card_id: Option<i64>,
    pub next_due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub kind: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub credit_limit: Decimal,
    pub available_limit: Decimal,
}

impl CreditCard {
    pub fn outstanding(&self) -> Decimal {
        self.credit_limit - self.available_limit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub kind: TxType,
}

/// A validated transaction that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub tx_type: TxType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub source: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub account_id: Option<i64>,
    pub credit_card_id: Option<i64>,
    pub recurring_id: Option<i64>,
    pub category_id: Option<i64>,
    pub card_repayment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    #[serde(flatten)]
    pub details: NewTransaction,
}
