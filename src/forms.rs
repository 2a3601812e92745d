// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Raw form input to validated value objects.
//!
//! Every string coming from the command line passes through here before it
//! reaches the resolver or the ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::{Frequency, NewTransaction, PaymentMethod, RecurringRule, TabType, TxType};
use crate::utils::days_in_month;

#[derive(Debug, Clone, Default)]
pub struct RuleForm {
    pub name: String,
    pub amount: String,
    pub frequency: String,
    pub day_of_month: Option<String>,
    pub month_of_year: Option<String>,
    pub day_of_week: Option<String>,
    pub custom_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub active: bool,
    pub total_amount: Option<String>,
    pub tab_type: Option<String>,
    pub payment_method: Option<String>,
    pub account_id: Option<i64>,
    pub credit_card_id: Option<i64>,
}

impl RuleForm {
    /// Builds an unsaved rule (`id` is 0) owned by `user`.
    pub fn parse(self, user: &str, today: NaiveDate) -> LedgerResult<RecurringRule> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::validation("name is required"));
        }
        let installment_amount = parse_amount("amount", &self.amount)?;
        let frequency: Frequency = self.frequency.parse()?;
        let tab_type = non_empty(self.tab_type.as_deref())
            .map(str::parse::<TabType>)
            .transpose()?;
        let payment_method = non_empty(self.payment_method.as_deref())
            .map(str::parse::<PaymentMethod>)
            .transpose()?;

        // Fields the frequency does not use are kept only when they parse.
        let mut day_of_month = lenient_u32(self.day_of_month.as_deref());
        let mut month_of_year = lenient_u32(self.month_of_year.as_deref());
        let mut day_of_week = lenient_u32(self.day_of_week.as_deref());
        let mut custom_date = non_empty(self.custom_date.as_deref())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        match frequency {
            Frequency::Monthly => {
                let day = required_u32("day of month", self.day_of_month.as_deref())?;
                check_range("day of month", day, 1, 31)?;
                day_of_month = Some(day);
            }
            Frequency::Yearly => {
                let month = required_u32("month of year", self.month_of_year.as_deref())?;
                check_range("month of year", month, 1, 12)?;
                let day = required_u32("day of month", self.day_of_month.as_deref())?;
                // 2024 is a leap year, so 29 February is accepted here.
                let max = days_in_month(2024, month).unwrap_or(31);
                check_range("day of month", day, 1, max)?;
                month_of_year = Some(month);
                day_of_month = Some(day);
            }
            Frequency::Weekly => {
                let dow = required_u32("day of week", self.day_of_week.as_deref())?;
                check_range("day of week", dow, 0, 6)?;
                day_of_week = Some(dow);
            }
            Frequency::Custom => {
                let raw = non_empty(self.custom_date.as_deref())
                    .ok_or_else(|| LedgerError::validation("custom date is required"))?;
                custom_date = Some(parse_form_date("custom date", raw)?);
            }
        }

        let mut start_date = optional_date("start date", self.start_date.as_deref())?;
        if start_date.is_none() && tab_type == Some(TabType::Emi) {
            start_date = Some(today);
        }
        let end_date = optional_date("end date", self.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(LedgerError::validation(format!(
                    "end date {} is before start date {}",
                    end, start
                )));
            }
        }

        let total_amount = non_empty(self.total_amount.as_deref())
            .map(|s| parse_amount("total amount", s))
            .transpose()?;

        Ok(RecurringRule {
            id: 0,
            user_id: user.to_string(),
            name,
            frequency: Some(frequency),
            day_of_month,
            month_of_year,
            day_of_week,
            custom_date,
            start_date,
            end_date,
            active: self.active,
            total_amount,
            installment_amount,
            tab_type,
            payment_method,
            account_id: self.account_id,
            credit_card_id: self.credit_card_id,
            next_due_date: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseForm {
    pub amount: String,
    pub date: String,
    pub payment_method: String,
    pub description: Option<String>,
    pub account_id: Option<i64>,
    pub credit_card_id: Option<i64>,
    pub recurring_id: Option<i64>,
    pub category_id: Option<i64>,
    /// A bill payment towards `credit_card_id` rather than a plain spend.
    pub card_repayment: bool,
}

impl ExpenseForm {
    pub fn parse(self) -> LedgerResult<NewTransaction> {
        let amount = parse_amount("amount", &self.amount)?;
        let date = parse_form_date("date", &self.date)?;
        let method: PaymentMethod = self.payment_method.parse()?;

        let (account_id, credit_card_id) = match method {
            PaymentMethod::CreditCard => {
                if self.card_repayment {
                    return Err(LedgerError::validation(
                        "a card cannot be repaid with itself",
                    ));
                }
                let card = self.credit_card_id.ok_or_else(|| {
                    LedgerError::validation("credit card payments need a card")
                })?;
                (None, Some(card))
            }
            PaymentMethod::Cash => {
                if self.card_repayment {
                    return Err(LedgerError::validation(
                        "cash payments are not tracked against cards",
                    ));
                }
                (None, None)
            }
            m if m.is_account_backed() => {
                if self.card_repayment {
                    let card = self.credit_card_id.ok_or_else(|| {
                        LedgerError::validation("a card repayment needs the card being repaid")
                    })?;
                    (self.account_id, Some(card))
                } else {
                    let account = self.account_id.ok_or_else(|| {
                        LedgerError::validation(format!("{} payments need an account", m))
                    })?;
                    (Some(account), None)
                }
            }
            _ => (None, None),
        };

        Ok(NewTransaction {
            tx_type: TxType::Expense,
            amount,
            date,
            description: non_empty(self.description.as_deref()).map(str::to_string),
            source: None,
            payment_method: Some(method),
            account_id,
            credit_card_id,
            recurring_id: self.recurring_id,
            category_id: self.category_id,
            card_repayment: self.card_repayment,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncomeForm {
    pub amount: String,
    pub date: String,
    pub source: String,
    pub description: Option<String>,
    pub account_id: Option<i64>,
    pub credit_card_id: Option<i64>,
    /// Credit the card (refund or adjustment) instead of an account.
    pub apply_to_card: bool,
    pub category_id: Option<i64>,
}

impl IncomeForm {
    pub fn parse(self) -> LedgerResult<NewTransaction> {
        let amount = parse_amount("amount", &self.amount)?;
        let date = parse_form_date("date", &self.date)?;
        let source = self.source.trim().to_string();
        if source.is_empty() {
            return Err(LedgerError::validation("income source is required"));
        }
        let (account_id, credit_card_id) = if self.apply_to_card {
            let card = self
                .credit_card_id
                .ok_or_else(|| LedgerError::validation("a card refund needs a card"))?;
            (None, Some(card))
        } else {
            let account = self
                .account_id
                .ok_or_else(|| LedgerError::validation("income needs an account or a card"))?;
            (Some(account), None)
        };

        Ok(NewTransaction {
            tx_type: TxType::Income,
            amount,
            date,
            description: non_empty(self.description.as_deref()).map(str::to_string),
            source: Some(source),
            payment_method: None,
            account_id,
            credit_card_id,
            recurring_id: None,
            category_id: self.category_id,
            card_repayment: false,
        })
    }
}

/// Positive amount with at most two fractional digits.
pub fn parse_amount(field: &str, raw: &str) -> LedgerResult<Decimal> {
    let raw = raw.trim();
    let d = raw
        .parse::<Decimal>()
        .map_err(|_| LedgerError::validation(format!("{} '{}' is not a number", field, raw)))?;
    if d <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "{} must be positive, got {}",
            field, raw
        )));
    }
    if d.normalize().scale() > 2 {
        return Err(LedgerError::validation(format!(
            "{} '{}' has more than 2 decimal places",
            field, raw
        )));
    }
    Ok(d.round_dp(2))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn lenient_u32(s: Option<&str>) -> Option<u32> {
    non_empty(s).and_then(|s| s.parse::<u32>().ok())
}

fn required_u32(field: &str, s: Option<&str>) -> LedgerResult<u32> {
    let raw =
        non_empty(s).ok_or_else(|| LedgerError::validation(format!("{} is required", field)))?;
    raw.parse::<u32>()
        .map_err(|_| LedgerError::validation(format!("{} '{}' is not a whole number", field, raw)))
}

fn check_range(field: &str, v: u32, lo: u32, hi: u32) -> LedgerResult<()> {
    if v < lo || v > hi {
        return Err(LedgerError::validation(format!(
            "{} must be between {} and {}, got {}",
            field, lo, hi, v
        )));
    }
    Ok(())
}

fn parse_form_date(field: &str, raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        LedgerError::validation(format!("{} '{}' is not a YYYY-MM-DD date", field, raw.trim()))
    })
}

fn optional_date(field: &str, raw: Option<&str>) -> LedgerResult<Option<NaiveDate>> {
    non_empty(raw).map(|s| parse_form_date(field, s)).transpose()
}
