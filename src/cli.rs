// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn as_of_arg() -> Arg {
    Arg::new("as_of")
        .long("as-of")
        .help("Reference date YYYY-MM-DD (defaults to today)")
}

fn opt(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).help(help)
}

fn req(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    opt(name, long, help).required(true)
}

pub fn build_cli() -> Command {
    Command::new("duebook")
        .version(crate_version!())
        .about("Recurring bill due dates and account / credit-card ledger")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("DUEBOOK_USER")
                .default_value("default")
                .help("Identity whose records are read and written"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("account")
                .about("Bank accounts")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "name", "Account name"))
                        .arg(opt("kind", "kind", "savings, current, loan_*, cash").default_value("savings"))
                        .arg(opt("bank", "bank", "Bank name"))
                        .arg(opt("opening", "opening", "Opening balance").default_value("0")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(req("name", "name", "Account name"))),
        )
        .subcommand(
            Command::new("card")
                .about("Credit cards")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "name", "Card name"))
                        .arg(req("limit", "limit", "Credit limit"))
                        .arg(opt("available", "available", "Available limit (defaults to the full limit)"))
                        .arg(opt("bank", "bank", "Issuing bank")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(req("name", "name", "Card name"))),
        )
        .subcommand(
            Command::new("category")
                .about("Transaction categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "name", "Category name"))
                        .arg(opt("kind", "kind", "income or expense").default_value("expense")),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(req("name", "name", "Category name"))),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring payments: EMIs, subscriptions, utility bills")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "name", "Name"))
                        .arg(req("amount", "amount", "Amount due per occurrence"))
                        .arg(opt("frequency", "frequency", "monthly, weekly, yearly, custom").default_value("monthly"))
                        .arg(opt("day_of_month", "day-of-month", "1-31 (monthly, yearly)"))
                        .arg(opt("month_of_year", "month-of-year", "1-12 (yearly)"))
                        .arg(opt("day_of_week", "day-of-week", "0-6, 0 = Sunday (weekly)"))
                        .arg(opt("custom_date", "custom-date", "YYYY-MM-DD (custom)"))
                        .arg(opt("start", "start", "Start date YYYY-MM-DD"))
                        .arg(opt("end", "end", "End date YYYY-MM-DD"))
                        .arg(opt("total", "total", "Total principal (EMI)"))
                        .arg(opt("tab", "tab", "emi, subscription, utilitybill"))
                        .arg(opt("method", "method", "Suggested payment method"))
                        .arg(opt("account", "account", "Suggested account"))
                        .arg(opt("card", "card", "Suggested credit card"))
                        .arg(
                            Arg::new("inactive")
                                .long("inactive")
                                .action(ArgAction::SetTrue)
                                .help("Store the rule paused"),
                        )
                        .arg(as_of_arg()),
                )
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Include paused rules"),
                        )
                        .arg(as_of_arg())
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("show")
                        .arg(req("id", "id", "Rule id"))
                        .arg(as_of_arg())
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("next")
                        .arg(req("id", "id", "Rule id"))
                        .arg(as_of_arg()),
                )
                .subcommand(Command::new("pause").arg(req("id", "id", "Rule id")))
                .subcommand(Command::new("resume").arg(req("id", "id", "Rule id")))
                .subcommand(Command::new("rm").arg(req("id", "id", "Rule id"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record transactions")
                .subcommand(
                    Command::new("expense")
                        .arg(req("amount", "amount", "Amount"))
                        .arg(req("date", "date", "Date YYYY-MM-DD"))
                        .arg(req("method", "method", "cash, upi, credit_card, debit_card, net_banking, cheque"))
                        .arg(opt("account", "account", "Account paid from"))
                        .arg(opt("card", "card", "Credit card charged, or repaid with --repayment"))
                        .arg(
                            Arg::new("repayment")
                                .long("repayment")
                                .action(ArgAction::SetTrue)
                                .help("This payment settles the --card bill"),
                        )
                        .arg(opt("recurring", "recurring", "Recurring rule id this pays"))
                        .arg(opt("category", "category", "Category name"))
                        .arg(opt("desc", "desc", "Description")),
                )
                .subcommand(
                    Command::new("income")
                        .arg(req("amount", "amount", "Amount"))
                        .arg(req("date", "date", "Date YYYY-MM-DD"))
                        .arg(req("source", "source", "Where the money came from"))
                        .arg(opt("account", "account", "Account credited"))
                        .arg(opt("card", "card", "Credit card refunded (instead of an account)"))
                        .arg(opt("category", "category", "Category name"))
                        .arg(opt("desc", "desc", "Description")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(opt("month", "month", "YYYY-MM"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(clap::value_parser!(usize)),
                        )
                        .arg(json_flag()),
                )
                .subcommand(Command::new("rm").arg(req("id", "id", "Transaction id"))),
        )
        .subcommand(
            Command::new("upcoming")
                .about("Recurring payments due soon and not yet paid this month")
                .arg(as_of_arg())
                .arg(
                    Arg::new("days")
                        .long("days")
                        .value_parser(clap::value_parser!(u32))
                        .help("Alert window in days (defaults to the alert_window_days setting)"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(Command::new("get").arg(req("key", "key", "Setting name")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "key", "Setting name"))
                        .arg(req("value", "value", "Value")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check ledger integrity")
                .arg(as_of_arg()),
        )
}
