//! Balance computation: raw and normalized account balances, running
//! ledgers, and category totals
//!
//! Everything here is a pure projection over transaction slices; nothing
//! reads or writes storage. Balances are never materialized on accounts.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Raw balance of an account over a set of transactions:
/// sum of debit entries minus sum of credit entries (debit-positive).
pub fn account_balance(account_id: &str, transactions: &[Transaction]) -> BigDecimal {
    let mut balance = BigDecimal::from(0);
    for transaction in transactions {
        for entry in &transaction.entries {
            if entry.account_id == account_id {
                match entry.entry_type {
                    EntryType::Debit => balance += &entry.amount,
                    EntryType::Credit => balance -= &entry.amount,
                }
            }
        }
    }
    balance
}

/// Project a raw (debit-positive) balance onto a category's normal side.
/// A normally-credit account with more credits than debits normalizes to a
/// positive number.
pub fn normalized_balance(raw: &BigDecimal, normal_balance: EntryType) -> BigDecimal {
    match normal_balance {
        EntryType::Debit => raw.clone(),
        EntryType::Credit => -raw.clone(),
    }
}

/// Which side a balance displays on: the category's normal side when the
/// normalized balance is non-negative, the opposite side otherwise.
pub fn balance_side(raw: &BigDecimal, normal_balance: EntryType) -> EntryType {
    if normalized_balance(raw, normal_balance) >= BigDecimal::from(0) {
        normal_balance
    } else {
        normal_balance.inverse()
    }
}

/// One dated row of an account's running ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub description: String,
    /// Total debited to the account by this transaction, if anything
    pub debit: Option<BigDecimal>,
    /// Total credited to the account by this transaction, if anything
    pub credit: Option<BigDecimal>,
    /// Running balance after this row, on the account's normal side
    pub balance: BigDecimal,
}

/// An account's running ledger: a starting balance plus dated rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedger {
    /// Balance carried in before the first row: the account's opening-balance
    /// transaction plus any activity before the requested range start
    pub opening_balance: BigDecimal,
    pub rows: Vec<LedgerRow>,
}

impl AccountLedger {
    /// Running balance after the last row
    pub fn closing_balance(&self) -> BigDecimal {
        self.rows
            .last()
            .map(|row| row.balance.clone())
            .unwrap_or_else(|| self.opening_balance.clone())
    }
}

struct RowAmounts {
    debit: BigDecimal,
    credit: BigDecimal,
}

fn amounts_for(account_id: &str, transaction: &Transaction) -> RowAmounts {
    let mut debit = BigDecimal::from(0);
    let mut credit = BigDecimal::from(0);
    for entry in &transaction.entries {
        if entry.account_id == account_id {
            match entry.entry_type {
                EntryType::Debit => debit += &entry.amount,
                EntryType::Credit => credit += &entry.amount,
            }
        }
    }
    RowAmounts { debit, credit }
}

/// Build an account's running ledger from a set of transactions.
///
/// Rows are ascending by date (creation order within a date). The account's
/// own opening-balance transaction (matched by its exact sentinel
/// description) and any transaction dated before `from` fold into
/// `opening_balance` instead of appearing as rows.
pub fn account_ledger(
    account: &Account,
    normal_balance: EntryType,
    transactions: &[Transaction],
    from: Option<NaiveDate>,
) -> AccountLedger {
    let opening_description = account.opening_description();

    let mut relevant: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.touches(&account.id))
        .collect();
    relevant.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let folds = |t: &Transaction| {
        t.description == opening_description || from.is_some_and(|start| t.date < start)
    };

    let mut opening_balance = BigDecimal::from(0);
    let mut dated = Vec::new();
    for &transaction in &relevant {
        if folds(transaction) {
            let amounts = amounts_for(&account.id, transaction);
            opening_balance += signed_delta(&amounts, normal_balance);
        } else {
            dated.push(transaction);
        }
    }

    let mut running = opening_balance.clone();
    let mut rows = Vec::new();
    for transaction in dated {
        let amounts = amounts_for(&account.id, transaction);
        running += signed_delta(&amounts, normal_balance);
        rows.push(LedgerRow {
            date: transaction.date,
            description: transaction.description.clone(),
            debit: (amounts.debit > BigDecimal::from(0)).then(|| amounts.debit.clone()),
            credit: (amounts.credit > BigDecimal::from(0)).then(|| amounts.credit.clone()),
            balance: running.clone(),
        });
    }

    AccountLedger {
        opening_balance,
        rows,
    }
}

fn signed_delta(amounts: &RowAmounts, normal_balance: EntryType) -> BigDecimal {
    match normal_balance {
        EntryType::Debit => &amounts.debit - &amounts.credit,
        EntryType::Credit => &amounts.credit - &amounts.debit,
    }
}

/// Sum of the normalized balances of a category's member accounts
pub fn category_total(
    category: &Category,
    accounts: &[Account],
    transactions: &[Transaction],
) -> BigDecimal {
    let mut total = BigDecimal::from(0);
    for account in accounts.iter().filter(|a| a.category_id == category.id) {
        let raw = account_balance(&account.id, transactions);
        total += normalized_balance(&raw, category.normal_balance);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::TransactionBuilder;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn txn(date: NaiveDate, description: &str, debit_acc: &str, credit_acc: &str, amount: i64) -> Transaction {
        TransactionBuilder::new("b1".into(), date, description.into())
            .debit(debit_acc.into(), BigDecimal::from(amount), None)
            .credit(credit_acc.into(), BigDecimal::from(amount), None)
            .build()
            .unwrap()
    }

    fn bank_account() -> Account {
        Account::new(
            "b1".into(),
            "cat_assets".into(),
            "Bank".into(),
            Some(BigDecimal::from(500)),
            EntryType::Debit,
        )
    }

    #[test]
    fn raw_balance_is_debits_minus_credits() {
        let transactions = vec![
            txn(day(1), "Deposit", "bank", "income", 300),
            txn(day(2), "Withdrawal", "expense", "bank", 120),
        ];
        assert_eq!(account_balance("bank", &transactions), BigDecimal::from(180));
    }

    #[test]
    fn normalization_flips_for_credit_side_categories() {
        let raw = BigDecimal::from(-250);
        assert_eq!(
            normalized_balance(&raw, EntryType::Credit),
            BigDecimal::from(250)
        );
        assert_eq!(balance_side(&raw, EntryType::Credit), EntryType::Credit);
        assert_eq!(balance_side(&raw, EntryType::Debit), EntryType::Credit);
    }

    #[test]
    fn running_ledger_ends_at_account_balance() {
        let account = bank_account();
        let transactions = vec![
            txn(day(3), "Salary", &account.id, "income", 1000),
            txn(day(5), "Rent", "rent", &account.id, 400),
            txn(day(8), "Refund", &account.id, "expense", 25),
        ];

        let ledger = account_ledger(&account, EntryType::Debit, &transactions, None);
        assert_eq!(ledger.rows.len(), 3);
        assert_eq!(
            ledger.closing_balance(),
            account_balance(&account.id, &transactions)
        );
    }

    #[test]
    fn opening_transaction_folds_into_starting_balance() {
        let account = bank_account();
        let opening = txn(
            day(1),
            &account.opening_description(),
            &account.id,
            "acc_obe",
            500,
        );
        let purchase = txn(day(4), "Groceries", "groceries", &account.id, 80);

        let ledger = account_ledger(&account, EntryType::Debit, &[opening, purchase], None);
        assert_eq!(ledger.opening_balance, BigDecimal::from(500));
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].credit, Some(BigDecimal::from(80)));
        assert_eq!(ledger.closing_balance(), BigDecimal::from(420));
    }

    #[test]
    fn range_start_folds_prior_activity() {
        let account = bank_account();
        let transactions = vec![
            txn(day(1), "Early deposit", &account.id, "income", 100),
            txn(day(10), "Later deposit", &account.id, "income", 40),
        ];

        let ledger = account_ledger(&account, EntryType::Debit, &transactions, Some(day(5)));
        assert_eq!(ledger.opening_balance, BigDecimal::from(100));
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.closing_balance(), BigDecimal::from(140));
    }

    #[test]
    fn category_total_sums_normalized_member_balances() {
        let category = Category::new("b1".into(), "Income".into(), EntryType::Credit);
        let salary = Account::new(
            "b1".into(),
            category.id.clone(),
            "Salary".into(),
            None,
            EntryType::Credit,
        );
        let interest = Account::new(
            "b1".into(),
            category.id.clone(),
            "Interest".into(),
            None,
            EntryType::Credit,
        );
        let elsewhere = Account::new(
            "b1".into(),
            "cat_other".into(),
            "Bank".into(),
            None,
            EntryType::Debit,
        );

        let transactions = vec![
            txn(day(2), "Pay", &elsewhere.id, &salary.id, 900),
            txn(day(3), "Bank interest", &elsewhere.id, &interest.id, 12),
        ];
        let accounts = vec![salary, interest, elsewhere];

        assert_eq!(
            category_total(&category, &accounts, &transactions),
            BigDecimal::from(912)
        );
    }
}
