//! Account management and the opening-balance bookkeeping state machine

use bigdecimal::BigDecimal;
use tracing::debug;

use crate::ledger::recycle::RecycleBin;
use crate::ledger::transaction::LedgerEngine;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{names_collide, validate_name};

/// Caller-supplied fields for creating an account
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub name: String,
    pub category_id: String,
    pub opening_balance: Option<BigDecimal>,
    pub opening_balance_type: EntryType,
}

/// Partial update to an account. Absent fields keep their current value;
/// `opening_balance: Some(0)` clears the opening balance.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub opening_balance: Option<BigDecimal>,
    pub opening_balance_type: Option<EntryType>,
}

/// Account registry for a book's chart of accounts
///
/// Owns the relationship between an account and its paired opening-balance
/// transaction: a declared opening balance materializes as a double entry
/// against the book's Opening Balance Equity account, and stays in step with
/// the account through renames, balance changes, and deletion.
pub struct AccountRegistry<S: BookStorage> {
    storage: S,
    engine: LedgerEngine<S>,
    bin: RecycleBin<S>,
}

impl<S: BookStorage + Clone> AccountRegistry<S> {
    /// Create a new account registry over the given storage
    pub fn new(storage: S) -> Self {
        Self {
            engine: LedgerEngine::new(storage.clone()),
            bin: RecycleBin::new(storage.clone()),
            storage,
        }
    }

    /// List a book's accounts. System accounts never appear here.
    pub async fn list_accounts(&self, book_id: &str) -> LedgerResult<Vec<Account>> {
        let accounts = self.storage.list_accounts(book_id).await?;
        Ok(accounts.into_iter().filter(|a| !a.is_system).collect())
    }

    /// Get an account by id within a book, failing if absent
    pub async fn get_account_required(
        &self,
        book_id: &str,
        account_id: &str,
    ) -> LedgerResult<Account> {
        match self.storage.get_account(account_id).await? {
            Some(account) if account.book_id == book_id => Ok(account),
            _ => Err(LedgerError::NotFound(format!(
                "account '{account_id}' in book '{book_id}'"
            ))),
        }
    }

    /// Resolve a book's Opening Balance Equity system account
    pub async fn opening_balance_equity(&self, book_id: &str) -> LedgerResult<Account> {
        let id = opening_balance_equity_id(book_id);
        self.storage
            .get_account(&id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("book '{book_id}' has no equity account")))
    }

    /// Create an account. An opening balance greater than zero also records
    /// the paired opening transaction; zero or absent records nothing.
    pub async fn create_account(
        &mut self,
        book_id: &str,
        draft: AccountDraft,
    ) -> LedgerResult<Account> {
        validate_name(&draft.name)?;
        self.ensure_name_free(book_id, &draft.name, None).await?;

        if self.storage.get_category(&draft.category_id).await?.map(|c| c.book_id)
            != Some(book_id.to_string())
        {
            return Err(LedgerError::NotFound(format!(
                "category '{}' in book '{book_id}'",
                draft.category_id
            )));
        }

        let opening_balance = normalize_opening(draft.opening_balance)?;
        let account = Account::new(
            book_id.to_string(),
            draft.category_id,
            draft.name.trim().to_string(),
            opening_balance.clone(),
            draft.opening_balance_type,
        );
        self.storage.save_account(&account).await?;

        if let Some(amount) = opening_balance {
            self.record_opening_transaction(&account, &amount, draft.opening_balance_type)
                .await?;
        }

        Ok(account)
    }

    /// Apply changes to an account, keeping its opening transaction in step.
    ///
    /// Transitions:
    /// - new balance > 0, opening transaction present: replace its entries
    ///   and description in place
    /// - new balance > 0, no opening transaction: create one
    /// - new balance zero, opening transaction present: delete it
    /// - balance untouched but account renamed: rewrite the transaction's
    ///   sentinel description to the new name
    pub async fn update_account(
        &mut self,
        book_id: &str,
        account_id: &str,
        changes: AccountChanges,
    ) -> LedgerResult<Account> {
        let mut account = self.get_account_required(book_id, account_id).await?;
        if account.is_system {
            return Err(LedgerError::Protected(format!(
                "account '{}' is system-managed",
                account.name
            )));
        }

        let previous_description = account.opening_description();

        if let Some(name) = &changes.name {
            validate_name(name)?;
            self.ensure_name_free(book_id, name, Some(account_id)).await?;
            account.name = name.trim().to_string();
        }

        if let Some(category_id) = &changes.category_id {
            if self.storage.get_category(category_id).await?.map(|c| c.book_id)
                != Some(book_id.to_string())
            {
                return Err(LedgerError::NotFound(format!(
                    "category '{category_id}' in book '{book_id}'"
                )));
            }
            account.category_id = category_id.clone();
        }

        let opening_balance = match changes.opening_balance {
            Some(amount) => normalize_opening(Some(amount))?,
            None => account.opening_balance.clone(),
        };
        let opening_type = changes
            .opening_balance_type
            .unwrap_or(account.opening_balance_type);

        account.opening_balance = opening_balance.clone();
        account.opening_balance_type = opening_type;
        self.storage.update_account(&account).await?;

        let existing = self
            .engine
            .find_by_description(book_id, &previous_description)
            .await?;

        match (opening_balance, existing) {
            (Some(amount), Some(opening_txn)) => {
                let obe = self.opening_balance_equity(book_id).await?;
                let draft = TransactionDraft {
                    date: opening_txn.date,
                    description: account.opening_description(),
                    entries: opening_entries(&account.id, &obe.id, &amount, opening_type),
                };
                self.engine
                    .update_transaction(book_id, &opening_txn.id, draft)
                    .await?;
            }
            (Some(amount), None) => {
                self.record_opening_transaction(&account, &amount, opening_type)
                    .await?;
            }
            (None, Some(opening_txn)) => {
                debug!(account = %account.name, "clearing opening balance");
                self.engine
                    .delete_transaction(book_id, &opening_txn.id)
                    .await?;
            }
            (None, None) => {}
        }

        Ok(account)
    }

    /// Delete an account, snapshotting it to the recycle bin.
    ///
    /// Allowed only while the account's sole ledger activity is its own
    /// opening transaction, which is deleted (through the ledger engine, so
    /// it also lands in the bin) before the account itself.
    pub async fn delete_account(
        &mut self,
        book_id: &str,
        account_id: &str,
    ) -> LedgerResult<RecycleBinItem> {
        let account = self.get_account_required(book_id, account_id).await?;
        if account.is_system {
            return Err(LedgerError::Protected(format!(
                "account '{}' is system-managed",
                account.name
            )));
        }

        let opening_description = account.opening_description();
        let transactions = self.engine.list_transactions(book_id).await?;
        let touching: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.touches(account_id))
            .collect();

        if touching
            .iter()
            .any(|t| t.description != opening_description)
        {
            return Err(LedgerError::Invariant(format!(
                "account '{}' has recorded transactions",
                account.name
            )));
        }

        for opening_txn in touching {
            let id = opening_txn.id.clone();
            self.engine.delete_transaction(book_id, &id).await?;
        }

        let item = self
            .bin
            .soft_delete(RecycledEntity::Account(account))
            .await?;
        self.storage.delete_account(account_id).await?;
        Ok(item)
    }

    /// Find a same-named account in a book (case-insensitive). System
    /// accounts are excluded. Used by cross-book transfers.
    pub async fn find_by_name(
        &self,
        book_id: &str,
        name: &str,
    ) -> LedgerResult<Option<Account>> {
        let accounts = self.list_accounts(book_id).await?;
        Ok(accounts.into_iter().find(|a| names_collide(&a.name, name)))
    }

    async fn record_opening_transaction(
        &mut self,
        account: &Account,
        amount: &BigDecimal,
        entry_type: EntryType,
    ) -> LedgerResult<Transaction> {
        let obe = self.opening_balance_equity(&account.book_id).await?;
        let draft = TransactionDraft {
            date: account.created_at.date(),
            description: account.opening_description(),
            entries: opening_entries(&account.id, &obe.id, amount, entry_type),
        };
        self.engine.create_transaction(&account.book_id, draft).await
    }

    async fn ensure_name_free(
        &self,
        book_id: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> LedgerResult<()> {
        // System accounts participate in the check so user accounts cannot
        // shadow Opening Balance Equity
        let accounts = self.storage.list_accounts(book_id).await?;
        let clash = accounts
            .iter()
            .filter(|a| exclude_id != Some(a.id.as_str()))
            .any(|a| names_collide(&a.name, name));
        if clash {
            Err(LedgerError::Conflict(format!(
                "account named '{}' already exists in this book",
                name.trim()
            )))
        } else {
            Ok(())
        }
    }
}

/// The two legs of an opening-balance transaction: the account on its
/// declared side, Opening Balance Equity absorbing the offset.
pub(crate) fn opening_entries(
    account_id: &str,
    obe_account_id: &str,
    amount: &BigDecimal,
    entry_type: EntryType,
) -> Vec<Entry> {
    vec![
        Entry::new(account_id.to_string(), entry_type, amount.clone(), None),
        Entry::new(
            obe_account_id.to_string(),
            entry_type.inverse(),
            amount.clone(),
            None,
        ),
    ]
}

fn normalize_opening(amount: Option<BigDecimal>) -> LedgerResult<Option<BigDecimal>> {
    match amount {
        None => Ok(None),
        Some(amount) if amount < BigDecimal::from(0) => Err(LedgerError::Validation(
            "Opening balance cannot be negative".to_string(),
        )),
        Some(amount) if amount == BigDecimal::from(0) => Ok(None),
        Some(amount) => Ok(Some(amount)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::balance;
    use crate::utils::memory_storage::MemoryStorage;

    async fn seeded_registry() -> (AccountRegistry<MemoryStorage>, String) {
        let mut storage = MemoryStorage::new();
        let book = Book::new("Side".into());
        storage.save_book(&book).await.unwrap();
        storage.save_category(&Category::equity(&book.id)).await.unwrap();
        let obe = Account::opening_balance_equity(&book.id);
        storage.save_account(&obe).await.unwrap();

        let assets = Category::new(book.id.clone(), "Assets".into(), EntryType::Debit);
        storage.save_category(&assets).await.unwrap();

        let registry = AccountRegistry::new(storage);
        (registry, book.id)
    }

    fn bank_draft() -> AccountDraft {
        AccountDraft {
            name: "Bank".into(),
            category_id: String::new(),
            opening_balance: Some(BigDecimal::from(1000)),
            opening_balance_type: EntryType::Debit,
        }
    }

    async fn assets_category_id(
        registry: &AccountRegistry<MemoryStorage>,
        book_id: &str,
    ) -> String {
        registry
            .storage
            .list_categories(book_id)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Assets")
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn opening_balance_creates_exactly_one_paired_transaction() {
        let (mut registry, book_id) = seeded_registry().await;
        let mut draft = bank_draft();
        draft.category_id = assets_category_id(&registry, &book_id).await;

        let account = registry.create_account(&book_id, draft).await.unwrap();

        let transactions = registry.engine.list_transactions(&book_id).await.unwrap();
        assert_eq!(transactions.len(), 1);
        let opening = &transactions[0];
        assert_eq!(opening.description, "Opening Balance for Bank");
        assert_eq!(opening.entries.len(), 2);
        assert_eq!(opening.entries[0].account_id, account.id);
        assert_eq!(opening.entries[0].entry_type, EntryType::Debit);
        assert_eq!(opening.entries[0].amount, BigDecimal::from(1000));
        assert_eq!(
            opening.entries[1].account_id,
            opening_balance_equity_id(&book_id)
        );
        assert_eq!(opening.entries[1].entry_type, EntryType::Credit);

        assert_eq!(
            balance::account_balance(&account.id, &transactions),
            BigDecimal::from(1000)
        );
    }

    #[tokio::test]
    async fn zero_opening_balance_records_nothing() {
        let (mut registry, book_id) = seeded_registry().await;
        let category_id = assets_category_id(&registry, &book_id).await;

        registry
            .create_account(
                &book_id,
                AccountDraft {
                    name: "Wallet".into(),
                    category_id,
                    opening_balance: Some(BigDecimal::from(0)),
                    opening_balance_type: EntryType::Debit,
                },
            )
            .await
            .unwrap();

        assert!(registry.engine.list_transactions(&book_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_to_nonzero_replaces_the_opening_transaction_in_place() {
        let (mut registry, book_id) = seeded_registry().await;
        let mut draft = bank_draft();
        draft.category_id = assets_category_id(&registry, &book_id).await;
        let account = registry.create_account(&book_id, draft).await.unwrap();

        registry
            .update_account(
                &book_id,
                &account.id,
                AccountChanges {
                    opening_balance: Some(BigDecimal::from(750)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let transactions = registry.engine.list_transactions(&book_id).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].total_debits(), BigDecimal::from(750));
    }

    #[tokio::test]
    async fn update_to_zero_deletes_the_opening_transaction() {
        let (mut registry, book_id) = seeded_registry().await;
        let mut draft = bank_draft();
        draft.category_id = assets_category_id(&registry, &book_id).await;
        let account = registry.create_account(&book_id, draft).await.unwrap();

        let updated = registry
            .update_account(
                &book_id,
                &account.id,
                AccountChanges {
                    opening_balance: Some(BigDecimal::from(0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.opening_balance, None);
        assert!(registry.engine.list_transactions(&book_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn introducing_a_balance_on_update_creates_the_transaction() {
        let (mut registry, book_id) = seeded_registry().await;
        let category_id = assets_category_id(&registry, &book_id).await;
        let account = registry
            .create_account(
                &book_id,
                AccountDraft {
                    name: "Cash".into(),
                    category_id,
                    opening_balance: None,
                    opening_balance_type: EntryType::Debit,
                },
            )
            .await
            .unwrap();

        registry
            .update_account(
                &book_id,
                &account.id,
                AccountChanges {
                    opening_balance: Some(BigDecimal::from(40)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let transactions = registry.engine.list_transactions(&book_id).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Opening Balance for Cash");
    }

    #[tokio::test]
    async fn rename_rewrites_the_opening_description_only() {
        let (mut registry, book_id) = seeded_registry().await;
        let mut draft = bank_draft();
        draft.category_id = assets_category_id(&registry, &book_id).await;
        let account = registry.create_account(&book_id, draft).await.unwrap();

        registry
            .update_account(
                &book_id,
                &account.id,
                AccountChanges {
                    name: Some("Checking".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let transactions = registry.engine.list_transactions(&book_id).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Opening Balance for Checking");
        assert_eq!(transactions[0].total_debits(), BigDecimal::from(1000));
    }

    #[tokio::test]
    async fn rename_collision_is_a_conflict() {
        let (mut registry, book_id) = seeded_registry().await;
        let category_id = assets_category_id(&registry, &book_id).await;
        let mut draft = bank_draft();
        draft.category_id = category_id.clone();
        registry.create_account(&book_id, draft).await.unwrap();

        let other = registry
            .create_account(
                &book_id,
                AccountDraft {
                    name: "Cash".into(),
                    category_id,
                    opening_balance: None,
                    opening_balance_type: EntryType::Debit,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            registry
                .update_account(
                    &book_id,
                    &other.id,
                    AccountChanges {
                        name: Some("BANK".into()),
                        ..Default::default()
                    },
                )
                .await,
            Err(LedgerError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_allowed_only_with_opening_transaction() {
        let (mut registry, book_id) = seeded_registry().await;
        let mut draft = bank_draft();
        draft.category_id = assets_category_id(&registry, &book_id).await;
        let account = registry.create_account(&book_id, draft).await.unwrap();

        // A real transaction blocks deletion
        let obe_id = opening_balance_equity_id(&book_id);
        let real = registry
            .engine
            .create_transaction(
                &book_id,
                TransactionDraft {
                    date: chrono::Utc::now().date_naive(),
                    description: "Coffee".into(),
                    entries: vec![
                        Entry::credit(account.id.clone(), BigDecimal::from(5), None),
                        Entry::debit(obe_id, BigDecimal::from(5), None),
                    ],
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            registry.delete_account(&book_id, &account.id).await,
            Err(LedgerError::Invariant(_))
        ));

        registry.engine.delete_transaction(&book_id, &real.id).await.unwrap();

        // With only the opening transaction left, deletion succeeds and
        // removes that transaction too
        registry.delete_account(&book_id, &account.id).await.unwrap();
        assert!(registry.engine.list_transactions(&book_id).await.unwrap().is_empty());
        assert!(registry.list_accounts(&book_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn system_account_is_protected_and_unlisted() {
        let (mut registry, book_id) = seeded_registry().await;
        let obe_id = opening_balance_equity_id(&book_id);

        assert!(registry.list_accounts(&book_id).await.unwrap().is_empty());
        assert!(matches!(
            registry.delete_account(&book_id, &obe_id).await,
            Err(LedgerError::Protected(_))
        ));
    }
}
