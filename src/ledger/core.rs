//! Main facade orchestrating books, accounts, transactions, and transfers

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::ledger::account::{AccountChanges, AccountDraft, AccountRegistry};
use crate::ledger::balance::{self, AccountLedger};
use crate::ledger::book::BookRegistry;
use crate::ledger::category::CategoryStore;
use crate::ledger::note::NoteStore;
use crate::ledger::recycle::RecycleBin;
use crate::ledger::transaction::LedgerEngine;
use crate::ledger::transfer::TransferCoordinator;
use crate::traits::*;
use crate::types::*;

/// Top-level bookkeeping system over a storage backend
///
/// Every operation takes the owning book's id explicitly; there is no
/// ambient "current book". Components share one storage handle, so a
/// Clone implementation is expected to share underlying state.
pub struct Bookkeeper<S: BookStorage> {
    books: BookRegistry<S>,
    categories: CategoryStore<S>,
    accounts: AccountRegistry<S>,
    engine: LedgerEngine<S>,
    transfers: TransferCoordinator<S>,
    bin: RecycleBin<S>,
    notes: NoteStore<S>,
    storage: S,
}

impl<S: BookStorage + Clone> Bookkeeper<S> {
    /// Create a new bookkeeper with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            books: BookRegistry::new(storage.clone()),
            categories: CategoryStore::new(storage.clone()),
            accounts: AccountRegistry::new(storage.clone()),
            engine: LedgerEngine::new(storage.clone()),
            transfers: TransferCoordinator::new(storage.clone()),
            bin: RecycleBin::new(storage.clone()),
            notes: NoteStore::new(storage.clone()),
            storage,
        }
    }

    // Book operations

    /// List all books, seeding the default book on first use
    pub async fn list_books(&mut self) -> LedgerResult<Vec<Book>> {
        self.books.list_books().await
    }

    /// Get a book by id
    pub async fn get_book(&self, book_id: &str) -> LedgerResult<Book> {
        self.books.get_book_required(book_id).await
    }

    /// Create a book, seeded with its system category and account
    pub async fn create_book(&mut self, name: &str) -> LedgerResult<Book> {
        self.books.create_book(name).await
    }

    /// Rename a book
    pub async fn rename_book(&mut self, book_id: &str, name: &str) -> LedgerResult<Book> {
        self.books.rename_book(book_id, name).await
    }

    /// Delete a book and everything in it, through the recycle bin
    pub async fn delete_book(&mut self, book_id: &str) -> LedgerResult<Vec<RecycleBinItem>> {
        self.books.delete_book(book_id).await
    }

    // Category operations

    /// List a book's categories
    pub async fn list_categories(&self, book_id: &str) -> LedgerResult<Vec<Category>> {
        self.categories.list_categories(book_id).await
    }

    /// Create a category with its normal balance side
    pub async fn create_category(
        &mut self,
        book_id: &str,
        name: &str,
        normal_balance: EntryType,
    ) -> LedgerResult<Category> {
        self.categories.create_category(book_id, name, normal_balance).await
    }

    /// Rename a category
    pub async fn rename_category(
        &mut self,
        book_id: &str,
        category_id: &str,
        name: &str,
    ) -> LedgerResult<Category> {
        self.categories.rename_category(book_id, category_id, name).await
    }

    /// Delete an empty category, through the recycle bin
    pub async fn delete_category(
        &mut self,
        book_id: &str,
        category_id: &str,
    ) -> LedgerResult<RecycleBinItem> {
        self.categories.delete_category(book_id, category_id).await
    }

    // Account operations

    /// List a book's accounts (system accounts excluded)
    pub async fn list_accounts(&self, book_id: &str) -> LedgerResult<Vec<Account>> {
        self.accounts.list_accounts(book_id).await
    }

    /// Get an account by id
    pub async fn get_account(&self, book_id: &str, account_id: &str) -> LedgerResult<Account> {
        self.accounts.get_account_required(book_id, account_id).await
    }

    /// Create an account, recording its opening-balance transaction if one
    /// is declared
    pub async fn create_account(
        &mut self,
        book_id: &str,
        draft: AccountDraft,
    ) -> LedgerResult<Account> {
        self.accounts.create_account(book_id, draft).await
    }

    /// Update an account, keeping its opening transaction in step
    pub async fn update_account(
        &mut self,
        book_id: &str,
        account_id: &str,
        changes: AccountChanges,
    ) -> LedgerResult<Account> {
        self.accounts.update_account(book_id, account_id, changes).await
    }

    /// Delete an account whose only activity is its opening transaction
    pub async fn delete_account(
        &mut self,
        book_id: &str,
        account_id: &str,
    ) -> LedgerResult<RecycleBinItem> {
        self.accounts.delete_account(book_id, account_id).await
    }

    // Transaction operations

    /// List a book's transactions, newest first
    pub async fn list_transactions(&self, book_id: &str) -> LedgerResult<Vec<Transaction>> {
        self.engine.list_transactions(book_id).await
    }

    /// Get a transaction by id
    pub async fn get_transaction(
        &self,
        book_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<Transaction> {
        self.engine.get_transaction_required(book_id, transaction_id).await
    }

    /// Record a transaction
    pub async fn create_transaction(
        &mut self,
        book_id: &str,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        self.engine.create_transaction(book_id, draft).await
    }

    /// Replace a transaction wholesale
    pub async fn update_transaction(
        &mut self,
        book_id: &str,
        transaction_id: &str,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        self.engine.update_transaction(book_id, transaction_id, draft).await
    }

    /// Tag or clear a transaction's highlight
    pub async fn set_highlight(
        &mut self,
        book_id: &str,
        transaction_id: &str,
        highlight: Option<Highlight>,
    ) -> LedgerResult<Transaction> {
        self.engine.set_highlight(book_id, transaction_id, highlight).await
    }

    /// Soft-delete a transaction
    pub async fn delete_transaction(
        &mut self,
        book_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<RecycleBinItem> {
        self.engine.delete_transaction(book_id, transaction_id).await
    }

    /// Soft-delete a batch of transactions; a missing id fails the whole
    /// batch before anything is written
    pub async fn delete_transactions(
        &mut self,
        book_id: &str,
        transaction_ids: &[String],
    ) -> LedgerResult<Vec<RecycleBinItem>> {
        self.engine.delete_many(book_id, transaction_ids).await
    }

    // Balance projections

    /// Raw balance of an account (debit-positive)
    pub async fn account_balance(
        &self,
        book_id: &str,
        account_id: &str,
    ) -> LedgerResult<BigDecimal> {
        self.accounts.get_account_required(book_id, account_id).await?;
        let transactions = self.engine.list_transactions(book_id).await?;
        Ok(balance::account_balance(account_id, &transactions))
    }

    /// Balance of an account projected onto its category's normal side
    pub async fn normalized_account_balance(
        &self,
        book_id: &str,
        account_id: &str,
    ) -> LedgerResult<BigDecimal> {
        let account = self.accounts.get_account_required(book_id, account_id).await?;
        let category = self
            .categories
            .get_category_required(book_id, &account.category_id)
            .await?;
        let transactions = self.engine.list_transactions(book_id).await?;
        let raw = balance::account_balance(account_id, &transactions);
        Ok(balance::normalized_balance(&raw, category.normal_balance))
    }

    /// Running ledger of an account, optionally from a range start
    pub async fn account_ledger(
        &self,
        book_id: &str,
        account_id: &str,
        from: Option<NaiveDate>,
    ) -> LedgerResult<AccountLedger> {
        let account = self.accounts.get_account_required(book_id, account_id).await?;
        let category = self
            .categories
            .get_category_required(book_id, &account.category_id)
            .await?;
        let transactions = self.engine.list_transactions(book_id).await?;
        Ok(balance::account_ledger(
            &account,
            category.normal_balance,
            &transactions,
            from,
        ))
    }

    /// Sum of the normalized balances of a category's accounts
    pub async fn category_total(
        &self,
        book_id: &str,
        category_id: &str,
    ) -> LedgerResult<BigDecimal> {
        let category = self
            .categories
            .get_category_required(book_id, category_id)
            .await?;
        let accounts = self.storage.list_accounts(book_id).await?;
        let transactions = self.engine.list_transactions(book_id).await?;
        Ok(balance::category_total(&category, &accounts, &transactions))
    }

    // Transfers

    /// Re-establish an account's opening balance in another book
    pub async fn transfer_opening_balance(
        &mut self,
        source_book_id: &str,
        target_book_id: &str,
        source_account_id: &str,
        amount: BigDecimal,
        entry_type: EntryType,
    ) -> LedgerResult<Transaction> {
        self.transfers
            .transfer_opening_balance(
                source_book_id,
                target_book_id,
                source_account_id,
                amount,
                entry_type,
            )
            .await
    }

    /// Move a balance from one book to another
    pub async fn transfer_balance(
        &mut self,
        source_book_id: &str,
        target_book_id: &str,
        source_account_id: &str,
        amount: BigDecimal,
        entry_type: EntryType,
        target_account_id: Option<&str>,
    ) -> LedgerResult<(Transaction, Transaction)> {
        self.transfers
            .transfer_balance(
                source_book_id,
                target_book_id,
                source_account_id,
                amount,
                entry_type,
                target_account_id,
            )
            .await
    }

    // Recycle bin

    /// List recycle-bin items, newest deletions first
    pub async fn list_recycle_bin(&self) -> LedgerResult<Vec<RecycleBinItem>> {
        self.bin.list_items().await
    }

    /// Restore a soft-deleted entity to its owning store
    pub async fn restore(&mut self, item_id: &str) -> LedgerResult<RecycledEntity> {
        self.bin.restore(item_id).await
    }

    /// Permanently remove a recycle-bin entry
    pub async fn purge(&mut self, item_id: &str) -> LedgerResult<()> {
        self.bin.purge(item_id).await
    }

    // Notes

    /// List a book's notes, oldest first
    pub async fn list_notes(&self, book_id: &str) -> LedgerResult<Vec<Note>> {
        self.notes.list_notes(book_id).await
    }

    /// Create a note
    pub async fn create_note(&mut self, book_id: &str, text: &str) -> LedgerResult<Note> {
        self.notes.create_note(book_id, text).await
    }

    /// Replace a note's text
    pub async fn update_note(
        &mut self,
        book_id: &str,
        note_id: &str,
        text: &str,
    ) -> LedgerResult<Note> {
        self.notes.update_note(book_id, note_id, text).await
    }

    /// Flip a note's completion state
    pub async fn toggle_note(&mut self, book_id: &str, note_id: &str) -> LedgerResult<Note> {
        self.notes.toggle_note(book_id, note_id).await
    }

    /// Delete a note permanently
    pub async fn delete_note(&mut self, book_id: &str, note_id: &str) -> LedgerResult<()> {
        self.notes.delete_note(book_id, note_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn basic_bookkeeping_flow() {
        let mut keeper = Bookkeeper::new(MemoryStorage::new());

        let books = keeper.list_books().await.unwrap();
        assert_eq!(books[0].id, DEFAULT_BOOK_ID);

        let expenses = keeper
            .create_category(DEFAULT_BOOK_ID, "Expenses", EntryType::Debit)
            .await
            .unwrap();
        let assets = keeper
            .create_category(DEFAULT_BOOK_ID, "Assets", EntryType::Debit)
            .await
            .unwrap();

        let bank = keeper
            .create_account(
                DEFAULT_BOOK_ID,
                AccountDraft {
                    name: "Bank".into(),
                    category_id: assets.id.clone(),
                    opening_balance: Some(BigDecimal::from(1000)),
                    opening_balance_type: EntryType::Debit,
                },
            )
            .await
            .unwrap();
        let rent = keeper
            .create_account(
                DEFAULT_BOOK_ID,
                AccountDraft {
                    name: "Rent".into(),
                    category_id: expenses.id,
                    opening_balance: None,
                    opening_balance_type: EntryType::Debit,
                },
            )
            .await
            .unwrap();

        keeper
            .create_transaction(
                DEFAULT_BOOK_ID,
                TransactionDraft {
                    date: chrono::Utc::now().date_naive(),
                    description: "May rent".into(),
                    entries: vec![
                        Entry::debit(rent.id.clone(), BigDecimal::from(400), None),
                        Entry::credit(bank.id.clone(), BigDecimal::from(400), None),
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(
            keeper.account_balance(DEFAULT_BOOK_ID, &bank.id).await.unwrap(),
            BigDecimal::from(600)
        );
        assert_eq!(
            keeper.category_total(DEFAULT_BOOK_ID, &assets.id).await.unwrap(),
            BigDecimal::from(600)
        );

        let ledger = keeper
            .account_ledger(DEFAULT_BOOK_ID, &bank.id, None)
            .await
            .unwrap();
        assert_eq!(ledger.opening_balance, BigDecimal::from(1000));
        assert_eq!(ledger.closing_balance(), BigDecimal::from(600));
    }
}
