//! Traits for storage abstraction

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for the bookkeeping system
///
/// This trait allows the core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
/// Each method is atomic per entity; the trait makes no cross-entity
/// transaction guarantee, and the domain layer does not assume one.
#[async_trait]
pub trait BookStorage: Send + Sync {
    // Books

    /// Save a book to storage
    async fn save_book(&mut self, book: &Book) -> LedgerResult<()>;

    /// Get a book by ID
    async fn get_book(&self, book_id: &str) -> LedgerResult<Option<Book>>;

    /// List all books, oldest first
    async fn list_books(&self) -> LedgerResult<Vec<Book>>;

    /// Update a book
    async fn update_book(&mut self, book: &Book) -> LedgerResult<()>;

    /// Delete a book
    async fn delete_book(&mut self, book_id: &str) -> LedgerResult<()>;

    // Categories

    /// Save a category to storage
    async fn save_category(&mut self, category: &Category) -> LedgerResult<()>;

    /// Get a category by ID
    async fn get_category(&self, category_id: &str) -> LedgerResult<Option<Category>>;

    /// List all categories belonging to a book
    async fn list_categories(&self, book_id: &str) -> LedgerResult<Vec<Category>>;

    /// Update a category
    async fn update_category(&mut self, category: &Category) -> LedgerResult<()>;

    /// Delete a category
    async fn delete_category(&mut self, category_id: &str) -> LedgerResult<()>;

    // Accounts

    /// Save an account to storage
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>>;

    /// List all accounts belonging to a book, system accounts included
    async fn list_accounts(&self, book_id: &str) -> LedgerResult<Vec<Account>>;

    /// Update an account
    async fn update_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Delete an account
    async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()>;

    // Transactions

    /// Save a transaction (header and entries as one value)
    async fn save_transaction(&mut self, transaction: &Transaction) -> LedgerResult<()>;

    /// Get a transaction by ID
    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>>;

    /// List a book's transactions, date descending with creation-order
    /// tie-break (newest first)
    async fn list_transactions(&self, book_id: &str) -> LedgerResult<Vec<Transaction>>;

    /// Update a transaction
    async fn update_transaction(&mut self, transaction: &Transaction) -> LedgerResult<()>;

    /// Delete a transaction
    async fn delete_transaction(&mut self, transaction_id: &str) -> LedgerResult<()>;

    // Notes

    /// Save a note to storage
    async fn save_note(&mut self, note: &Note) -> LedgerResult<()>;

    /// Get a note by ID
    async fn get_note(&self, note_id: &str) -> LedgerResult<Option<Note>>;

    /// List a book's notes, oldest first
    async fn list_notes(&self, book_id: &str) -> LedgerResult<Vec<Note>>;

    /// Update a note
    async fn update_note(&mut self, note: &Note) -> LedgerResult<()>;

    /// Delete a note
    async fn delete_note(&mut self, note_id: &str) -> LedgerResult<()>;

    // Recycle bin

    /// Save a recycle-bin item
    async fn save_recycled(&mut self, item: &RecycleBinItem) -> LedgerResult<()>;

    /// Get a recycle-bin item by its bin id
    async fn get_recycled(&self, item_id: &str) -> LedgerResult<Option<RecycleBinItem>>;

    /// List all recycle-bin items, newest deletions first
    async fn list_recycled(&self) -> LedgerResult<Vec<RecycleBinItem>>;

    /// Remove a recycle-bin item
    async fn delete_recycled(&mut self, item_id: &str) -> LedgerResult<()>;
}
