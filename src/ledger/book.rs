//! Book management: independent ledgers with seeded system entities

use tracing::{debug, warn};

use crate::ledger::recycle::RecycleBin;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_name;

/// Registry of ledger books
///
/// Every book is seeded with a system Equity category and an Opening Balance
/// Equity account at creation. The default book is seeded lazily the first
/// time the registry is queried against empty storage, and can never be
/// deleted.
pub struct BookRegistry<S: BookStorage> {
    storage: S,
    bin: RecycleBin<S>,
}

impl<S: BookStorage + Clone> BookRegistry<S> {
    /// Create a new book registry over the given storage
    pub fn new(storage: S) -> Self {
        Self {
            bin: RecycleBin::new(storage.clone()),
            storage,
        }
    }

    /// List all books, seeding the default book first when storage is empty
    pub async fn list_books(&mut self) -> LedgerResult<Vec<Book>> {
        let books = self.storage.list_books().await?;
        if !books.is_empty() {
            return Ok(books);
        }

        debug!("empty storage, seeding default book");
        let default = Book::default_book();
        self.seed_book(&default).await?;
        Ok(vec![default])
    }

    /// Get a book by id, failing if absent
    pub async fn get_book_required(&self, book_id: &str) -> LedgerResult<Book> {
        self.storage
            .get_book(book_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("book '{book_id}'")))
    }

    /// Create a book and seed its system category and account
    pub async fn create_book(&mut self, name: &str) -> LedgerResult<Book> {
        validate_name(name)?;
        let book = Book::new(name.trim().to_string());
        self.seed_book(&book).await?;
        Ok(book)
    }

    /// Rename a book
    pub async fn rename_book(&mut self, book_id: &str, name: &str) -> LedgerResult<Book> {
        validate_name(name)?;
        let mut book = self.get_book_required(book_id).await?;
        book.name = name.trim().to_string();
        self.storage.update_book(&book).await?;
        Ok(book)
    }

    /// Delete a book and everything in it.
    ///
    /// The book plus all of its categories, accounts, and transactions are
    /// snapshotted into the recycle bin as one batch before anything is
    /// removed from primary storage, so a failure partway through the
    /// removals never loses data. The removals themselves are an ordered,
    /// non-atomic sequence.
    pub async fn delete_book(&mut self, book_id: &str) -> LedgerResult<Vec<RecycleBinItem>> {
        if book_id == DEFAULT_BOOK_ID {
            return Err(LedgerError::Protected(
                "the default book cannot be deleted".to_string(),
            ));
        }
        let book = self.get_book_required(book_id).await?;

        let categories = self.storage.list_categories(book_id).await?;
        let accounts = self.storage.list_accounts(book_id).await?;
        let transactions = self.storage.list_transactions(book_id).await?;

        let mut batch = Vec::with_capacity(1 + categories.len() + accounts.len() + transactions.len());
        batch.push(RecycledEntity::Book(book));
        batch.extend(categories.iter().cloned().map(RecycledEntity::Category));
        batch.extend(accounts.iter().cloned().map(RecycledEntity::Account));
        batch.extend(transactions.iter().cloned().map(RecycledEntity::Transaction));
        let items = self.bin.soft_delete_batch(batch).await?;

        for transaction in &transactions {
            check_step(
                self.storage.delete_transaction(&transaction.id).await,
                "transaction",
                &transaction.id,
            )?;
        }
        for account in &accounts {
            check_step(
                self.storage.delete_account(&account.id).await,
                "account",
                &account.id,
            )?;
        }
        for category in &categories {
            check_step(
                self.storage.delete_category(&category.id).await,
                "category",
                &category.id,
            )?;
        }
        check_step(self.storage.delete_book(book_id).await, "book", book_id)?;

        Ok(items)
    }

    async fn seed_book(&mut self, book: &Book) -> LedgerResult<()> {
        self.storage.save_book(book).await?;
        self.storage.save_category(&Category::equity(&book.id)).await?;
        self.storage
            .save_account(&Account::opening_balance_equity(&book.id))
            .await?;
        debug!(book_id = %book.id, name = %book.name, "seeded book");
        Ok(())
    }
}

fn check_step(result: LedgerResult<()>, kind: &str, id: &str) -> LedgerResult<()> {
    if let Err(err) = &result {
        warn!(kind, id, %err, "cascade delete stopped partway; remaining entities stay recoverable in the recycle bin");
    }
    result
}
