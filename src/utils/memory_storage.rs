//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Cloning shares the underlying maps, so components holding clones of the
/// same instance see one consistent store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    books: Arc<RwLock<HashMap<String, Book>>>,
    categories: Arc<RwLock<HashMap<String, Category>>>,
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
    notes: Arc<RwLock<HashMap<String, Note>>>,
    recycled: Arc<RwLock<HashMap<String, RecycleBinItem>>>,
    /// Insertion order per entity id, used for creation-order tie-breaks
    sequence: Arc<RwLock<HashMap<String, u64>>>,
    counter: Arc<AtomicU64>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.books.write().unwrap().clear();
        self.categories.write().unwrap().clear();
        self.accounts.write().unwrap().clear();
        self.transactions.write().unwrap().clear();
        self.notes.write().unwrap().clear();
        self.recycled.write().unwrap().clear();
        self.sequence.write().unwrap().clear();
    }

    fn stamp(&self, id: &str) {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        self.sequence.write().unwrap().insert(id.to_string(), seq);
    }

    fn seq_of(&self, id: &str) -> u64 {
        self.sequence.read().unwrap().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl BookStorage for MemoryStorage {
    async fn save_book(&mut self, book: &Book) -> LedgerResult<()> {
        self.stamp(&book.id);
        self.books
            .write()
            .unwrap()
            .insert(book.id.clone(), book.clone());
        Ok(())
    }

    async fn get_book(&self, book_id: &str) -> LedgerResult<Option<Book>> {
        Ok(self.books.read().unwrap().get(book_id).cloned())
    }

    async fn list_books(&self) -> LedgerResult<Vec<Book>> {
        let mut books: Vec<Book> = self.books.read().unwrap().values().cloned().collect();
        books.sort_by_key(|b| self.seq_of(&b.id));
        Ok(books)
    }

    async fn update_book(&mut self, book: &Book) -> LedgerResult<()> {
        let mut books = self.books.write().unwrap();
        if books.contains_key(&book.id) {
            books.insert(book.id.clone(), book.clone());
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("book '{}'", book.id)))
        }
    }

    async fn delete_book(&mut self, book_id: &str) -> LedgerResult<()> {
        if self.books.write().unwrap().remove(book_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("book '{book_id}'")))
        }
    }

    async fn save_category(&mut self, category: &Category) -> LedgerResult<()> {
        self.stamp(&category.id);
        self.categories
            .write()
            .unwrap()
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn get_category(&self, category_id: &str) -> LedgerResult<Option<Category>> {
        Ok(self.categories.read().unwrap().get(category_id).cloned())
    }

    async fn list_categories(&self, book_id: &str) -> LedgerResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .read()
            .unwrap()
            .values()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect();
        categories.sort_by_key(|c| self.seq_of(&c.id));
        Ok(categories)
    }

    async fn update_category(&mut self, category: &Category) -> LedgerResult<()> {
        let mut categories = self.categories.write().unwrap();
        if categories.contains_key(&category.id) {
            categories.insert(category.id.clone(), category.clone());
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("category '{}'", category.id)))
        }
    }

    async fn delete_category(&mut self, category_id: &str) -> LedgerResult<()> {
        if self.categories.write().unwrap().remove(category_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("category '{category_id}'")))
        }
    }

    async fn save_account(&mut self, account: &Account) -> LedgerResult<()> {
        self.stamp(&account.id);
        self.accounts
            .write()
            .unwrap()
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(account_id).cloned())
    }

    async fn list_accounts(&self, book_id: &str) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .accounts
            .read()
            .unwrap()
            .values()
            .filter(|a| a.book_id == book_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| self.seq_of(&a.id));
        Ok(accounts)
    }

    async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&account.id) {
            accounts.insert(account.id.clone(), account.clone());
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("account '{}'", account.id)))
        }
    }

    async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        if self.accounts.write().unwrap().remove(account_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("account '{account_id}'")))
        }
    }

    async fn save_transaction(&mut self, transaction: &Transaction) -> LedgerResult<()> {
        self.stamp(&transaction.id);
        self.transactions
            .write()
            .unwrap()
            .insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .get(transaction_id)
            .cloned())
    }

    async fn list_transactions(&self, book_id: &str) -> LedgerResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .read()
            .unwrap()
            .values()
            .filter(|t| t.book_id == book_id)
            .cloned()
            .collect();
        // Date descending, newest insertion first within a date
        transactions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| self.seq_of(&b.id).cmp(&self.seq_of(&a.id)))
        });
        Ok(transactions)
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> LedgerResult<()> {
        let mut transactions = self.transactions.write().unwrap();
        if transactions.contains_key(&transaction.id) {
            transactions.insert(transaction.id.clone(), transaction.clone());
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!(
                "transaction '{}'",
                transaction.id
            )))
        }
    }

    async fn delete_transaction(&mut self, transaction_id: &str) -> LedgerResult<()> {
        if self
            .transactions
            .write()
            .unwrap()
            .remove(transaction_id)
            .is_some()
        {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!(
                "transaction '{transaction_id}'"
            )))
        }
    }

    async fn save_note(&mut self, note: &Note) -> LedgerResult<()> {
        self.stamp(&note.id);
        self.notes
            .write()
            .unwrap()
            .insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn get_note(&self, note_id: &str) -> LedgerResult<Option<Note>> {
        Ok(self.notes.read().unwrap().get(note_id).cloned())
    }

    async fn list_notes(&self, book_id: &str) -> LedgerResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .unwrap()
            .values()
            .filter(|n| n.book_id == book_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| self.seq_of(&n.id));
        Ok(notes)
    }

    async fn update_note(&mut self, note: &Note) -> LedgerResult<()> {
        let mut notes = self.notes.write().unwrap();
        if notes.contains_key(&note.id) {
            notes.insert(note.id.clone(), note.clone());
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("note '{}'", note.id)))
        }
    }

    async fn delete_note(&mut self, note_id: &str) -> LedgerResult<()> {
        if self.notes.write().unwrap().remove(note_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("note '{note_id}'")))
        }
    }

    async fn save_recycled(&mut self, item: &RecycleBinItem) -> LedgerResult<()> {
        self.stamp(&item.id);
        self.recycled
            .write()
            .unwrap()
            .insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get_recycled(&self, item_id: &str) -> LedgerResult<Option<RecycleBinItem>> {
        Ok(self.recycled.read().unwrap().get(item_id).cloned())
    }

    async fn list_recycled(&self) -> LedgerResult<Vec<RecycleBinItem>> {
        let mut items: Vec<RecycleBinItem> =
            self.recycled.read().unwrap().values().cloned().collect();
        items.sort_by(|a, b| self.seq_of(&b.id).cmp(&self.seq_of(&a.id)));
        Ok(items)
    }

    async fn delete_recycled(&mut self, item_id: &str) -> LedgerResult<()> {
        if self.recycled.write().unwrap().remove(item_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("recycle bin item '{item_id}'")))
        }
    }
}
