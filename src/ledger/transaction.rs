//! Transaction recording, validation, and lifecycle

use tracing::debug;

use crate::ledger::recycle::RecycleBin;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_description;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

/// Ledger engine handling transaction CRUD for a book
///
/// Transactions are persisted as a single value (header and entries
/// together), so creating or replacing one is atomic at the storage level.
/// Deletions route through the recycle bin.
pub struct LedgerEngine<S: BookStorage> {
    storage: S,
    bin: RecycleBin<S>,
}

impl<S: BookStorage + Clone> LedgerEngine<S> {
    /// Create a new ledger engine over the given storage
    pub fn new(storage: S) -> Self {
        Self {
            bin: RecycleBin::new(storage.clone()),
            storage,
        }
    }

    /// List a book's transactions, date descending, newest first within a date
    pub async fn list_transactions(&self, book_id: &str) -> LedgerResult<Vec<Transaction>> {
        self.storage.list_transactions(book_id).await
    }

    /// Get a transaction by id within a book, failing if absent
    pub async fn get_transaction_required(
        &self,
        book_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<Transaction> {
        match self.storage.get_transaction(transaction_id).await? {
            Some(txn) if txn.book_id == book_id => Ok(txn),
            _ => Err(LedgerError::NotFound(format!(
                "transaction '{transaction_id}' in book '{book_id}'"
            ))),
        }
    }

    /// Find a book's transaction by exact description, if any.
    /// Used by the opening-balance machinery, which keys its paired
    /// transaction on a sentinel description.
    pub async fn find_by_description(
        &self,
        book_id: &str,
        description: &str,
    ) -> LedgerResult<Option<Transaction>> {
        let transactions = self.storage.list_transactions(book_id).await?;
        Ok(transactions
            .into_iter()
            .find(|t| t.description == description))
    }

    /// Record a new transaction. Validation happens before any write; the
    /// persisted entity is returned with its assigned id.
    pub async fn create_transaction(
        &mut self,
        book_id: &str,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        validate_description(&draft.description)?;

        let mut transaction = Transaction::new(book_id.to_string(), draft.date, draft.description);
        transaction.entries = draft.entries;
        transaction.validate()?;

        self.storage.save_transaction(&transaction).await?;
        debug!(book_id, id = %transaction.id, "recorded transaction");
        Ok(transaction)
    }

    /// Replace a transaction's date, description, and entries wholesale.
    /// No partial patch: the draft's entries become the entire entry set.
    pub async fn update_transaction(
        &mut self,
        book_id: &str,
        transaction_id: &str,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        let mut transaction = self.get_transaction_required(book_id, transaction_id).await?;
        validate_description(&draft.description)?;

        transaction.date = draft.date;
        transaction.description = draft.description;
        transaction.entries = draft.entries;
        transaction.updated_at = chrono::Utc::now().naive_utc();
        transaction.validate()?;

        self.storage.update_transaction(&transaction).await?;
        Ok(transaction)
    }

    /// Tag or clear a transaction's listing highlight. Existence is the only
    /// check; entries are untouched.
    pub async fn set_highlight(
        &mut self,
        book_id: &str,
        transaction_id: &str,
        highlight: Option<Highlight>,
    ) -> LedgerResult<Transaction> {
        let mut transaction = self.get_transaction_required(book_id, transaction_id).await?;
        transaction.highlight = highlight;
        transaction.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_transaction(&transaction).await?;
        Ok(transaction)
    }

    /// Soft-delete a transaction: snapshot to the recycle bin, then remove
    /// from primary storage
    pub async fn delete_transaction(
        &mut self,
        book_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<RecycleBinItem> {
        let transaction = self.get_transaction_required(book_id, transaction_id).await?;
        let item = self
            .bin
            .soft_delete(RecycledEntity::Transaction(transaction))
            .await?;
        self.storage.delete_transaction(transaction_id).await?;
        Ok(item)
    }

    /// Soft-delete a batch of transactions. Every id is verified up front;
    /// a missing one fails the whole batch before anything is written.
    pub async fn delete_many(
        &mut self,
        book_id: &str,
        transaction_ids: &[String],
    ) -> LedgerResult<Vec<RecycleBinItem>> {
        let mut transactions = Vec::with_capacity(transaction_ids.len());
        for id in transaction_ids {
            transactions.push(self.get_transaction_required(book_id, id).await?);
        }

        let mut items = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let id = transaction.id.clone();
            items.push(
                self.bin
                    .soft_delete(RecycledEntity::Transaction(transaction))
                    .await?,
            );
            self.storage.delete_transaction(&id).await?;
        }
        Ok(items)
    }
}

/// Builder for assembling balanced transactions
#[derive(Debug)]
pub struct TransactionBuilder {
    transaction: Transaction,
}

impl TransactionBuilder {
    /// Start a transaction in the given book
    pub fn new(book_id: String, date: NaiveDate, description: String) -> Self {
        Self {
            transaction: Transaction::new(book_id, date, description),
        }
    }

    /// Add a debit entry
    pub fn debit(
        mut self,
        account_id: String,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        self.transaction
            .add_entry(Entry::debit(account_id, amount, description));
        self
    }

    /// Add a credit entry
    pub fn credit(
        mut self,
        account_id: String,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        self.transaction
            .add_entry(Entry::credit(account_id, amount, description));
        self
    }

    /// Add a custom entry
    pub fn entry(mut self, entry: Entry) -> Self {
        self.transaction.add_entry(entry);
        self
    }

    /// Set a listing highlight
    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.transaction.highlight = Some(highlight);
        self
    }

    /// Validate and produce the transaction
    pub fn build(self) -> LedgerResult<Transaction> {
        self.transaction.validate()?;
        Ok(self.transaction)
    }

    /// Produce the draft form, for the engine's create/update operations
    pub fn build_draft(self) -> LedgerResult<TransactionDraft> {
        self.transaction.validate()?;
        Ok(TransactionDraft {
            date: self.transaction.date,
            description: self.transaction.description,
            entries: self.transaction.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn draft(date: NaiveDate, description: &str, amount: i64) -> TransactionDraft {
        TransactionDraft {
            date,
            description: description.to_string(),
            entries: vec![
                Entry::debit("a1".into(), BigDecimal::from(amount), None),
                Entry::credit("a2".into(), BigDecimal::from(amount), None),
            ],
        }
    }

    #[tokio::test]
    async fn create_persists_exactly_what_was_written() {
        let mut engine = LedgerEngine::new(MemoryStorage::new());
        let txn = engine
            .create_transaction("b1", draft(day(3), "Rent", 800))
            .await
            .unwrap();

        let read = engine.get_transaction_required("b1", &txn.id).await.unwrap();
        assert_eq!(read.entries, txn.entries);
        assert_eq!(read.description, "Rent");
    }

    #[tokio::test]
    async fn invalid_draft_persists_nothing() {
        let mut engine = LedgerEngine::new(MemoryStorage::new());
        let bad = TransactionDraft {
            date: day(1),
            description: "Lopsided".into(),
            entries: vec![Entry::debit("a1".into(), BigDecimal::from(10), None)],
        };
        assert!(matches!(
            engine.create_transaction("b1", bad).await,
            Err(LedgerError::Validation(_))
        ));
        assert!(engine.list_transactions("b1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_is_date_descending_with_creation_tiebreak() {
        let mut engine = LedgerEngine::new(MemoryStorage::new());
        let older = engine
            .create_transaction("b1", draft(day(1), "First", 10))
            .await
            .unwrap();
        let tied_early = engine
            .create_transaction("b1", draft(day(5), "Tied early", 10))
            .await
            .unwrap();
        let tied_late = engine
            .create_transaction("b1", draft(day(5), "Tied late", 10))
            .await
            .unwrap();

        let listed = engine.list_transactions("b1").await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![&tied_late.id, &tied_early.id, &older.id]);
    }

    #[tokio::test]
    async fn update_is_a_full_entry_replacement() {
        let mut engine = LedgerEngine::new(MemoryStorage::new());
        let txn = engine
            .create_transaction("b1", draft(day(2), "Utilities", 120))
            .await
            .unwrap();

        let replaced = engine
            .update_transaction("b1", &txn.id, draft(day(4), "Utilities (corrected)", 95))
            .await
            .unwrap();
        assert_eq!(replaced.entries.len(), 2);
        assert_eq!(replaced.total_debits(), BigDecimal::from(95));
        assert_eq!(replaced.description, "Utilities (corrected)");
    }

    #[tokio::test]
    async fn update_in_wrong_book_is_not_found() {
        let mut engine = LedgerEngine::new(MemoryStorage::new());
        let txn = engine
            .create_transaction("b1", draft(day(2), "Groceries", 40))
            .await
            .unwrap();
        assert!(matches!(
            engine
                .update_transaction("b2", &txn.id, draft(day(2), "Groceries", 40))
                .await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn highlight_toggles_without_touching_entries() {
        let mut engine = LedgerEngine::new(MemoryStorage::new());
        let txn = engine
            .create_transaction("b1", draft(day(2), "Fuel", 60))
            .await
            .unwrap();

        let tagged = engine
            .set_highlight("b1", &txn.id, Some(Highlight::Yellow))
            .await
            .unwrap();
        assert_eq!(tagged.highlight, Some(Highlight::Yellow));
        assert_eq!(tagged.entries, txn.entries);

        let cleared = engine.set_highlight("b1", &txn.id, None).await.unwrap();
        assert_eq!(cleared.highlight, None);
    }

    #[tokio::test]
    async fn delete_many_with_a_missing_id_applies_nothing() {
        let storage = MemoryStorage::new();
        let mut engine = LedgerEngine::new(storage);
        let a = engine
            .create_transaction("b1", draft(day(1), "Keep me", 10))
            .await
            .unwrap();

        let result = engine
            .delete_many("b1", &[a.id.clone(), "txn_missing".to_string()])
            .await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));

        // Whole batch rejected: the existing transaction survived
        assert_eq!(engine.list_transactions("b1").await.unwrap().len(), 1);
    }
}
