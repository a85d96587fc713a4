//! Core types and data structures for the bookkeeping system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the default book that always exists and cannot be deleted.
pub const DEFAULT_BOOK_ID: &str = "book_default";

/// Name given to the default book when it is first seeded.
pub const DEFAULT_BOOK_NAME: &str = "Personal";

/// Name of the system category seeded into every book.
pub const EQUITY_CATEGORY_NAME: &str = "Equity";

/// Name of the system account absorbing opening-balance offsets.
pub const OPENING_BALANCE_EQUITY_NAME: &str = "Opening Balance Equity";

/// Deterministic id of a book's system equity category.
pub fn equity_category_id(book_id: &str) -> String {
    format!("cat_equity_{book_id}")
}

/// Deterministic id of a book's Opening Balance Equity account.
pub fn opening_balance_equity_id(book_id: &str) -> String {
    format!("acc_opening_balance_equity_{book_id}")
}

/// Tolerance within which a transaction's debit and credit totals must agree.
pub fn balance_tolerance() -> BigDecimal {
    BigDecimal::new(1.into(), 2)
}

/// Types of entries in double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry - the left side of the ledger
    Debit,
    /// Credit entry - the right side of the ledger
    Credit,
}

impl EntryType {
    /// Returns the opposite side, used for the balancing leg of a pair.
    pub fn inverse(self) -> EntryType {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }

    /// Short display label ("Dr" / "Cr").
    pub fn label(self) -> &'static str {
        match self {
            EntryType::Debit => "Dr",
            EntryType::Credit => "Cr",
        }
    }
}

/// An independent ledger: its own categories, accounts, and transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: String,
    /// Human-readable book name
    pub name: String,
    /// When the book was created
    pub created_at: NaiveDateTime,
}

impl Book {
    /// Create a new user book with a generated id
    pub fn new(name: String) -> Self {
        Self {
            id: format!("book_{}", Uuid::new_v4()),
            name,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// The default book seeded on first use
    pub fn default_book() -> Self {
        Self {
            id: DEFAULT_BOOK_ID.to_string(),
            name: DEFAULT_BOOK_NAME.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Whether this is the protected default book
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_BOOK_ID
    }
}

/// A named group of accounts within a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for the category
    pub id: String,
    /// Category name, unique per book (case-insensitive)
    pub name: String,
    /// Owning book
    pub book_id: String,
    /// Which side this category's accounts are conventionally positive on
    pub normal_balance: EntryType,
    /// Set for system-seeded categories, which cannot be deleted
    pub is_system: bool,
    /// When the category was created
    pub created_at: NaiveDateTime,
}

impl Category {
    /// Create a new user category with a generated id
    pub fn new(book_id: String, name: String, normal_balance: EntryType) -> Self {
        Self {
            id: format!("cat_{}", Uuid::new_v4()),
            name,
            book_id,
            normal_balance,
            is_system: false,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// The system "Equity" category seeded into every book
    pub fn equity(book_id: &str) -> Self {
        Self {
            id: equity_category_id(book_id),
            name: EQUITY_CATEGORY_NAME.to_string(),
            book_id: book_id.to_string(),
            normal_balance: EntryType::Credit,
            is_system: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// An account within a book's chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Account name, unique per book (case-insensitive)
    pub name: String,
    /// Owning book
    pub book_id: String,
    /// Category the account belongs to
    pub category_id: String,
    /// Declared opening balance, if any
    pub opening_balance: Option<BigDecimal>,
    /// Side of the opening balance
    pub opening_balance_type: EntryType,
    /// Set for system-seeded accounts, which cannot be deleted or listed
    pub is_system: bool,
    /// When the account was created
    pub created_at: NaiveDateTime,
}

impl Account {
    /// Create a new user account with a generated id
    pub fn new(
        book_id: String,
        category_id: String,
        name: String,
        opening_balance: Option<BigDecimal>,
        opening_balance_type: EntryType,
    ) -> Self {
        Self {
            id: format!("acc_{}", Uuid::new_v4()),
            name,
            book_id,
            category_id,
            opening_balance,
            opening_balance_type,
            is_system: false,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// The system "Opening Balance Equity" account seeded into every book
    pub fn opening_balance_equity(book_id: &str) -> Self {
        Self {
            id: opening_balance_equity_id(book_id),
            name: OPENING_BALANCE_EQUITY_NAME.to_string(),
            book_id: book_id.to_string(),
            category_id: equity_category_id(book_id),
            opening_balance: None,
            opening_balance_type: EntryType::Credit,
            is_system: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Description used on an account's opening-balance transaction.
    /// The account update path keeps this in sync on rename.
    pub fn opening_description_for(name: &str) -> String {
        format!("Opening Balance for {name}")
    }

    /// Opening-transaction description for this account's current name
    pub fn opening_description(&self) -> String {
        Self::opening_description_for(&self.name)
    }
}

/// Individual entry within a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Account being affected
    pub account_id: String,
    /// Type of entry (Debit or Credit)
    pub entry_type: EntryType,
    /// Amount of the entry, always positive
    pub amount: BigDecimal,
    /// Optional description for this specific entry
    pub description: Option<String>,
}

impl Entry {
    /// Create a new entry
    pub fn new(
        account_id: String,
        entry_type: EntryType,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        Self {
            account_id,
            entry_type,
            amount,
            description,
        }
    }

    /// Create a debit entry
    pub fn debit(account_id: String, amount: BigDecimal, description: Option<String>) -> Self {
        Self::new(account_id, EntryType::Debit, amount, description)
    }

    /// Create a credit entry
    pub fn credit(account_id: String, amount: BigDecimal, description: Option<String>) -> Self {
        Self::new(account_id, EntryType::Credit, amount, description)
    }
}

/// Visual highlight a transaction can carry in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Yellow,
    Blue,
    Strikethrough,
}

/// Complete double-entry transaction with multiple entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: String,
    /// Owning book
    pub book_id: String,
    /// Date when the transaction occurred
    pub date: NaiveDate,
    /// Description of the transaction
    pub description: String,
    /// List of entries that make up this transaction
    pub entries: Vec<Entry>,
    /// Optional listing highlight
    pub highlight: Option<Highlight>,
    /// When the transaction was created
    pub created_at: NaiveDateTime,
    /// When the transaction was last updated
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    /// Create a new empty transaction with a generated id
    pub fn new(book_id: String, date: NaiveDate, description: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: format!("txn_{}", Uuid::new_v4()),
            book_id,
            date,
            description,
            entries: Vec::new(),
            highlight: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an entry to the transaction
    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Calculate total debits
    pub fn total_debits(&self) -> BigDecimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| &e.amount)
            .sum()
    }

    /// Calculate total credits
    pub fn total_credits(&self) -> BigDecimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Credit)
            .map(|e| &e.amount)
            .sum()
    }

    /// Check if the transaction is balanced (debits = credits within tolerance)
    pub fn is_balanced(&self) -> bool {
        (self.total_debits() - self.total_credits()).abs() <= balance_tolerance()
    }

    /// Whether any entry touches the given account
    pub fn touches(&self, account_id: &str) -> bool {
        self.entries.iter().any(|e| e.account_id == account_id)
    }

    /// Validate the transaction against double-entry rules
    pub fn validate(&self) -> LedgerResult<()> {
        if self.entries.len() < 2 {
            return Err(LedgerError::Validation(
                "Transaction must have at least two entries for double-entry bookkeeping"
                    .to_string(),
            ));
        }

        for entry in &self.entries {
            if entry.amount <= BigDecimal::from(0) {
                return Err(LedgerError::Validation(
                    "Entry amounts must be positive".to_string(),
                ));
            }
        }

        if !self.is_balanced() {
            return Err(LedgerError::Validation(format!(
                "Transaction is not balanced: debits = {}, credits = {}",
                self.total_debits(),
                self.total_credits()
            )));
        }

        Ok(())
    }
}

/// Caller-supplied fields for creating or fully replacing a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub description: String,
    pub entries: Vec<Entry>,
}

/// Free-form scratchpad note attached to a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Owning book
    pub book_id: String,
    /// Note body
    pub text: String,
    /// Checklist completion state
    pub is_completed: bool,
    /// When the note was created
    pub created_at: NaiveDateTime,
}

impl Note {
    /// Create a new note with a generated id
    pub fn new(book_id: String, text: String) -> Self {
        Self {
            id: format!("note_{}", Uuid::new_v4()),
            book_id,
            text,
            is_completed: false,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Snapshot payload of a soft-deleted entity, tagged by entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecycledEntity {
    Book(Book),
    Category(Category),
    Account(Account),
    Transaction(Transaction),
}

impl RecycledEntity {
    /// Entity kind tag
    pub fn kind(&self) -> &'static str {
        match self {
            RecycledEntity::Book(_) => "book",
            RecycledEntity::Category(_) => "category",
            RecycledEntity::Account(_) => "account",
            RecycledEntity::Transaction(_) => "transaction",
        }
    }

    /// Id of the snapshotted entity
    pub fn entity_id(&self) -> &str {
        match self {
            RecycledEntity::Book(b) => &b.id,
            RecycledEntity::Category(c) => &c.id,
            RecycledEntity::Account(a) => &a.id,
            RecycledEntity::Transaction(t) => &t.id,
        }
    }

    /// Display label for bin listings
    pub fn label(&self) -> &str {
        match self {
            RecycledEntity::Book(b) => &b.name,
            RecycledEntity::Category(c) => &c.name,
            RecycledEntity::Account(a) => &a.name,
            RecycledEntity::Transaction(t) => &t.description,
        }
    }
}

/// A recycle-bin row: a soft-deleted entity snapshot with its deletion stamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecycleBinItem {
    /// Unique identifier for the bin entry (not the entity id)
    pub id: String,
    /// Snapshot of the deleted entity
    pub entity: RecycledEntity,
    /// When the entity was soft-deleted
    pub deleted_at: NaiveDateTime,
}

impl RecycleBinItem {
    /// Wrap an entity snapshot, stamping the deletion time
    pub fn new(entity: RecycledEntity) -> Self {
        Self {
            id: format!("bin_{}", Uuid::new_v4()),
            entity,
            deleted_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Errors that can occur in the bookkeeping system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Underlying storage failure
    #[error("Storage error: {0}")]
    Storage(String),
    /// Malformed input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),
    /// Duplicate name within a book
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Referenced entity does not exist in the given book
    #[error("Not found: {0}")]
    NotFound(String),
    /// Operation would violate a domain rule
    #[error("Invariant violation: {0}")]
    Invariant(String),
    /// Attempt to mutate or delete a system-managed entity
    #[error("Protected entity: {0}")]
    Protected(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn balanced_transaction_validates() {
        let mut txn = Transaction::new("b1".into(), date(), "Groceries".into());
        txn.add_entry(Entry::debit("a1".into(), BigDecimal::from(50), None));
        txn.add_entry(Entry::credit("a2".into(), BigDecimal::from(50), None));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn single_entry_is_rejected() {
        let mut txn = Transaction::new("b1".into(), date(), "Half a move".into());
        txn.add_entry(Entry::debit("a1".into(), BigDecimal::from(50), None));
        assert!(matches!(txn.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn unbalanced_transaction_is_rejected() {
        let mut txn = Transaction::new("b1".into(), date(), "Off by ten".into());
        txn.add_entry(Entry::debit("a1".into(), BigDecimal::from(60), None));
        txn.add_entry(Entry::credit("a2".into(), BigDecimal::from(50), None));
        assert!(matches!(txn.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn rounding_drift_within_tolerance_is_accepted() {
        let mut txn = Transaction::new("b1".into(), date(), "Split bill".into());
        txn.add_entry(Entry::debit(
            "a1".into(),
            "33.33".parse::<BigDecimal>().unwrap(),
            None,
        ));
        txn.add_entry(Entry::credit(
            "a2".into(),
            "33.34".parse::<BigDecimal>().unwrap(),
            None,
        ));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut txn = Transaction::new("b1".into(), date(), "Zero leg".into());
        txn.add_entry(Entry::debit("a1".into(), BigDecimal::from(0), None));
        txn.add_entry(Entry::credit("a2".into(), BigDecimal::from(0), None));
        assert!(matches!(txn.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn recycled_entity_round_trips_with_tag() {
        let item = RecycleBinItem::new(RecycledEntity::Category(Category::new(
            "b1".into(),
            "Assets".into(),
            EntryType::Debit,
        )));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["entity"]["type"], "category");
        let back: RecycleBinItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn opening_description_follows_account_name() {
        let acc = Account::new(
            "b1".into(),
            "c1".into(),
            "Bank".into(),
            Some(BigDecimal::from(500)),
            EntryType::Debit,
        );
        assert_eq!(acc.opening_description(), "Opening Balance for Bank");
    }
}
