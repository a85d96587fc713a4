//! # Bookkeeper Core
//!
//! A multi-book double-entry bookkeeping engine: charts of accounts grouped
//! into categories, balanced debit/credit transactions, running and aggregate
//! balances, opening-balance equity bookkeeping, cross-book balance
//! transfers, and a recoverable recycle bin for every entity type.
//!
//! ## Features
//!
//! - **Multiple books**: independent ledgers with a protected default book
//! - **Double-entry transactions**: balanced-entry validation with a small
//!   rounding tolerance, highlight tagging, bulk delete
//! - **Opening balances**: a declared opening balance materializes as a
//!   paired transaction against the book's Opening Balance Equity account
//!   and follows the account through renames and balance changes
//! - **Balance projections**: raw and normal-side balances, per-account
//!   running ledgers, category totals - all computed, never materialized
//! - **Cross-book transfers**: move balances between books with conserved
//!   totals
//! - **Recycle bin**: soft-delete snapshots with restore and permanent purge
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use bookkeeper_core::{Bookkeeper, MemoryStorage, DEFAULT_BOOK_ID};
//!
//! # async fn demo() -> bookkeeper_core::LedgerResult<()> {
//! let mut keeper = Bookkeeper::new(MemoryStorage::new());
//! let books = keeper.list_books().await?; // seeds the default book
//! assert_eq!(books[0].id, DEFAULT_BOOK_ID);
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;
