//! Ledger module: books, categories, accounts, transactions, balances,
//! transfers, and the recycle bin

pub mod account;
pub mod balance;
pub mod book;
pub mod category;
pub mod core;
pub mod note;
pub mod recycle;
pub mod transaction;
pub mod transfer;

pub use account::*;
pub use balance::*;
pub use book::*;
pub use category::*;
pub use self::core::*;
pub use note::*;
pub use recycle::*;
pub use transaction::*;
pub use transfer::*;
