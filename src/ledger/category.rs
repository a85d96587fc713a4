//! Category management: named groups of accounts within a book

use crate::ledger::recycle::RecycleBin;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{names_collide, validate_name};

/// Category store for a book's chart of accounts groups
///
/// Names are unique per book, case-insensitively. Each category carries its
/// normal balance side, chosen at creation; balance display derives from that
/// field alone.
pub struct CategoryStore<S: BookStorage> {
    storage: S,
    bin: RecycleBin<S>,
}

impl<S: BookStorage + Clone> CategoryStore<S> {
    /// Create a new category store over the given storage
    pub fn new(storage: S) -> Self {
        Self {
            bin: RecycleBin::new(storage.clone()),
            storage,
        }
    }

    /// List a book's categories, system ones included
    pub async fn list_categories(&self, book_id: &str) -> LedgerResult<Vec<Category>> {
        self.storage.list_categories(book_id).await
    }

    /// Get a category by id within a book, failing if absent
    pub async fn get_category_required(
        &self,
        book_id: &str,
        category_id: &str,
    ) -> LedgerResult<Category> {
        match self.storage.get_category(category_id).await? {
            Some(category) if category.book_id == book_id => Ok(category),
            _ => Err(LedgerError::NotFound(format!(
                "category '{category_id}' in book '{book_id}'"
            ))),
        }
    }

    /// Create a category in a book
    pub async fn create_category(
        &mut self,
        book_id: &str,
        name: &str,
        normal_balance: EntryType,
    ) -> LedgerResult<Category> {
        validate_name(name)?;
        self.ensure_name_free(book_id, name, None).await?;

        let category = Category::new(book_id.to_string(), name.trim().to_string(), normal_balance);
        self.storage.save_category(&category).await?;
        Ok(category)
    }

    /// Rename a category
    pub async fn rename_category(
        &mut self,
        book_id: &str,
        category_id: &str,
        name: &str,
    ) -> LedgerResult<Category> {
        let mut category = self.get_category_required(book_id, category_id).await?;
        if category.is_system {
            return Err(LedgerError::Protected(format!(
                "category '{}' is system-managed",
                category.name
            )));
        }

        validate_name(name)?;
        self.ensure_name_free(book_id, name, Some(category_id)).await?;

        category.name = name.trim().to_string();
        self.storage.update_category(&category).await?;
        Ok(category)
    }

    /// Delete a category, snapshotting it to the recycle bin.
    /// Fails while any account still references it.
    pub async fn delete_category(
        &mut self,
        book_id: &str,
        category_id: &str,
    ) -> LedgerResult<RecycleBinItem> {
        let category = self.get_category_required(book_id, category_id).await?;
        if category.is_system {
            return Err(LedgerError::Protected(format!(
                "category '{}' is system-managed",
                category.name
            )));
        }

        let accounts = self.storage.list_accounts(book_id).await?;
        let in_use = accounts.iter().filter(|a| a.category_id == category_id).count();
        if in_use > 0 {
            return Err(LedgerError::Invariant(format!(
                "category '{}' still has {in_use} account(s)",
                category.name
            )));
        }

        let item = self
            .bin
            .soft_delete(RecycledEntity::Category(category))
            .await?;
        self.storage.delete_category(category_id).await?;
        Ok(item)
    }

    /// Find a same-named category in a book (case-insensitive), or create one
    /// with the given normal side. Used by cross-book transfers.
    pub async fn resolve_or_create(
        &mut self,
        book_id: &str,
        name: &str,
        normal_balance: EntryType,
    ) -> LedgerResult<Category> {
        let existing = self
            .storage
            .list_categories(book_id)
            .await?
            .into_iter()
            .find(|c| names_collide(&c.name, name));

        match existing {
            Some(category) => Ok(category),
            None => self.create_category(book_id, name, normal_balance).await,
        }
    }

    async fn ensure_name_free(
        &self,
        book_id: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> LedgerResult<()> {
        let categories = self.storage.list_categories(book_id).await?;
        let clash = categories
            .iter()
            .filter(|c| exclude_id != Some(c.id.as_str()))
            .any(|c| names_collide(&c.name, name));
        if clash {
            Err(LedgerError::Conflict(format!(
                "category named '{}' already exists in this book",
                name.trim()
            )))
        } else {
            Ok(())
        }
    }
}
