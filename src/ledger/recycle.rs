//! Soft-delete snapshot store with restore and permanent purge

use tracing::debug;

use crate::traits::*;
use crate::types::*;

/// Recycle bin holding snapshots of soft-deleted entities
///
/// Every destructive operation in the system routes the removed entity
/// through here before deleting it from primary storage, so a deletion is
/// recoverable until the bin entry is purged.
pub struct RecycleBin<S: BookStorage> {
    storage: S,
}

impl<S: BookStorage> RecycleBin<S> {
    /// Create a new recycle bin over the given storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Snapshot an entity into the bin, stamping its deletion time
    pub async fn soft_delete(&mut self, entity: RecycledEntity) -> LedgerResult<RecycleBinItem> {
        let item = RecycleBinItem::new(entity);
        debug!(
            kind = item.entity.kind(),
            entity_id = item.entity.entity_id(),
            "moving entity to recycle bin"
        );
        self.storage.save_recycled(&item).await?;
        Ok(item)
    }

    /// Snapshot a batch of entities, used by cascading book deletion.
    ///
    /// Items are written one by one; the caller must not delete anything from
    /// primary storage until this returns Ok, so a failure partway leaves the
    /// primary store untouched.
    pub async fn soft_delete_batch(
        &mut self,
        entities: Vec<RecycledEntity>,
    ) -> LedgerResult<Vec<RecycleBinItem>> {
        let mut items = Vec::with_capacity(entities.len());
        for entity in entities {
            items.push(self.soft_delete(entity).await?);
        }
        Ok(items)
    }

    /// List all bin items, newest deletions first
    pub async fn list_items(&self) -> LedgerResult<Vec<RecycleBinItem>> {
        self.storage.list_recycled().await
    }

    /// Get a bin item by id, failing if it does not exist
    pub async fn get_item_required(&self, item_id: &str) -> LedgerResult<RecycleBinItem> {
        self.storage
            .get_recycled(item_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("recycle bin item '{item_id}'")))
    }

    /// Re-insert the snapshotted entity into its owning store and remove the
    /// bin entry. The snapshot kind picks the destination; an unknown kind is
    /// unrepresentable.
    pub async fn restore(&mut self, item_id: &str) -> LedgerResult<RecycledEntity> {
        let item = self.get_item_required(item_id).await?;

        match &item.entity {
            RecycledEntity::Book(book) => self.storage.save_book(book).await?,
            RecycledEntity::Category(category) => self.storage.save_category(category).await?,
            RecycledEntity::Account(account) => self.storage.save_account(account).await?,
            RecycledEntity::Transaction(transaction) => {
                self.storage.save_transaction(transaction).await?
            }
        }

        debug!(
            kind = item.entity.kind(),
            entity_id = item.entity.entity_id(),
            "restored entity from recycle bin"
        );
        self.storage.delete_recycled(item_id).await?;
        Ok(item.entity)
    }

    /// Permanently remove a bin entry. Terminal: the snapshot is gone.
    pub async fn purge(&mut self, item_id: &str) -> LedgerResult<()> {
        // Existence check first so the caller gets NotFound, not a storage error
        self.get_item_required(item_id).await?;
        self.storage.delete_recycled(item_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn sample_transaction() -> Transaction {
        let mut txn = Transaction::new(
            "b1".into(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            "Coffee".into(),
        );
        txn.add_entry(Entry::debit("a1".into(), BigDecimal::from(5), None));
        txn.add_entry(Entry::credit("a2".into(), BigDecimal::from(5), None));
        txn
    }

    #[tokio::test]
    async fn soft_delete_then_restore_round_trips() {
        let storage = MemoryStorage::new();
        let mut bin = RecycleBin::new(storage.clone());

        let txn = sample_transaction();
        let item = bin
            .soft_delete(RecycledEntity::Transaction(txn.clone()))
            .await
            .unwrap();
        assert_eq!(item.entity.kind(), "transaction");

        let restored = bin.restore(&item.id).await.unwrap();
        assert_eq!(restored.entity_id(), txn.id);
        assert!(bin.list_items().await.unwrap().is_empty());

        // The entity landed back in its owning store
        let back = storage.get_transaction(&txn.id).await.unwrap();
        assert_eq!(back, Some(txn));
    }

    #[tokio::test]
    async fn purge_is_terminal() {
        let storage = MemoryStorage::new();
        let mut bin = RecycleBin::new(storage.clone());

        let item = bin
            .soft_delete(RecycledEntity::Transaction(sample_transaction()))
            .await
            .unwrap();
        bin.purge(&item.id).await.unwrap();

        assert!(bin.list_items().await.unwrap().is_empty());
        assert!(matches!(
            bin.restore(&item.id).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn restore_of_missing_item_fails() {
        let mut bin = RecycleBin::new(MemoryStorage::new());
        assert!(matches!(
            bin.restore("bin_nope").await,
            Err(LedgerError::NotFound(_))
        ));
    }
}
