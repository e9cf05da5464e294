//! Item use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for presentation and import callers.
//! - Delegate persistence and rule enforcement to the repository.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::audit::{AuditEntry, AuditEntryId, AuditReason};
use crate::model::item::{CatalogId, Item, ItemId, ItemPatch, NewItem, TypeId};
use crate::repo::item_repo::{ItemListQuery, ItemRepository};
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for item operations.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, new_item: &NewItem) -> RepoResult<Item> {
        self.repo.create_item(new_item)
    }

    pub fn get(&self, item_id: ItemId) -> RepoResult<Option<Item>> {
        self.repo.get_item(item_id)
    }

    /// Loads an item or fails with `NotFound`.
    pub fn get_required(&self, item_id: ItemId) -> RepoResult<Item> {
        self.repo
            .get_item(item_id)?
            .ok_or(RepoError::NotFound(item_id))
    }

    /// Applies a partial update recorded with reason `update`.
    pub fn update(
        &self,
        item_id: ItemId,
        patch: &ItemPatch,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        self.repo
            .update_item(item_id, patch, note, AuditReason::Update)
    }

    pub fn rename(&self, item_id: ItemId, name: impl Into<String>) -> RepoResult<bool> {
        let patch = ItemPatch {
            name: Some(name.into()),
            ..ItemPatch::default()
        };
        self.update(item_id, &patch, None)
    }

    /// Moves an item to another hardware type.
    ///
    /// # Contract
    /// - Allocates a new serial and asset tag for `type_id`.
    /// - Clears `extension` unless `type_id` is the landline type.
    pub fn reclassify(
        &self,
        item_id: ItemId,
        type_id: TypeId,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        let patch = ItemPatch {
            type_id: Some(type_id),
            ..ItemPatch::default()
        };
        self.update(item_id, &patch, note)
    }

    /// Sets (`Some`) or releases (`None`) the item's IP address.
    pub fn set_ip(
        &self,
        item_id: ItemId,
        ip_address: Option<&str>,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        let patch = ItemPatch {
            ip_address: Some(ip_address.map(str::to_string)),
            ..ItemPatch::default()
        };
        self.update(item_id, &patch, note)
    }

    pub fn assign(
        &self,
        item_id: ItemId,
        user_id: Option<Option<CatalogId>>,
        group_id: Option<Option<CatalogId>>,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        self.repo.assign_item(item_id, user_id, group_id, note)
    }

    pub fn move_location(
        &self,
        item_id: ItemId,
        location_id: Option<CatalogId>,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        self.repo.move_item(item_id, location_id, note)
    }

    pub fn archive(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool> {
        self.repo.archive_item(item_id, note)
    }

    pub fn delete(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool> {
        self.repo.delete_item(item_id, note)
    }

    pub fn add_audit_note(&self, item_id: ItemId, text: &str) -> RepoResult<AuditEntryId> {
        self.repo.add_audit_note(item_id, text)
    }

    pub fn list(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        self.repo.list_items(query)
    }

    pub fn history_for_item(
        &self,
        item_id: ItemId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<AuditEntry>> {
        self.repo.history_for_item(item_id, limit)
    }
}
