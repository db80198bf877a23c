//! Batch reconciliation: validate every collection, then apply every operation.
//!
//! Validation reads the current record counts once and settles everything an `add`
//! will need at write time: the staged file, the target disk, the final file name
//! and storage key. Nothing is written until every registered collection has passed,
//! so a rejected batch leaves records and disks untouched. The apply phase has no
//! rollback: a storage or store failure midway returns the error with earlier
//! operations already applied.
//!
//! Two concurrent batches for the same owner and collection can both pass the count
//! check. `Reconciler::with_serialization` closes that window inside one process.

use chrono::Utc;
use mediashelf_core::{AppError, MediaAction, MediaBatch, MediaRecord, OperationInput, OwnerRef};
use mediashelf_storage::keys::{self, is_safe_key, sanitize_file_name};
use mediashelf_storage::StorageGateway;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::context::MediaContext;
use crate::gate::{authorize_optional, AccessGate};
use crate::owner::MediaOwner;
use crate::policy::CollectionPolicy;
use crate::registry::CollectionRegistry;
use crate::store::MediaStore;
use crate::validator;

/// What a successful `process_media` call changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessReport {
    pub added: Vec<MediaRecord>,
    pub updated: Vec<Uuid>,
    pub deleted: Vec<Uuid>,
}

impl ProcessReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

type LockKey = (OwnerRef, String);

/// In-process mutexes keyed by (owner, collection).
///
/// Entries only live while some batch holds or waits for them.
#[derive(Default)]
struct CollectionLocks {
    inner: Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl CollectionLocks {
    async fn acquire(self: &Arc<Self>, owner: &OwnerRef, mut names: Vec<String>) -> CollectionLease {
        // Sorted so concurrent callers always lock in the same order.
        names.sort();
        names.dedup();

        let mutexes: Vec<Arc<tokio::sync::Mutex<()>>> = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            names
                .into_iter()
                .map(|name| map.entry((owner.clone(), name)).or_default().clone())
                .collect()
        };

        let mut lease = CollectionLease {
            guards: Vec::with_capacity(mutexes.len()),
            locks: self.clone(),
        };
        for mutex in mutexes {
            lease.guards.push(mutex.lock_owned().await);
        }
        lease
    }

    /// Drop every entry nobody holds or waits for.
    fn release_idle(&self) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held collection locks; releasing them prunes idle entries.
struct CollectionLease {
    guards: Vec<OwnedMutexGuard<()>>,
    locks: Arc<CollectionLocks>,
}

impl Drop for CollectionLease {
    fn drop(&mut self) {
        self.guards.clear();
        self.locks.release_idle();
    }
}

/// An `add` whose source, file name and key were settled during validation.
struct PreparedAdd {
    id: Uuid,
    source: PathBuf,
    file_name: String,
    key: String,
}

/// One validated operation, ready to apply.
enum Planned<'a> {
    Add(PreparedAdd, &'a OperationInput),
    Update(Uuid, &'a OperationInput),
    Delete(Uuid),
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn MediaStore>,
    gateway: Arc<StorageGateway>,
    gate: Arc<dyn AccessGate>,
    locks: Option<Arc<CollectionLocks>>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn MediaStore>,
        gateway: Arc<StorageGateway>,
        gate: Arc<dyn AccessGate>,
    ) -> Self {
        Self {
            store,
            gateway,
            gate,
            locks: None,
        }
    }

    /// Hold a per-(owner, collection) lock across validation and apply.
    pub fn with_serialization(mut self) -> Self {
        self.locks = Some(Arc::new(CollectionLocks::default()));
        self
    }

    /// Build the owner's registry and process `batch` against it.
    pub async fn process_owner(
        &self,
        ctx: &MediaContext,
        owner: &dyn MediaOwner,
        batch: &MediaBatch,
    ) -> Result<ProcessReport, AppError> {
        let registry = owner.build_registry(&ctx.defaults);
        self.process_media(ctx, &owner.owner_ref(), &registry, batch)
            .await
    }

    /// Like `process_owner`, but only when auto processing is enabled.
    pub async fn process_if_enabled(
        &self,
        ctx: &MediaContext,
        owner: &dyn MediaOwner,
        batch: &MediaBatch,
    ) -> Result<Option<ProcessReport>, AppError> {
        if !ctx.auto_process {
            tracing::debug!(owner = %owner.owner_ref(), "Auto processing disabled, batch skipped");
            return Ok(None);
        }
        self.process_owner(ctx, owner, batch).await.map(Some)
    }

    #[tracing::instrument(skip(self, ctx, registry, batch), fields(owner = %owner, operation = "process_media"))]
    pub async fn process_media(
        &self,
        ctx: &MediaContext,
        owner: &OwnerRef,
        registry: &CollectionRegistry,
        batch: &MediaBatch,
    ) -> Result<ProcessReport, AppError> {
        for name in batch.collection_names() {
            if !registry.contains(name) {
                tracing::debug!(collection = %name, "Ignoring operations for unregistered collection");
            }
        }

        let _lease = match self.locks {
            Some(ref locks) => {
                let touched = registry
                    .all()
                    .filter(|policy| !batch.for_collection(policy.name()).is_empty())
                    .map(|policy| policy.name().to_string())
                    .collect();
                Some(locks.acquire(owner, touched).await)
            }
            None => None,
        };

        let mut plan = Vec::new();
        for policy in registry.all() {
            let planned = self
                .validate_collection(ctx, owner, policy, batch.for_collection(policy.name()))
                .await?;
            plan.push((policy, planned));
        }

        let mut report = ProcessReport::default();
        for (policy, planned) in plan {
            for step in planned {
                self.apply(owner, policy, step, &mut report).await?;
            }
        }

        tracing::info!(
            added = report.added.len(),
            updated = report.updated.len(),
            deleted = report.deleted.len(),
            "Media batch processed"
        );

        Ok(report)
    }

    async fn validate_collection<'a>(
        &self,
        ctx: &MediaContext,
        owner: &OwnerRef,
        policy: &CollectionPolicy,
        operations: &'a [OperationInput],
    ) -> Result<Vec<Planned<'a>>, AppError> {
        for operation in operations {
            operation
                .check_shape()
                .map_err(|msg| AppError::InvalidOperation(format!("{}: {}", policy.name(), msg)))?;
        }

        let adds = count_action(operations, MediaAction::Add);
        let deletes = count_action(operations, MediaAction::Delete);

        if adds > 0 {
            authorize_optional(self.gate.as_ref(), policy.upload_permission(), &ctx.actor, owner)?;
            self.gateway.disk(policy.disk_name())?;
        }

        if let Some(max) = policy.file_limit() {
            let existing = self.store.count(owner, policy.name()).await?;
            let resulting = existing as i64 + adds - deletes;
            if resulting > max as i64 {
                tracing::debug!(
                    collection = %policy.name(),
                    existing,
                    adds,
                    deletes,
                    max,
                    "Collection file limit exceeded"
                );
                return Err(AppError::TooManyFiles {
                    max,
                    count: resulting,
                    collection: policy.name().to_string(),
                });
            }
        }

        let mut planned = Vec::with_capacity(operations.len());
        for operation in operations {
            let step = match (operation.action, operation.id) {
                (MediaAction::Add, _) => {
                    Planned::Add(self.prepare_add(ctx, policy, operation).await?, operation)
                }
                (MediaAction::Update, Some(id)) => Planned::Update(id, operation),
                (MediaAction::Delete, Some(id)) => Planned::Delete(id),
                (action, None) => {
                    return Err(AppError::InvalidOperation(format!(
                        "{}: {:?} requires an id",
                        policy.name(),
                        action
                    )))
                }
            };
            planned.push(step);
        }

        Ok(planned)
    }

    async fn prepare_add(
        &self,
        ctx: &MediaContext,
        policy: &CollectionPolicy,
        operation: &OperationInput,
    ) -> Result<PreparedAdd, AppError> {
        let source = staged_source(operation)?;
        let path = ctx.staged_path(source)?;

        validator::actual_size(&path).await?;
        if let Some(allowed) = policy.accepted_mime_types() {
            validator::guard_mime_type(&path, &allowed).await?;
        }
        if let Some(max) = policy.size_limit() {
            validator::guard_file_size(&path, max, policy.name()).await?;
        }

        let file_name = match operation.metadata.get("file_name") {
            Some(JsonValue::String(name)) if !name.trim().is_empty() => sanitize_file_name(name),
            _ => sanitize_file_name(source),
        };

        let id = Uuid::new_v4();
        let key = keys::media_key(id, &file_name);
        if !is_safe_key(&key) {
            return Err(AppError::InvalidOperation(format!(
                "{}: unusable file name {}",
                policy.name(),
                file_name
            )));
        }

        Ok(PreparedAdd {
            id,
            source: path,
            file_name,
            key,
        })
    }

    async fn apply(
        &self,
        owner: &OwnerRef,
        policy: &CollectionPolicy,
        step: Planned<'_>,
        report: &mut ProcessReport,
    ) -> Result<(), AppError> {
        match step {
            Planned::Add(prepared, operation) => {
                let record = self.add(owner, policy, prepared, operation).await?;
                report.added.push(record);
            }
            Planned::Update(id, operation) => {
                if self.update(owner, policy, id, operation).await? {
                    report.updated.push(id);
                }
            }
            Planned::Delete(id) => {
                if self.delete(owner, policy, id).await? {
                    report.deleted.push(id);
                }
            }
        }
        Ok(())
    }

    async fn add(
        &self,
        owner: &OwnerRef,
        policy: &CollectionPolicy,
        prepared: PreparedAdd,
        operation: &OperationInput,
    ) -> Result<MediaRecord, AppError> {
        let PreparedAdd {
            id,
            source,
            file_name,
            key,
        } = prepared;
        let handle = self.gateway.put(&source, policy.disk_name(), &key).await?;

        let now = Utc::now();
        let record = MediaRecord {
            id,
            owner: owner.clone(),
            collection_name: policy.name().to_string(),
            disk: handle.disk,
            mime_type: handle.mime_type,
            size_bytes: handle.size_bytes,
            custom_properties: operation.metadata.clone(),
            file_name,
            storage_path: handle.path,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.store.insert(&record).await {
            if let Err(cleanup) = self.gateway.delete(&record.disk, &record.storage_path).await {
                tracing::warn!(error = %cleanup, media_id = %id, "Failed to remove file of unsaved record");
            }
            return Err(err);
        }

        if let Err(e) = fs::remove_file(&source).await {
            tracing::warn!(error = %e, path = %source.display(), "Failed to remove staged upload");
        }

        tracing::info!(
            media_id = %id,
            collection = %policy.name(),
            disk = %record.disk,
            size_bytes = record.size_bytes,
            "Media added"
        );

        Ok(record)
    }

    async fn update(
        &self,
        owner: &OwnerRef,
        policy: &CollectionPolicy,
        id: Uuid,
        operation: &OperationInput,
    ) -> Result<bool, AppError> {
        let Some(mut record) = self.find_owned(owner, policy, id).await? else {
            return Ok(false);
        };

        record.merge_custom_properties(&operation.metadata);
        let updated = self
            .store
            .update_custom_properties(id, &record.custom_properties)
            .await?;

        if updated {
            tracing::info!(media_id = %id, collection = %policy.name(), "Media updated");
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        owner: &OwnerRef,
        policy: &CollectionPolicy,
        id: Uuid,
    ) -> Result<bool, AppError> {
        let Some(record) = self.find_owned(owner, policy, id).await? else {
            return Ok(false);
        };

        if !self.store.delete(id).await? {
            return Ok(false);
        }

        if let Err(e) = self.gateway.delete(&record.disk, &record.storage_path).await {
            tracing::warn!(error = %e, media_id = %id, disk = %record.disk, "Failed to delete media file");
        }

        tracing::info!(media_id = %id, collection = %policy.name(), "Media deleted");
        Ok(true)
    }

    /// The record, if it exists and belongs to this owner's collection.
    async fn find_owned(
        &self,
        owner: &OwnerRef,
        policy: &CollectionPolicy,
        id: Uuid,
    ) -> Result<Option<MediaRecord>, AppError> {
        match self.store.find(id).await? {
            Some(record) if record.belongs_to(owner, policy.name()) => Ok(Some(record)),
            Some(_) => {
                tracing::debug!(media_id = %id, collection = %policy.name(), "Media belongs to another collection, skipped");
                Ok(None)
            }
            None => {
                tracing::debug!(media_id = %id, collection = %policy.name(), "Media already gone, skipped");
                Ok(None)
            }
        }
    }
}

fn count_action(operations: &[OperationInput], action: MediaAction) -> i64 {
    operations.iter().filter(|op| op.action == action).count() as i64
}

fn staged_source(operation: &OperationInput) -> Result<&str, AppError> {
    operation
        .source_path
        .as_deref()
        .ok_or_else(|| AppError::InvalidOperation("an add operation requires a path".to_string()))
}
