//! The data mapper contract and the pieces every mapper shares.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{self, AclPerm, AclRegistry, RolePredicate};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::opts::UowOpts;
use crate::query::Select;
use crate::response::{DbResult, Listing};
use crate::{DbError, Record};

/// Holds the shared ACL registry and registers a mapper's permissions at
/// construction.
#[derive(Clone)]
pub struct GenericDataMapper {
    acl: Arc<dyn AclRegistry>,
}

impl GenericDataMapper {
    pub fn new(acl: Arc<dyn AclRegistry>) -> Self {
        Self { acl }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        &self.acl
    }

    /// Grant `capabilities` to each of `levels`, optionally gated by
    /// `action`, with `inherits` also sufficient.
    pub fn add_rbac(
        &self,
        capabilities: &[&str],
        levels: &[AuthLevel],
        action: Option<RolePredicate>,
        inherits: &[AuthLevel],
    ) {
        acl::add_rbac(self.acl.as_ref(), capabilities, levels, action, inherits);
    }
}

/// CRUD, listing and counting over one entity family. Operations a mapper
/// does not support fail with [`CoreError::MethodNotImplemented`] before
/// touching the store.
#[async_trait]
pub trait DataMapper: AclPerm + Send + Sync {
    type Entity: Entity;
    type Id: Send + Sync + ?Sized;

    fn table_name(&self) -> &'static str;

    /// The first matching row, or `None` when nothing matched.
    async fn get(&self, id: &Self::Id, opts: &UowOpts) -> DbResult<Option<Self::Entity>>;

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Self::Entity>>;

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64>;

    async fn insert(&self, object: Self::Entity) -> DbResult<Self::Entity>;

    async fn update(&self, object: Self::Entity) -> DbResult<Self::Entity>;

    async fn delete(&self, id: &Self::Id) -> DbResult<()>;
}

/// Fail unless `object` satisfies its declared constraints.
pub(crate) fn ensure_valid<E: Entity>(object: &E, action: &str) -> Result<(), DbError> {
    let outcome = object.validation();
    if !outcome.result {
        tracing::warn!(
            error = outcome.error.as_deref().unwrap_or_default(),
            "Validation failed while {action} object"
        );
    }
    outcome.into_result().map_err(DbError::from)
}

/// Error for an operation the mapper refuses.
pub(crate) fn not_supported<T>() -> DbResult<T> {
    Err(CoreError::not_supported().into())
}

/// Restrict the projection to `opts.fields` when given.
pub(crate) fn with_fields(select: Select, opts: &UowOpts) -> Select {
    match &opts.fields {
        Some(fields) => select.fields(fields),
        None => select,
    }
}

/// Apply `opts.start_at` and `opts.count`.
pub(crate) fn with_page(select: Select, opts: &UowOpts) -> Select {
    select
        .when(opts.start_at.is_some(), |q| q.offset(opts.start_at.unwrap_or_default()))
        .when(opts.count.is_some(), |q| q.limit(opts.count.unwrap_or_default()))
}

/// Storage shape of `object` without its key column, for `UPDATE ... SET`.
pub(crate) fn update_fields<E: Entity>(object: &E, key: &str) -> Result<Record, DbError> {
    let mut record = object.db_representation()?;
    record.shift_remove(key);
    Ok(record)
}
