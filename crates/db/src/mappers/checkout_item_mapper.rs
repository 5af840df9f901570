//! Data mapper for lendable hardware (`CHECKOUT_ITEMS`) and its
//! availability reads.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::{checkout_object_mapper, hackathon_mapper};
use crate::models::checkout_item::CheckoutItem;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "CHECKOUT_ITEMS";

pub struct CheckoutItemMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
}

impl CheckoutItemMapper {
    pub const COUNT: &'static str = "checkout_items:count";
    pub const CREATE: &'static str = "checkout_items:create";
    pub const DELETE: &'static str = "checkout_items:delete";
    pub const READ: &'static str = "checkout_items:read";
    pub const READ_ALL: &'static str = "checkout_items:readall";
    pub const UPDATE: &'static str = "checkout_items:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::READ, Self::READ_ALL, Self::CREATE, Self::UPDATE, Self::DELETE, Self::COUNT],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        Self { base, sql }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// Item `id` with `available` filled in, or `None` if there is no such
    /// item.
    pub async fn get_available(&self, id: i64) -> DbResult<Option<CheckoutItem>> {
        let query = availability().filter("i.uid = ?", id).to_param().terminated();
        let item = self.sql.query_one(&query, QueryOpts::CACHED).await?;
        Ok(DbResponse::success(item))
    }

    /// Every item with `available` filled in.
    pub async fn get_all_available(&self, opts: &UowOpts) -> DbResult<Listing<CheckoutItem>> {
        let query = availability().to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }
}

/// `quantity` minus the checkouts of the active hackathon that have not
/// been returned, one row per item.
fn availability() -> Select {
    Select::new(QuoteOptions::TABLES)
        .field_as("i.quantity - COUNT(h.uid)", "available")
        .field("i.*")
        .from_as(TABLE_NAME, "i")
        .left_join(
            checkout_object_mapper::TABLE_NAME,
            "c",
            "c.item_id = i.uid AND c.return_time IS NULL",
        )
        .left_join(hackathon_mapper::TABLE_NAME, "h", "c.hackathon = h.uid AND h.active = 1")
        .group("i.uid")
}

impl AclPerm for CheckoutItemMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Count => Some(Self::COUNT),
            AclOperation::Create => Some(Self::CREATE),
            AclOperation::Delete => Some(Self::DELETE),
            AclOperation::Read => Some(Self::READ),
            AclOperation::ReadAll => Some(Self::READ_ALL),
            AclOperation::Update => Some(Self::UPDATE),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for CheckoutItemMapper {
    type Entity = CheckoutItem;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<CheckoutItem>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", id)
            .to_param()
            .terminated();
        let item = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(item))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<CheckoutItem>> {
        let select = with_fields(
            Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "checkoutItems"),
            opts,
        );
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64> {
        let query = Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(uid)", "count")
            .to_param()
            .terminated();
        let count = self.sql.count(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(count))
    }

    async fn insert(&self, object: CheckoutItem) -> DbResult<CheckoutItem> {
        ensure_valid(&object, "adding")?;
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: CheckoutItem) -> DbResult<CheckoutItem> {
        ensure_valid(&object, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&object, "uid")?)
            .filter("uid = ?", object.uid)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let query = Delete::from(QuoteOptions::ALL, TABLE_NAME)
            .filter("uid = ?", id)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(()))
    }
}

#[cfg(test)]
mod tests {
    use hackpsu_core::acl::Rbac;
    use serde_json::json;

    use super::*;
    use crate::cache::NoCache;
    use crate::query::SqlParam;
    use crate::store::MockStore;

    fn mapper(store: Arc<MockStore>) -> CheckoutItemMapper {
        CheckoutItemMapper::new(Arc::new(Rbac::new()), Arc::new(MysqlUow::new(store, Arc::new(NoCache))))
    }

    #[tokio::test]
    async fn get_available_counts_outstanding_checkouts() {
        let store = Arc::new(MockStore::new().respond(|_| {
            Ok(vec![json!({"available": "3", "uid": 7, "name": "Arduino", "quantity": 5})
                .as_object()
                .cloned()
                .unwrap_or_default()])
        }));
        let item = mapper(store.clone()).get_available(7).await.unwrap().data.unwrap();
        assert_eq!(item.available, Some(3));
        assert_eq!(item.quantity, 5);

        let query = &store.queries()[0];
        assert_eq!(
            query.text,
            "SELECT i.quantity - COUNT(h.uid) AS \"available\", i.* FROM `CHECKOUT_ITEMS` `i` \
             LEFT JOIN `CHECKOUT_DATA` `c` ON (c.item_id = i.uid AND c.return_time IS NULL) \
             LEFT JOIN `HACKATHON` `h` ON (c.hackathon = h.uid AND h.active = 1) \
             WHERE (i.uid = ?) GROUP BY i.uid;"
        );
        assert_eq!(query.values, vec![SqlParam::Int(7)]);
    }

    #[tokio::test]
    async fn available_column_is_never_written() {
        let store = Arc::new(MockStore::new());
        let mut item = CheckoutItem::new("Raspberry Pi", 4);
        item.uid = Some(2);
        item.available = Some(1);
        mapper(store.clone()).update(item).await.unwrap();
        assert_eq!(
            store.queries()[0].text,
            "UPDATE `CHECKOUT_ITEMS` SET `name` = ?, `quantity` = ? WHERE (uid = ?);"
        );
    }

    #[tokio::test]
    async fn negative_quantity_is_rejected() {
        let store = Arc::new(MockStore::new());
        let err = mapper(store.clone())
            .insert(CheckoutItem::new("Oscilloscope", -1))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(store.queries().is_empty());
    }
}
