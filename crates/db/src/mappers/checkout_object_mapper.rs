//! Data mapper for individual checkouts (`CHECKOUT_DATA`).

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, not_supported, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::checkout_object::CheckoutObject;
use crate::opts::UowOpts;
use crate::query::{Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "CHECKOUT_DATA";

pub struct CheckoutObjectMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl CheckoutObjectMapper {
    pub const COUNT: &'static str = "checkout_object:count";
    pub const CREATE: &'static str = "checkout_object:create";
    pub const READ: &'static str = "checkout_object:read";
    pub const READ_ALL: &'static str = "checkout_object:readall";
    pub const UPDATE: &'static str = "checkout_object:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::READ, Self::READ_ALL, Self::CREATE, Self::UPDATE, Self::COUNT],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// Record the return of a checked-out item. Only `return_time` is
    /// written; the checkout must already carry one.
    pub async fn return_item(&self, object: CheckoutObject) -> DbResult<CheckoutObject> {
        let Some(return_time) = object.return_time else {
            tracing::warn!(checkout = ?object.uid, "Return time not set");
            return Err(CoreError::http(400, "Return time not set").into());
        };
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set("return_time", return_time)
            .filter("uid = ?", object.uid)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }
}

impl AclPerm for CheckoutObjectMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Count => Some(Self::COUNT),
            AclOperation::Create => Some(Self::CREATE),
            AclOperation::Read => Some(Self::READ),
            AclOperation::ReadAll => Some(Self::READ_ALL),
            AclOperation::Update => Some(Self::UPDATE),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for CheckoutObjectMapper {
    type Entity = CheckoutObject;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<CheckoutObject>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", id)
            .to_param()
            .terminated();
        let checkout = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(checkout))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<CheckoutObject>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = with_fields(
            Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "checkoutObject"),
            opts,
        )
        .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()));
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

    /// Checkouts without a hackathon are filed under the active one.
    async fn insert(&self, mut object: CheckoutObject) -> DbResult<CheckoutObject> {
        ensure_valid(&object, "adding")?;
        if object.hackathon.is_none() {
            object.hackathon = Some(self.hackathons.active_uid().await?);
        }
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: CheckoutObject) -> DbResult<CheckoutObject> {
        ensure_valid(&object, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&object, "uid")?)
            .filter("uid = ?", object.uid)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    /// Checkout history is kept; returns go through
    /// [`CheckoutObjectMapper::return_item`].
    async fn delete(&self, _id: &str) -> DbResult<()> {
        not_supported()
    }
}
