//! Data mapper for extra-credit claims (`EXTRA_CREDIT_ASSIGNMENT`) and the
//! classes offering them (`EXTRA_CREDIT_CLASSES`).

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, not_supported, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::extra_credit::{ExtraCreditAssignment, ExtraCreditClass};
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, SqlParam};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "EXTRA_CREDIT_ASSIGNMENT";
pub const CLASSES_TABLE_NAME: &str = "EXTRA_CREDIT_CLASSES";

pub struct ExtraCreditMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl ExtraCreditMapper {
    pub const CREATE: &'static str = "extra-credit:create";
    pub const DELETE: &'static str = "extra-credit:delete";
    pub const READ: &'static str = "extra-credit:read";
    pub const READ_ALL: &'static str = "extra-credit:readall";
    pub const READ_ALL_CLASSES: &'static str = "extra-credit:readall-classes";
    pub const READ_BY_CLASS: &'static str = "extra-credit:read-by-class";
    pub const READ_BY_UID: &'static str = "extra-credit:read-by-uid";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::READ_ALL_CLASSES, Self::READ_BY_UID, Self::CREATE, Self::READ],
            &[AuthLevel::Participant],
            None,
            &[],
        );
        base.add_rbac(
            &[Self::READ_ALL, Self::READ_BY_CLASS],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        base.add_rbac(&[Self::DELETE], &[AuthLevel::Director], None, &[AuthLevel::TeamMember]);
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    pub async fn get_all_classes(&self, opts: &UowOpts) -> DbResult<Listing<ExtraCreditClass>> {
        let select = Select::new(QuoteOptions::ALL).from(CLASSES_TABLE_NAME);
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    /// Claims made by `user_uid`, scoped per `opts`.
    pub async fn get_by_user(&self, user_uid: &str, opts: &UowOpts) -> DbResult<Listing<ExtraCreditAssignment>> {
        self.get_by("user_uid = ?", user_uid.into(), opts).await
    }

    /// Claims against class `class_uid`, scoped per `opts`.
    pub async fn get_by_class(&self, class_uid: i64, opts: &UowOpts) -> DbResult<Listing<ExtraCreditAssignment>> {
        self.get_by("class_uid = ?", class_uid.into(), opts).await
    }

    async fn get_by(&self, condition: &str, value: SqlParam, opts: &UowOpts) -> DbResult<Listing<ExtraCreditAssignment>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let query = Select::new(QuoteOptions::ALL)
            .from(TABLE_NAME)
            .filter(condition, value)
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()))
            .to_param()
            .terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }
}

impl AclPerm for ExtraCreditMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Create => Some(Self::CREATE),
            AclOperation::Delete => Some(Self::DELETE),
            AclOperation::Read => Some(Self::READ),
            AclOperation::ReadAll => Some(Self::READ_ALL),
            AclOperation::ReadAllClasses => Some(Self::READ_ALL_CLASSES),
            AclOperation::ReadByClass => Some(Self::READ_BY_CLASS),
            AclOperation::ReadByUid => Some(Self::READ_BY_UID),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for ExtraCreditMapper {
    type Entity = ExtraCreditAssignment;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<ExtraCreditAssignment>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", id)
            .to_param()
            .terminated();
        let assignment = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(assignment))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<ExtraCreditAssignment>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()));
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, _opts: &UowOpts) -> DbResult<i64> {
        not_supported()
    }

    async fn insert(&self, mut object: ExtraCreditAssignment) -> DbResult<ExtraCreditAssignment> {
        ensure_valid(&object, "adding")?;
        object.hackathon = Some(self.hackathons.active_uid().await?);
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, _object: ExtraCreditAssignment) -> DbResult<ExtraCreditAssignment> {
        not_supported()
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
