//! Data mapper for attendance confirmations (`RSVP`), keyed by `user_id`
//! within a hackathon.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;
use hackpsu_core::types::CompoundId;

use crate::entity::Entity;
use crate::error::DbError;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::rsvp::Rsvp;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "RSVP";

pub struct RsvpMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl RsvpMapper {
    pub const COUNT: &'static str = "rsvp:count";
    pub const CREATE: &'static str = "rsvp:create";
    pub const DELETE: &'static str = "rsvp:delete";
    pub const READ: &'static str = "rsvp:read";
    pub const READ_ALL: &'static str = "rsvp:readall";
    pub const UPDATE: &'static str = "rsvp:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(&[Self::DELETE], &[AuthLevel::Director], None, &[AuthLevel::TeamMember]);
        base.add_rbac(&[Self::COUNT], &[AuthLevel::TeamMember], None, &[AuthLevel::Volunteer]);
        base.add_rbac(&[Self::READ_ALL], &[AuthLevel::Volunteer], None, &[AuthLevel::Participant]);
        base.add_rbac(
            &[Self::CREATE, Self::READ, Self::UPDATE],
            &[AuthLevel::Participant],
            None,
            &[],
        );
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// `COUNT(user_id) AS rsvp_count`, scoped per `opts`.
    pub async fn count_query(&self, opts: &UowOpts) -> Result<Select, DbError> {
        let hackathon = self.hackathons.scope(opts).await?;
        Ok(Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(user_id)", "rsvp_count")
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone())))
    }
}

impl AclPerm for RsvpMapper {
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
impl DataMapper for RsvpMapper {
    type Entity = Rsvp;
    type Id = CompoundId;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &CompoundId, opts: &UowOpts) -> DbResult<Option<Rsvp>> {
        let hackathon = self.hackathons.resolve(id.hackathon.as_deref()).await?;
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("user_id = ?", &id.uid)
            .filter("hackathon = ?", hackathon)
            .to_param()
            .terminated();
        let rsvp = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(rsvp))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Rsvp>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = with_fields(Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "rsvp"), opts)
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()));
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64> {
        let query = self.count_query(opts).await?.to_param().terminated();
        let count = self.sql.count(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(count))
    }

    /// RSVPs always belong to the active hackathon.
    async fn insert(&self, mut object: Rsvp) -> DbResult<Rsvp> {
        ensure_valid(&object, "adding")?;
        object.hackathon = Some(self.hackathons.active_uid().await?);
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: Rsvp) -> DbResult<Rsvp> {
        ensure_valid(&object, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&object, "user_id")?)
            .filter("user_id = ?", &object.user_id)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn delete(&self, id: &CompoundId) -> DbResult<()> {
        let hackathon = self.hackathons.resolve(id.hackathon.as_deref()).await?;
        let query = Delete::from(QuoteOptions::ALL, TABLE_NAME)
            .filter("user_id = ?", &id.uid)
            .filter("hackathon = ?", hackathon)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(()))
    }
}
