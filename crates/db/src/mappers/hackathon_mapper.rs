//! Hackathon rows and the active-hackathon transition.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;
use hackpsu_core::types::{now_millis, Uid};

use crate::entity::Entity;
use crate::error::DbError;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::active_hackathon::ActiveHackathonCell;
use crate::models::hackathon::Hackathon;
use crate::opts::UowOpts;
use crate::query::{Insert, ParamQuery, QuoteOptions, RowLock, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "HACKATHON";

pub struct HackathonMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    active: ActiveHackathonCell,
}

impl HackathonMapper {
    pub const CREATE: &'static str = "hackathon:create";
    pub const DELETE: &'static str = "hackathon:delete";
    pub const READ: &'static str = "hackathon:read";
    pub const READ_ALL: &'static str = "hackathon:readall";
    pub const UPDATE: &'static str = "hackathon:update";
    pub const COUNT: &'static str = "hackathon:count";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::CREATE, Self::UPDATE],
            &[AuthLevel::Director],
            None,
            &[AuthLevel::TeamMember],
        );
        base.add_rbac(&[Self::DELETE], &[AuthLevel::Technology], None, &[AuthLevel::Director]);
        base.add_rbac(
            &[Self::READ, Self::READ_ALL, Self::COUNT],
            &[AuthLevel::Participant],
            None,
            &[],
        );
        Self {
            base,
            sql,
            active: ActiveHackathonCell::new(),
        }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// The hackathon currently flagged active, resolved once and shared
    /// until the next [`HackathonMapper::make_active`].
    pub async fn active_hackathon(&self) -> Result<Hackathon, DbError> {
        self.active
            .get_or_resolve(|| async {
                tracing::debug!("Resolving active hackathon");
                let found: Option<Hackathon> = self
                    .sql
                    .query_one(&active_hackathon_query(), QueryOpts::UNCACHED)
                    .await?;
                found.ok_or_else(|| DbError::from(CoreError::http(404, "no active hackathon found")))
            })
            .await
    }

    pub async fn active_uid(&self) -> Result<Uid, DbError> {
        Ok(self.active_hackathon().await?.uid)
    }

    /// `explicit` if given, else the active hackathon's id.
    pub async fn resolve(&self, explicit: Option<&str>) -> Result<Uid, DbError> {
        match explicit {
            Some(hackathon) => Ok(hackathon.to_string()),
            None => self.active_uid().await,
        }
    }

    /// Hackathon id to filter by for `opts`: `None` when the read is not
    /// scoped, the explicit id if one was given, else the active one.
    pub async fn scope(&self, opts: &UowOpts) -> Result<Option<Uid>, DbError> {
        if !opts.by_hackathon {
            return Ok(None);
        }
        self.resolve(opts.hackathon.as_deref()).await.map(Some)
    }

    /// Deactivate the current hackathon and activate `id` in one
    /// transaction, then return the freshly resolved active hackathon.
    pub async fn make_active(&self, id: &str) -> DbResult<Hackathon> {
        let deactivate = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set("active", false)
            .set("end_time", now_millis())
            .filter("active = ?", true)
            .to_param()
            .terminated();
        let activate = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set("active", true)
            .set_query("base_pin", max_pin(RowLock::ForUpdate))
            .filter("uid = ?", id)
            .to_param()
            .terminated();

        self.sql.transaction(&[deactivate, activate]).await?;
        self.active.invalidate();
        tracing::info!(hackathon = id, "Activated hackathon");

        self.active_hackathon().await.map(DbResponse::success)
    }

    /// Drop the cached active hackathon.
    pub fn invalidate(&self) {
        self.active.invalidate();
    }
}

fn active_hackathon_query() -> ParamQuery {
    Select::new(QuoteOptions::ALL)
        .from(TABLE_NAME)
        .filter("active = ?", true)
        .to_param()
        .terminated()
}

/// `(SELECT MAX(pin) FROM REGISTRATION <lock>)`, the next hackathon's
/// pin offset.
fn max_pin(lock: RowLock) -> Select {
    Select::new(QuoteOptions::NONE)
        .field("MAX(pin)")
        .from("REGISTRATION")
        .lock(lock)
}

impl AclPerm for HackathonMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Create => Some(Self::CREATE),
            AclOperation::Delete => Some(Self::DELETE),
            AclOperation::Read => Some(Self::READ),
            AclOperation::ReadAll => Some(Self::READ_ALL),
            AclOperation::Update => Some(Self::UPDATE),
            AclOperation::Count => Some(Self::COUNT),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for HackathonMapper {
    type Entity = Hackathon;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<Hackathon>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", id)
            .to_param()
            .terminated();
        let hackathon = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(hackathon))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Hackathon>> {
        let select = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts);
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

    async fn insert(&self, mut object: Hackathon) -> DbResult<Hackathon> {
        object.start_time.get_or_insert_with(now_millis);
        ensure_valid(&object, "adding")?;
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .set_query("base_pin", max_pin(RowLock::ShareMode))
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    /// Overlay the supplied values on the stored row. Absent timestamps
    /// keep their stored value.
    async fn update(&self, object: Hackathon) -> DbResult<Hackathon> {
        let stored = self
            .get(&object.uid, &UowOpts::new().ignore_cache())
            .await?
            .data
            .ok_or_else(|| DbError::from(CoreError::http(404, "hackathon not found")))?;
        let merged = Hackathon::merge(&object, &stored)?;
        ensure_valid(&merged, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&merged, "uid")?)
            .filter("uid = ?", &merged.uid)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        if merged.active {
            self.active.invalidate();
        }
        Ok(DbResponse::success(merged))
    }

    async fn delete(&self, _id: &str) -> DbResult<()> {
        Err(CoreError::MethodNotImplemented("Cannot delete Hackathon entry yet".into()).into())
    }
}
