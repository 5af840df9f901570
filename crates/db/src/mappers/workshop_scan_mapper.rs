//! Data mapper for workshop check-ins (`WORKSHOP_SCANS`). Check-ins are
//! write-only: scans are inserted and looked up through the participant's
//! pin, never read back individually.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, not_supported, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::hackathon::Hackathon;
use crate::models::registration::Registration;
use crate::models::workshop_scan::WorkshopScan;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "WORKSHOP_SCANS";

pub struct WorkshopScanMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl WorkshopScanMapper {
    pub const CHECK_IN: &'static str = "workshop:checkin";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(&[Self::CHECK_IN], &[AuthLevel::TeamMember], None, &[]);
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// Registration behind the pin a participant shows at the door. Pins
    /// are relative to `hackathon.base_pin` and always read fresh.
    pub async fn get_by_pin(&self, pin: i64, hackathon: &Hackathon) -> DbResult<Option<Registration>> {
        let query = Select::new(QuoteOptions::TABLES)
            .from("REGISTRATION")
            .filter("hackathon = ?", &hackathon.uid)
            .filter("pin = ?", hackathon.base_pin.unwrap_or_default() + pin)
            .to_param();
        let registration = self.sql.query_one(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(registration))
    }

    /// Drop every check-in recorded under `email`.
    pub async fn delete_user(&self, email: &str) -> DbResult<()> {
        let query = Delete::from(QuoteOptions::ALL, TABLE_NAME)
            .filter("email = ?", email)
            .to_param();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(()))
    }
}

impl AclPerm for WorkshopScanMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::CheckIn => Some(Self::CHECK_IN),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for WorkshopScanMapper {
    type Entity = WorkshopScan;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, _id: &str, _opts: &UowOpts) -> DbResult<Option<WorkshopScan>> {
        not_supported()
    }

    async fn get_all(&self, _opts: &UowOpts) -> DbResult<Listing<WorkshopScan>> {
        not_supported()
    }

    async fn get_count(&self, _opts: &UowOpts) -> DbResult<i64> {
        not_supported()
    }

    /// Scans always belong to the active hackathon, whatever the scanner
    /// sent.
    async fn insert(&self, mut object: WorkshopScan) -> DbResult<WorkshopScan> {
        ensure_valid(&object, "adding")?;
        object.hackathon_id = Some(self.hackathons.active_uid().await?);
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, _object: WorkshopScan) -> DbResult<WorkshopScan> {
        not_supported()
    }

    async fn delete(&self, _id: &str) -> DbResult<()> {
        not_supported()
    }
}
