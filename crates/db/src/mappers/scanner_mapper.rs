//! Data mapper for wristband assignments (`RFID_ASSIGNMENTS`, keyed by
//! `rfid_uid`) and the scans recorded against them (`SCANS`).
//!
//! Scanners upload in batches; a batch insert never fails as a whole.
//! Each item carries its own outcome and the envelope is tagged `Error`
//! when any item failed.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::error::DbError;
use crate::mapper::{ensure_valid, not_supported, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::scanner::{BatchItem, ItemOutcome, RfidAssignment, Scan};
use crate::opts::UowOpts;
use crate::query::{Insert, QuoteOptions, Select};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "RFID_ASSIGNMENTS";
pub const SCANS_TABLE_NAME: &str = "SCANS";

pub struct ScannerMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl ScannerMapper {
    pub const COUNT: &'static str = "rfidassignment:count";
    pub const CREATE: &'static str = "rfidassignment:create";
    pub const READ_ALL: &'static str = "rfidassignment:readall";
    pub const UPDATE: &'static str = "rfidassignment:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::CREATE, Self::UPDATE, Self::COUNT, Self::READ_ALL],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// `COUNT(user_uid) AS checkin_count` over wristband assignments,
    /// scoped per `opts`.
    pub async fn count_query(&self, opts: &UowOpts) -> Result<Select, DbError> {
        let hackathon = self.hackathons.scope(opts).await?;
        Ok(Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(user_uid)", "checkin_count")
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone())))
    }

    /// Insert every assignment independently.
    pub async fn add_rfid_assignments(&self, assignments: Vec<RfidAssignment>) -> DbResult<Vec<BatchItem<RfidAssignment>>> {
        let items = future::join_all(assignments.into_iter().map(|assignment| async move {
            match self.insert(assignment.clone()).await {
                Ok(inserted) => BatchItem {
                    result: ItemOutcome::Success,
                    data: inserted.data,
                },
                Err(err) => {
                    tracing::warn!(wid = %assignment.rfid_uid, error = %err, "Wristband assignment failed");
                    BatchItem {
                        result: ItemOutcome::from_status(err.status()),
                        data: assignment,
                    }
                }
            }
        }))
        .await;
        Ok(batch_response(items))
    }

    /// Insert every scan independently.
    pub async fn add_scans(&self, scans: Vec<Scan>) -> DbResult<Vec<BatchItem<Scan>>> {
        let items = future::join_all(scans.into_iter().map(|scan| async move {
            match self.add_single_scan(scan.clone()).await {
                Ok(inserted) => BatchItem {
                    result: ItemOutcome::Success,
                    data: inserted.data,
                },
                Err(err) => {
                    tracing::warn!(wid = %scan.rfid_uid, error = %err, "Scan upload failed");
                    BatchItem {
                        result: ItemOutcome::from_status(err.status()),
                        data: scan,
                    }
                }
            }
        }))
        .await;
        Ok(batch_response(items))
    }

    /// Record one scan, filed under the active hackathon unless the scanner
    /// named one.
    pub async fn add_single_scan(&self, mut scan: Scan) -> DbResult<Scan> {
        ensure_valid(&scan, "adding")?;
        if scan.hackathon.is_none() {
            scan.hackathon = Some(self.hackathons.active_uid().await?);
        }
        let query = Insert::into(QuoteOptions::ALL, SCANS_TABLE_NAME)
            .set_fields_rows(&[scan.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(scan))
    }
}

fn batch_response<T>(items: Vec<BatchItem<T>>) -> DbResponse<Vec<BatchItem<T>>> {
    if items.iter().all(|item| item.result == ItemOutcome::Success) {
        DbResponse::success(items)
    } else {
        DbResponse::error(items)
    }
}

impl AclPerm for ScannerMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Count => Some(Self::COUNT),
            AclOperation::Create => Some(Self::CREATE),
            AclOperation::ReadAll => Some(Self::READ_ALL),
            AclOperation::Update => Some(Self::UPDATE),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for ScannerMapper {
    type Entity = RfidAssignment;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    /// Assignment of wristband `id`.
    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<RfidAssignment>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("rfid_uid= ?", id)
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()))
            .to_param()
            .terminated();
        let assignment = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(assignment))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<RfidAssignment>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
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

    /// Assignments always belong to the active hackathon.
    async fn insert(&self, mut object: RfidAssignment) -> DbResult<RfidAssignment> {
        ensure_valid(&object, "adding")?;
        object.hackathon = Some(self.hackathons.active_uid().await?);
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, _object: RfidAssignment) -> DbResult<RfidAssignment> {
        not_supported()
    }

    async fn delete(&self, _id: &str) -> DbResult<()> {
        not_supported()
    }
}

#[cfg(test)]
mod tests {
    use hackpsu_core::acl::Rbac;
    use serde_json::json;

    use super::*;
    use crate::cache::NoCache;
    use crate::query::SqlParam;
    use crate::response::ResultTag;
    use crate::store::{MockStore, StoreError};
    use crate::Record;

    fn mapper(store: Arc<MockStore>) -> ScannerMapper {
        let acl: Arc<dyn AclRegistry> = Arc::new(Rbac::new());
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        let hackathons = Arc::new(HackathonMapper::new(acl.clone(), sql.clone()));
        ScannerMapper::new(acl, sql, hackathons)
    }

    fn active_row() -> Record {
        json!({"uid": "h1", "name": "HackPSU", "active": 1})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    fn assignment(wid: &str) -> RfidAssignment {
        RfidAssignment {
            rfid_uid: wid.into(),
            user_uid: "user-1".into(),
            time: 1_000,
            hackathon: None,
        }
    }

    #[tokio::test]
    async fn batch_reports_each_item_and_flags_the_envelope() {
        let store = Arc::new(MockStore::new().respond(|q| {
            if q.text.starts_with("SELECT") {
                Ok(vec![active_row()])
            } else if q.values.first() == Some(&SqlParam::Text("dup".into())) {
                Err(StoreError::Database {
                    code: 1062,
                    message: "Duplicate entry".into(),
                })
            } else {
                Ok(vec![])
            }
        }));
        let response = mapper(store.clone())
            .add_rfid_assignments(vec![assignment("band-1"), assignment("dup"), assignment("")])
            .await
            .unwrap();
        assert_eq!(response.result, ResultTag::Error);
        let outcomes: Vec<_> = response.data.iter().map(|item| item.result).collect();
        assert_eq!(
            outcomes,
            vec![ItemOutcome::Success, ItemOutcome::Duplicate, ItemOutcome::BadInput]
        );
        assert_eq!(response.data[0].data.hackathon.as_deref(), Some("h1"));
    }

    #[tokio::test]
    async fn clean_batch_is_a_success() {
        let store = Arc::new(MockStore::new().respond(|q| {
            if q.text.starts_with("SELECT") {
                Ok(vec![active_row()])
            } else {
                Ok(vec![])
            }
        }));
        let scans = vec![Scan {
            rfid_uid: "band-1".into(),
            scan_event: "e1".into(),
            scan_time: 5,
            scan_location: Some(2),
            hackathon: None,
        }];
        let response = mapper(store.clone()).add_scans(scans).await.unwrap();
        assert!(response.is_success());
        assert_eq!(
            store.queries_starting_with("INSERT")[0].text,
            "INSERT INTO `SCANS` (`rfid_uid`, `scan_event`, `scan_time`, `scan_location`, `hackathon`) VALUES (?, ?, ?, ?, ?);"
        );
    }

    #[tokio::test]
    async fn get_looks_up_by_wristband() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .get("band-1", &UowOpts::new().hackathon("h1"))
            .await
            .unwrap();
        assert_eq!(
            store.queries()[0].text,
            "SELECT * FROM `RFID_ASSIGNMENTS` WHERE (rfid_uid= ?) AND (hackathon = ?);"
        );
    }

    #[tokio::test]
    async fn update_and_delete_are_refused() {
        let store = Arc::new(MockStore::new());
        let mapper = mapper(store.clone());
        assert_eq!(mapper.update(assignment("band-1")).await.unwrap_err().status(), 501);
        assert_eq!(mapper.delete("band-1").await.unwrap_err().status(), 501);
        assert!(store.queries().is_empty());
    }
}
