//! Read-only mapper over the `ATTENDANCE` view, with per-user and
//! per-event aggregations joined against `REGISTRATION`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::mapper::{not_supported, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::mappers::registration_mapper;
use crate::models::attendance::{pick, Attendance, EventAttendance, UserAttendance, EVENT_DETAILS, REGISTRATION_DETAILS};
use crate::opts::UowOpts;
use crate::query::{QuoteOptions, Select};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};
use crate::{DbError, Record};

pub const TABLE_NAME: &str = "ATTENDANCE";

pub struct AttendanceMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl AttendanceMapper {
    pub const READ: &'static str = "attendance:read";
    pub const READ_ALL: &'static str = "attendance:readall";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::READ, Self::READ_ALL],
            &[AuthLevel::Technology],
            None,
            &[AuthLevel::Director],
        );
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// Each registrant with the events they attended, in order of first
    /// appearance. `user` restricts the result to one registrant.
    pub async fn get_attendance_by_user(&self, user: Option<&str>, opts: &UowOpts) -> DbResult<Vec<UserAttendance>> {
        let select = self
            .joined(opts)
            .await?
            .when(user.is_some(), |q| q.filter("attendance.user_uid = ?", user))
            .order("event_start_time", true);
        let rows = self.rows(select, opts).await?;
        let grouped = group_by(rows, "user_uid", |row| UserAttendance {
            registration: pick(row, &REGISTRATION_DETAILS),
            events: Vec::new(),
        }, |entry, row| entry.events.push(pick(row, &EVENT_DETAILS)));
        Ok(DbResponse::success(grouped))
    }

    /// Each event with everyone who attended it. `event` restricts the
    /// result to one event.
    pub async fn get_attendance_by_event(&self, event: Option<&str>, opts: &UowOpts) -> DbResult<Vec<EventAttendance>> {
        let select = self
            .joined(opts)
            .await?
            .when(event.is_some(), |q| q.filter("attendance.event_uid = ?", event));
        let rows = self.rows(select, opts).await?;
        let grouped = group_by(rows, "event_uid", |row| EventAttendance {
            event: pick(row, &EVENT_DETAILS),
            attendees: Vec::new(),
        }, |entry, row| entry.attendees.push(pick(row, &REGISTRATION_DETAILS)));
        Ok(DbResponse::success(grouped))
    }

    async fn joined(&self, opts: &UowOpts) -> Result<Select, DbError> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = Select::new(QuoteOptions::ALL)
            .distinct()
            .from_as(TABLE_NAME, "attendance")
            .join(
                registration_mapper::TABLE_NAME,
                "registration",
                "attendance.user_uid = registration.uid",
            );
        Ok(with_page(with_fields(select, opts), opts).when(hackathon.is_some(), |q| {
            q.filter("hackathon_id = ?", hackathon.clone())
                .filter("registration.hackathon = ?", hackathon.clone())
        }))
    }

    async fn rows(&self, select: Select, opts: &UowOpts) -> Result<Vec<Record>, DbError> {
        self.sql
            .query(&select.to_param().terminated(), QueryOpts::cached(!opts.ignore_cache))
            .await
    }
}

/// Fold `rows` into one entry per distinct `key` value, keeping the order
/// in which keys first appear.
fn group_by<T>(
    rows: Vec<Record>,
    key: &str,
    mut start: impl FnMut(&Record) -> T,
    mut push: impl FnMut(&mut T, &Record),
) -> Vec<T> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut grouped: Vec<T> = Vec::new();
    for row in &rows {
        let id = row.get(key).map(ToString::to_string).unwrap_or_default();
        let slot = *index.entry(id).or_insert_with(|| {
            grouped.push(start(row));
            grouped.len() - 1
        });
        push(&mut grouped[slot], row);
    }
    grouped
}

impl AclPerm for AttendanceMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Read => Some(Self::READ),
            AclOperation::ReadAll => Some(Self::READ_ALL),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for AttendanceMapper {
    type Entity = Attendance;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, _id: &str, _opts: &UowOpts) -> DbResult<Option<Attendance>> {
        not_supported()
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Attendance>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = with_fields(Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "attendance"), opts)
            .when(hackathon.is_some(), |q| q.filter("hackathon_id = ?", hackathon.clone()));
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64> {
        let hackathon = self.hackathons.scope(opts).await?;
        let query = Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(uid)", "count")
            .when(hackathon.is_some(), |q| q.filter("hackathon_id = ?", hackathon.clone()))
            .to_param()
            .terminated();
        let count = self.sql.count(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(count))
    }

    async fn insert(&self, _object: Attendance) -> DbResult<Attendance> {
        not_supported()
    }

    async fn update(&self, _object: Attendance) -> DbResult<Attendance> {
        not_supported()
    }

    async fn delete(&self, _id: &str) -> DbResult<()> {
        not_supported()
    }
}
