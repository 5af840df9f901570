//! Data mapper for hackathon registrations (`REGISTRATION`).
//!
//! Registrations are keyed by user id and hackathon. Reads join
//! `HACKATHON` for the hackathon's name and timing; those joined columns
//! never reach an `UPDATE` because the entity does not carry them.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;
use hackpsu_core::types::{now_millis, CompoundId, Uid};

use crate::entity::Entity;
use crate::error::DbError;
use crate::mapper::{ensure_valid, update_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::{self, HackathonMapper};
use crate::models::hackathon::Hackathon;
use crate::models::registration::{Registration, RegistrationStat, STATS_COLUMNS};
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "REGISTRATION";

/// Hackathon columns returned alongside a registration.
const HACKATHON_COLUMNS: [&str; 5] = [
    "hackathon.name",
    "hackathon.start_time",
    "hackathon.end_time",
    "hackathon.base_pin",
    "hackathon.active",
];

pub struct RegistrationMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl RegistrationMapper {
    pub const COUNT: &'static str = "registration:count";
    pub const CREATE: &'static str = "registration:create";
    pub const DELETE: &'static str = "registration:delete";
    pub const READ: &'static str = "registration:read";
    pub const READ_ALL: &'static str = "registration:readall";
    pub const UPDATE: &'static str = "registration:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(&[Self::DELETE], &[AuthLevel::Director], None, &[AuthLevel::TeamMember]);
        base.add_rbac(
            &[Self::READ_ALL, Self::COUNT],
            &[AuthLevel::Volunteer],
            None,
            &[AuthLevel::Participant],
        );
        base.add_rbac(
            &[Self::READ, Self::UPDATE, Self::CREATE],
            &[AuthLevel::Participant],
            None,
            &[],
        );
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// `COUNT(uid) AS registration_count`, scoped per `opts`. Also used as
    /// a sub-select by the statistics mapper.
    pub async fn count_query(&self, opts: &UowOpts) -> Result<Select, DbError> {
        let hackathon = self.hackathons.scope(opts).await?;
        Ok(Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(uid)", "registration_count")
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone())))
    }

    /// Mark the user's registration for the active hackathon as submitted.
    pub async fn submit(&self, uid: &str) -> DbResult<bool> {
        let hackathon = self.hackathons.active_uid().await?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set("submitted", true)
            .filter("uid = ?", uid)
            .filter("hackathon = ?", hackathon)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(true))
    }

    /// The user's registration for the active hackathon, with `pin`
    /// reported relative to the hackathon's base pin.
    pub async fn get_current(&self, uid: &str, opts: &UowOpts) -> DbResult<Option<Registration>> {
        let select = Select::new(QuoteOptions::TABLES).from_as(TABLE_NAME, "registration");
        let select = match &opts.fields {
            Some(fields) => select.fields(fields),
            None => select.field("registration.*"),
        };
        let query = select
            .field_as("registration.pin - hackathon.base_pin", "pin")
            .join(
                hackathon_mapper::TABLE_NAME,
                "hackathon",
                "registration.hackathon = hackathon.uid and hackathon.active = 1",
            )
            .filter("registration.uid= ?", uid)
            .to_param()
            .terminated();
        let registration = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(registration))
    }

    /// Answer counts for each summarized column, one `UNION`ed group-by
    /// per column.
    pub async fn get_registration_stats(&self, opts: &UowOpts) -> DbResult<Listing<RegistrationStat>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let mut columns = STATS_COLUMNS.iter().map(|column| option_counts(column, hackathon.as_deref()));
        let Some(first) = columns.next() else {
            return Ok(DbResponse::success(Listing::Materialized(Vec::new())));
        };
        let query = columns.fold(first, Select::union).to_param().terminated();
        let stats = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(stats))
    }

    pub async fn get_email_by_uid(&self, uid: &str) -> DbResult<Option<String>> {
        let query = Select::new(QuoteOptions::ALL)
            .from(TABLE_NAME)
            .field("email")
            .filter("uid = ?", uid)
            .to_param()
            .terminated();
        let rows = self.sql.query(&query, QueryOpts::CACHED).await?;
        let email = rows
            .into_iter()
            .next()
            .and_then(|mut row| row.shift_remove("email"))
            .and_then(|email| email.as_str().map(str::to_string));
        Ok(DbResponse::success(email))
    }

    /// Look a registration up by the pin shown to the participant, which
    /// is relative to `hackathon.base_pin`.
    pub async fn get_by_pin(&self, pin: i64, hackathon: &Hackathon) -> DbResult<Option<Registration>> {
        let query = Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .filter("hackathon = ?", &hackathon.uid)
            .filter("pin = ?", hackathon.base_pin.unwrap_or_default() + pin)
            .to_param()
            .terminated();
        let registration = self.sql.query_one(&query, QueryOpts::CACHED).await?;
        Ok(DbResponse::success(registration))
    }

    fn joined_select(&self, opts: &UowOpts) -> Select {
        let select = Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "registration");
        match &opts.fields {
            Some(fields) => select.fields(fields),
            None => select.field("registration.*").fields(HACKATHON_COLUMNS),
        }
    }
}

/// `"<column>" AS CATEGORY, <column> AS OPTION, COUNT(*) AS COUNT` grouped
/// by the column.
fn option_counts(column: &str, hackathon: Option<&str>) -> Select {
    Select::new(QuoteOptions::TABLES)
        .from(TABLE_NAME)
        .field_as(&format!("\"{column}\""), "CATEGORY")
        .field_as(column, "OPTION")
        .field_as("COUNT(*)", "COUNT")
        .when(hackathon.is_some(), |q| {
            q.join(
                hackathon_mapper::TABLE_NAME,
                "hackathon",
                &format!("hackathon.uid = {TABLE_NAME}.hackathon"),
            )
            .filter("hackathon.uid = ?", hackathon)
        })
        .group(column)
}

impl AclPerm for RegistrationMapper {
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
impl DataMapper for RegistrationMapper {
    type Entity = Registration;
    type Id = CompoundId;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    /// Latest registration of `id.uid` for `id.hackathon`, defaulting to
    /// the active hackathon.
    async fn get(&self, id: &CompoundId, opts: &UowOpts) -> DbResult<Option<Registration>> {
        let hackathon = self.hackathons.resolve(id.hackathon.as_deref()).await?;
        let query = self
            .joined_select(opts)
            .join(
                hackathon_mapper::TABLE_NAME,
                "hackathon",
                "hackathon.uid = registration.hackathon",
            )
            .filter("registration.uid= ?", &id.uid)
            .filter("registration.hackathon = ?", hackathon)
            .order("time", false)
            .to_param()
            .terminated();
        let registration = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(registration))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Registration>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = self
            .joined_select(opts)
            .join(
                hackathon_mapper::TABLE_NAME,
                "hackathon",
                "registration.hackathon = hackathon.uid",
            )
            .when(hackathon.is_some(), |q| q.filter("hackathon.uid = ?", hackathon.clone()));
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64> {
        let query = self.count_query(opts).await?.to_param().terminated();
        let count = self.sql.count(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(count))
    }

    /// Registrations always go to the active hackathon; `time` defaults to
    /// now.
    async fn insert(&self, mut object: Registration) -> DbResult<Registration> {
        ensure_valid(&object, "adding")?;
        object.hackathon = Some(self.hackathons.active_uid().await?);
        object.time.get_or_insert_with(now_millis);
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    /// Overlay the supplied answers on the stored registration.
    async fn update(&self, object: Registration) -> DbResult<Registration> {
        let uid: Uid = object
            .uid
            .clone()
            .ok_or_else(|| DbError::from(CoreError::validation("data.uid is required")))?;
        let id = CompoundId::new(uid, object.hackathon.clone());
        let stored = self
            .get(&id, &UowOpts::new().ignore_cache())
            .await?
            .data
            .ok_or_else(|| DbError::from(CoreError::http(404, "registration not found")))?;
        let merged = Registration::merge(&object, &stored)?;
        ensure_valid(&merged, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&merged, "uid")?)
            .filter("uid = ?", &id.uid)
            .filter("hackathon = ?", merged.hackathon.clone())
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(merged))
    }

    async fn delete(&self, id: &CompoundId) -> DbResult<()> {
        let hackathon = self.hackathons.resolve(id.hackathon.as_deref()).await?;
        let query = Delete::from(QuoteOptions::ALL, TABLE_NAME)
            .filter("uid = ?", &id.uid)
            .filter("hackathon = ?", hackathon)
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
    use crate::models::registration::tests::registration;
    use crate::query::SqlParam;
    use crate::store::MockStore;
    use crate::Record;

    fn mapper(store: Arc<MockStore>) -> RegistrationMapper {
        let acl: Arc<dyn AclRegistry> = Arc::new(Rbac::new());
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        let hackathons = Arc::new(HackathonMapper::new(acl.clone(), sql.clone()));
        RegistrationMapper::new(acl, sql, hackathons)
    }

    fn active_row() -> Record {
        json!({"uid": "h1", "name": "HackPSU", "base_pin": 100, "active": 1})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    fn store_with_active() -> Arc<MockStore> {
        Arc::new(MockStore::new().respond(|q| {
            if q.text.starts_with("SELECT * FROM `HACKATHON`") {
                Ok(vec![active_row()])
            } else {
                Ok(vec![])
            }
        }))
    }

    #[tokio::test]
    async fn get_joins_hackathon_and_orders_newest_first() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .get(&CompoundId::new("u1", Some("h1".into())), &UowOpts::new())
            .await
            .unwrap();
        let query = &store.queries()[0];
        assert_eq!(
            query.text,
            "SELECT `registration`.*, `hackathon`.`name`, `hackathon`.`start_time`, `hackathon`.`end_time`, \
             `hackathon`.`base_pin`, `hackathon`.`active` FROM `REGISTRATION` `registration` \
             INNER JOIN `HACKATHON` `hackathon` ON (hackathon.uid = registration.hackathon) \
             WHERE (registration.uid= ?) AND (registration.hackathon = ?) ORDER BY time DESC;"
        );
        assert_eq!(query.values, vec![SqlParam::Text("u1".into()), SqlParam::Text("h1".into())]);
    }

    #[tokio::test]
    async fn insert_assigns_active_hackathon_and_time() {
        let store = store_with_active();
        let mut fresh = registration();
        fresh.hackathon = None;
        fresh.time = None;
        let inserted = mapper(store.clone()).insert(fresh).await.unwrap().data;
        assert_eq!(inserted.hackathon.as_deref(), Some("h1"));
        assert!(inserted.time.is_some());
        assert_eq!(store.queries_starting_with("INSERT INTO `REGISTRATION`").len(), 1);
    }

    #[tokio::test]
    async fn count_query_is_scoped_and_aliased() {
        let store = Arc::new(MockStore::new());
        let query = mapper(store)
            .count_query(&UowOpts::new().hackathon("h2"))
            .await
            .unwrap()
            .to_param();
        assert_eq!(
            query.text,
            "SELECT COUNT(uid) AS \"registration_count\" FROM `REGISTRATION` WHERE (hackathon = ?)"
        );
    }

    #[tokio::test]
    async fn stats_union_one_group_per_column() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .get_registration_stats(&UowOpts::new())
            .await
            .unwrap();
        let text = &store.queries()[0].text;
        assert!(text.starts_with(
            "SELECT \"academic_year\" AS \"CATEGORY\", academic_year AS \"OPTION\", COUNT(*) AS \"COUNT\" \
             FROM `REGISTRATION` GROUP BY academic_year UNION (SELECT \"coding_experience\""
        ));
        assert_eq!(text.matches("UNION").count(), STATS_COLUMNS.len() - 1);
    }

    #[tokio::test]
    async fn get_by_pin_offsets_from_base_pin() {
        let store = Arc::new(MockStore::new());
        let hackathon: Hackathon = serde_json::from_value(serde_json::Value::Object(active_row())).unwrap();
        mapper(store.clone()).get_by_pin(5, &hackathon).await.unwrap();
        let query = &store.queries()[0];
        assert_eq!(query.text, "SELECT * FROM `REGISTRATION` WHERE (hackathon = ?) AND (pin = ?);");
        assert_eq!(query.values, vec![SqlParam::Text("h1".into()), SqlParam::Int(105)]);
    }

    #[tokio::test]
    async fn update_of_unknown_registration_is_404() {
        let store = Arc::new(MockStore::new());
        let mut unknown = registration();
        unknown.uid = Some("u404".into());
        unknown.hackathon = Some("h1".into());
        let err = mapper(store.clone()).update(unknown).await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(store.queries_starting_with("UPDATE").is_empty());
    }

    #[tokio::test]
    async fn email_lookup_returns_bare_address() {
        let store = Arc::new(MockStore::new().respond(|_| {
            Ok(vec![json!({"email": "ada@example.com"}).as_object().cloned().unwrap_or_default()])
        }));
        let email = mapper(store).get_email_by_uid("u1").await.unwrap().data;
        assert_eq!(email.as_deref(), Some("ada@example.com"));
    }
}
