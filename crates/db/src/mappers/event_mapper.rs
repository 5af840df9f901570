//! Data mapper for scheduled events (`EVENTS`). Listings join
//! `LOCATIONS` for the venue name and are ordered by start time.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;
use hackpsu_core::types::CompoundId;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::{self, HackathonMapper};
use crate::mappers::location_mapper;
use crate::models::event::Event;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "EVENTS";

pub struct EventMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl EventMapper {
    pub const COUNT: &'static str = "event:count";
    pub const CREATE: &'static str = "event:create";
    pub const DELETE: &'static str = "event:delete";
    pub const READ: &'static str = "event:read";
    pub const READ_ALL: &'static str = "event:readall";
    pub const UPDATE: &'static str = "event:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::CREATE, Self::UPDATE, Self::DELETE],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        base.add_rbac(
            &[Self::READ, Self::READ_ALL, Self::COUNT],
            &[AuthLevel::Participant],
            None,
            &[],
        );
        Self { base, sql, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }
}

impl AclPerm for EventMapper {
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
impl DataMapper for EventMapper {
    type Entity = Event;
    type Id = CompoundId;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    /// Event `id.uid` within `id.hackathon`, defaulting to the active
    /// hackathon.
    async fn get(&self, id: &CompoundId, opts: &UowOpts) -> DbResult<Option<Event>> {
        let hackathon = self.hackathons.resolve(id.hackathon.as_deref()).await?;
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", &id.uid)
            .filter("hackathon = ?", hackathon)
            .to_param()
            .terminated();
        let event = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(event))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Event>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = Select::new(QuoteOptions::ALL)
            .from_as(TABLE_NAME, "event")
            .field("event.*")
            .field("location.location_name")
            .join(location_mapper::TABLE_NAME, "location", "event_location=location.uid");
        let select = with_fields(select, opts)
            .when(hackathon.is_some(), |q| {
                q.join(hackathon_mapper::TABLE_NAME, "h", "h.uid = event.hackathon")
                    .filter("h.uid = ?", hackathon.clone())
            })
            .order("event_start_time", true);
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

    /// Events without a hackathon are scheduled into the active one.
    async fn insert(&self, object: Event) -> DbResult<Event> {
        ensure_valid(&object, "adding")?;
        let mut insert = Insert::into(QuoteOptions::ALL, TABLE_NAME).set_fields_rows(&[object.db_representation()?]);
        let hackathon = match object.hackathon.clone() {
            Some(hackathon) => hackathon,
            None => {
                let active = self.hackathons.active_uid().await?;
                insert = insert.set("hackathon", &active);
                active
            }
        };
        self.sql.query(&insert.to_param().terminated(), QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(Event {
            hackathon: Some(hackathon),
            ..object
        }))
    }

    async fn update(&self, object: Event) -> DbResult<Event> {
        ensure_valid(&object, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&object, "uid")?)
            .filter("uid = ?", &object.uid)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
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

    use super::*;
    use crate::cache::NoCache;
    use crate::models::event::EventType;
    use crate::query::SqlParam;
    use crate::store::MockStore;

    fn mapper(store: Arc<MockStore>) -> EventMapper {
        let acl: Arc<dyn AclRegistry> = Arc::new(Rbac::new());
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        let hackathons = Arc::new(HackathonMapper::new(acl.clone(), sql.clone()));
        EventMapper::new(acl, sql, hackathons)
    }

    fn event() -> Event {
        Event {
            uid: "e1".into(),
            event_location: 3,
            event_start_time: 100,
            event_end_time: 200,
            event_title: "Intro to Rust".into(),
            event_description: None,
            event_type: EventType::Workshop,
            hackathon: Some("h1".into()),
            ws_presenter_names: None,
            ws_skill_level: None,
            ws_relevant_skills: None,
            ws_urls: Some(vec!["https://example.com/slides".into()]),
            event_icon: None,
            location_name: Some("HUB".into()),
        }
    }

    #[tokio::test]
    async fn get_all_joins_locations_and_orders_by_start() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .get_all(&UowOpts::new().hackathon("h1"))
            .await
            .unwrap();
        let query = &store.queries()[0];
        assert_eq!(
            query.text,
            "SELECT `event`.*, `location`.`location_name` FROM `EVENTS` `event` \
             INNER JOIN `LOCATIONS` `location` ON (event_location=location.uid) \
             INNER JOIN `HACKATHON` `h` ON (h.uid = event.hackathon) \
             WHERE (h.uid = ?) ORDER BY event_start_time ASC;"
        );
        assert_eq!(query.values, vec![SqlParam::Text("h1".into())]);
    }

    #[tokio::test]
    async fn update_never_writes_joined_columns() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone()).update(event()).await.unwrap();
        let text = &store.queries()[0].text;
        assert!(!text.contains("location_name"));
        assert!(!text.contains("ws_urls"));
        assert!(text.ends_with("WHERE (uid = ?);"));
    }

    #[tokio::test]
    async fn delete_is_scoped_to_explicit_hackathon() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .delete(&CompoundId::new("e1", Some("h1".into())))
            .await
            .unwrap();
        let query = &store.queries()[0];
        assert_eq!(query.text, "DELETE FROM `EVENTS` WHERE (uid = ?) AND (hackathon = ?);");
        assert_eq!(
            query.values,
            vec![SqlParam::Text("e1".into()), SqlParam::Text("h1".into())]
        );
    }
}
