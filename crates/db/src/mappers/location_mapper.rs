//! Data mapper for event venues (`LOCATIONS`).

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::models::location::Location;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "LOCATIONS";

pub struct LocationMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
}

impl LocationMapper {
    pub const COUNT: &'static str = "location:count";
    pub const CREATE: &'static str = "location:create";
    pub const DELETE: &'static str = "location:delete";
    pub const READ: &'static str = "location:read";
    pub const READ_ALL: &'static str = "location:readall";
    pub const UPDATE: &'static str = "location:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>) -> Self {
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
        Self { base, sql }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }
}

impl AclPerm for LocationMapper {
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
impl DataMapper for LocationMapper {
    type Entity = Location;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<Location>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", id)
            .to_param()
            .terminated();
        let location = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(location))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Location>> {
        let select = with_fields(
            Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "location"),
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

    async fn insert(&self, object: Location) -> DbResult<Location> {
        ensure_valid(&object, "adding")?;
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: Location) -> DbResult<Location> {
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

    use super::*;
    use crate::cache::NoCache;
    use crate::query::SqlParam;
    use crate::store::MockStore;

    fn mapper(store: Arc<MockStore>) -> LocationMapper {
        LocationMapper::new(Arc::new(Rbac::new()), Arc::new(MysqlUow::new(store, Arc::new(NoCache))))
    }

    #[tokio::test]
    async fn insert_writes_only_present_columns() {
        let store = Arc::new(MockStore::new());
        let location = Location {
            uid: None,
            location_name: "Business Building 110".into(),
        };
        mapper(store.clone()).insert(location).await.unwrap();
        let query = &store.queries()[0];
        assert_eq!(query.text, "INSERT INTO `LOCATIONS` (`location_name`) VALUES (?);");
        assert_eq!(query.values, vec![SqlParam::Text("Business Building 110".into())]);
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let store = Arc::new(MockStore::new());
        let err = mapper(store.clone())
            .insert(Location {
                uid: None,
                location_name: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(store.queries().is_empty());
    }

    #[test]
    fn volunteers_inherit_nothing_upwards() {
        let mapper = mapper(Arc::new(MockStore::new()));
        assert!(mapper.acl().can("PARTICIPANT", LocationMapper::READ_ALL, None));
        assert!(mapper.acl().can("TEAM_MEMBER", LocationMapper::CREATE, None));
        assert!(!mapper.acl().can("VOLUNTEER", LocationMapper::CREATE, None));
    }
}
