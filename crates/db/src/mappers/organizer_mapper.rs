//! Data mapper for the staff roster (`ORGANIZERS`). Organizers are not
//! scoped to a hackathon.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::models::organizer::Organizer;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "ORGANIZERS";

pub struct OrganizerMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
}

impl OrganizerMapper {
    pub const COUNT: &'static str = "organizer:count";
    pub const CREATE: &'static str = "organizer:create";
    pub const DELETE: &'static str = "organizer:delete";
    pub const READ: &'static str = "organizer:read";
    pub const READ_ALL: &'static str = "organizer:readall";
    pub const UPDATE: &'static str = "organizer:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(&[Self::DELETE], &[AuthLevel::Technology], None, &[AuthLevel::Director]);
        base.add_rbac(&[Self::COUNT], &[AuthLevel::TeamMember], None, &[AuthLevel::Volunteer]);
        base.add_rbac(&[Self::READ_ALL], &[AuthLevel::Director], None, &[AuthLevel::TeamMember]);
        base.add_rbac(&[Self::READ], &[AuthLevel::TeamMember], None, &[AuthLevel::Volunteer]);
        base.add_rbac(
            &[Self::CREATE, Self::UPDATE],
            &[AuthLevel::Director],
            None,
            &[AuthLevel::TeamMember],
        );
        Self { base, sql }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }
}

impl AclPerm for OrganizerMapper {
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
impl DataMapper for OrganizerMapper {
    type Entity = Organizer;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<Organizer>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid = ?", id)
            .to_param()
            .terminated();
        let organizer = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(organizer))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Organizer>> {
        let select = Select::new(QuoteOptions::ALL).from(TABLE_NAME);
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64> {
        let query = Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(uid)", "organizer_count")
            .to_param()
            .terminated();
        let count = self.sql.count(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(count))
    }

    async fn insert(&self, object: Organizer) -> DbResult<Organizer> {
        ensure_valid(&object, "adding")?;
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: Organizer) -> DbResult<Organizer> {
        ensure_valid(&object, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&object, "uid")?)
            .filter("uid = ?", &object.uid)
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

    fn mapper(store: Arc<MockStore>) -> OrganizerMapper {
        let acl: Arc<dyn AclRegistry> = Arc::new(Rbac::new());
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        OrganizerMapper::new(acl, sql)
    }

    fn organizer() -> Organizer {
        Organizer {
            uid: "o1".into(),
            firstname: "Nittany".into(),
            lastname: "Lion".into(),
            email: "lion@psu.edu".into(),
            privilege: Some(3),
        }
    }

    #[tokio::test]
    async fn get_is_unscoped() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone()).get("o1", &UowOpts::new()).await.unwrap();
        let query = &store.queries()[0];
        assert_eq!(query.text, "SELECT * FROM `ORGANIZERS` WHERE (uid = ?);");
        assert_eq!(query.values, vec![SqlParam::Text("o1".into())]);
    }

    #[tokio::test]
    async fn update_sets_everything_but_the_key() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone()).update(organizer()).await.unwrap();
        assert_eq!(
            store.queries()[0].text,
            "UPDATE `ORGANIZERS` SET `firstname` = ?, `lastname` = ?, `email` = ?, `privilege` = ? WHERE (uid = ?);"
        );
    }

    #[tokio::test]
    async fn invalid_organizer_never_reaches_the_store() {
        let store = Arc::new(MockStore::new());
        let bad = Organizer {
            firstname: String::new(),
            ..organizer()
        };
        let err = mapper(store.clone()).insert(bad).await.unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(store.queries().is_empty());
    }

    #[test]
    fn only_technology_deletes() {
        let mapper = mapper(Arc::new(MockStore::new()));
        let acl = mapper.acl();
        assert!(acl.can("TECHNOLOGY", OrganizerMapper::DELETE, None));
        assert!(acl.can("TECHNOLOGY", OrganizerMapper::CREATE, None));
        assert!(!acl.can("DIRECTOR", OrganizerMapper::DELETE, None));
        assert!(acl.can("TEAM_MEMBER", OrganizerMapper::READ, None));
    }
}
