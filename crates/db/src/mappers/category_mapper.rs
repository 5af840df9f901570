//! Data mapper for prize categories (`CATEGORY_LIST`).

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::models::category::Category;
use crate::opts::UowOpts;
use crate::query::{Delete, Insert, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const TABLE_NAME: &str = "CATEGORY_LIST";

pub struct CategoryMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
}

impl CategoryMapper {
    pub const COUNT: &'static str = "category:count";
    pub const CREATE: &'static str = "category:create";
    pub const DELETE: &'static str = "category:delete";
    pub const READ: &'static str = "category:read";
    pub const READ_ALL: &'static str = "category:readall";
    pub const UPDATE: &'static str = "category:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::READ, Self::READ_ALL, Self::COUNT],
            &[AuthLevel::TeamMember],
            None,
            &[],
        );
        base.add_rbac(
            &[Self::CREATE, Self::UPDATE, Self::DELETE],
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

impl AclPerm for CategoryMapper {
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
impl DataMapper for CategoryMapper {
    type Entity = Category;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<Category>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid= ?", id)
            .to_param()
            .terminated();
        let category = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(category))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Category>> {
        let select = with_fields(
            Select::new(QuoteOptions::ALL).from_as(TABLE_NAME, "category"),
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

    async fn insert(&self, object: Category) -> DbResult<Category> {
        ensure_valid(&object, "adding")?;
        let query = Insert::into(QuoteOptions::ALL, TABLE_NAME)
            .set_fields_rows(&[object.db_representation()?])
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: Category) -> DbResult<Category> {
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

    fn mapper(store: Arc<MockStore>) -> CategoryMapper {
        CategoryMapper::new(Arc::new(Rbac::new()), Arc::new(MysqlUow::new(store, Arc::new(NoCache))))
    }

    #[tokio::test]
    async fn get_all_uses_table_alias_and_paging() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .get_all(&UowOpts::new().start_at(10).count(5))
            .await
            .unwrap();
        assert_eq!(
            store.queries()[0].text,
            "SELECT * FROM `CATEGORY_LIST` `category` LIMIT 5 OFFSET 10;"
        );
    }

    #[tokio::test]
    async fn update_sets_everything_but_the_key() {
        let store = Arc::new(MockStore::new());
        let category = Category {
            uid: Some(3),
            category_name: "Best Hardware".into(),
            is_sponsor: true,
        };
        mapper(store.clone()).update(category).await.unwrap();
        let query = &store.queries()[0];
        assert_eq!(
            query.text,
            "UPDATE `CATEGORY_LIST` SET `category_name` = ?, `is_sponsor` = ? WHERE (uid = ?);"
        );
        assert_eq!(
            query.values,
            vec![SqlParam::Text("Best Hardware".into()), SqlParam::Bool(true), SqlParam::Int(3)]
        );
    }
}
