//! Data mapper for submitted projects (`PROJECTS`). Team and table
//! assignment run through the `assignTeam`/`assignTable` stored
//! procedures, whose out-parameters are read back in the same transaction.

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;
use serde_json::Value;

use crate::error::DbError;
use crate::mapper::{ensure_valid, update_fields, with_fields, with_page, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::project::{join_ids, Project};
use crate::opts::UowOpts;
use crate::query::{Delete, ParamQuery, QuoteOptions, Select, Update};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};
use crate::Record;

pub const TABLE_NAME: &str = "PROJECTS";

pub struct ProjectMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
}

impl ProjectMapper {
    pub const COUNT: &'static str = "project:count";
    pub const CREATE: &'static str = "project:create";
    pub const DELETE: &'static str = "project:delete";
    pub const READ: &'static str = "project:read";
    pub const READ_ALL: &'static str = "project:readall";
    pub const UPDATE: &'static str = "project:update";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(&[Self::DELETE], &[AuthLevel::Technology], None, &[AuthLevel::Director]);
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

    /// Assign a table to a stored project, seeded by its lowest category.
    pub async fn assign_table(&self, project: &Project) -> DbResult<i64> {
        let Some(uid) = &project.uid else {
            return Err(CoreError::validation("data.uid is required").into());
        };
        let Some(category) = project.categories.iter().min() else {
            return Err(CoreError::validation("data.categories should NOT have fewer than 1 items").into());
        };
        let statements = [
            ParamQuery::raw(
                "CALL assignTable(?,?,@tableNumber_out);",
                vec![uid.into(), (*category).into()],
            ),
            ParamQuery::raw("SELECT @tableNumber_out as table_number;", vec![]),
        ];
        let results = self.sql.transaction(&statements).await?;
        let table = out_parameter(&results, "table_number")
            .and_then(|value| match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| DbError::from(CoreError::http(500, "table assignment returned no table")))?;
        tracing::info!(project = %uid, table, "Assigned project table");
        Ok(DbResponse::success(table))
    }
}

/// Value of `column` in the first row of the last statement's result.
fn out_parameter<'a>(results: &'a [Vec<Record>], column: &str) -> Option<&'a Value> {
    results
        .last()
        .and_then(|rows| rows.first())
        .and_then(|row| row.get(column))
        .filter(|value| !value.is_null())
}

impl AclPerm for ProjectMapper {
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
impl DataMapper for ProjectMapper {
    type Entity = Project;
    type Id = str;

    fn table_name(&self) -> &'static str {
        TABLE_NAME
    }

    async fn get(&self, id: &str, opts: &UowOpts) -> DbResult<Option<Project>> {
        let query = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .filter("uid = ?", id)
            .to_param()
            .terminated();
        let project = self.sql.query_one(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(project))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Project>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = with_fields(Select::new(QuoteOptions::ALL).from(TABLE_NAME), opts)
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()));
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, opts: &UowOpts) -> DbResult<i64> {
        let hackathon = self.hackathons.scope(opts).await?;
        let query = Select::new(QuoteOptions::TABLES)
            .from(TABLE_NAME)
            .field_as("COUNT(uid)", "project_count")
            .when(hackathon.is_some(), |q| q.filter("hackathon = ?", hackathon.clone()))
            .to_param()
            .terminated();
        let count = self.sql.count(&query, QueryOpts::cached(!opts.ignore_cache)).await?;
        Ok(DbResponse::success(count))
    }

    /// Creates the project and its team rows through `assignTeam`, then
    /// returns the project with its generated id.
    async fn insert(&self, mut object: Project) -> DbResult<Project> {
        ensure_valid(&object, "adding")?;
        let statements = [
            ParamQuery::raw(
                "CALL assignTeam (?,?,?,@projectID_out);",
                vec![
                    object.project_name.as_str().into(),
                    object.team.join(",").into(),
                    join_ids(&object.categories).into(),
                ],
            ),
            ParamQuery::raw("SELECT @projectID_out as projectID;", vec![]),
        ];
        let results = self.sql.transaction(&statements).await?;
        object.uid = out_parameter(&results, "projectID").map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: Project) -> DbResult<Project> {
        ensure_valid(&object, "updating")?;
        let query = Update::table(QuoteOptions::ALL, TABLE_NAME)
            .set_fields(&update_fields(&object, "uid")?)
            .filter("uid = ?", object.uid.clone())
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
    use serde_json::json;

    use super::*;
    use crate::cache::NoCache;
    use crate::query::SqlParam;
    use crate::store::MockStore;

    fn mapper(store: Arc<MockStore>) -> ProjectMapper {
        let acl: Arc<dyn AclRegistry> = Arc::new(Rbac::new());
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        let hackathons = Arc::new(HackathonMapper::new(acl.clone(), sql.clone()));
        ProjectMapper::new(acl, sql, hackathons)
    }

    fn project() -> Project {
        Project {
            uid: None,
            project_name: "Lighthouse".into(),
            team: vec!["u1".into(), "u2".into()],
            categories: vec![3, 1],
            hackathon: None,
            table_number: None,
        }
    }

    fn out_row(column: &str, value: Value) -> Record {
        let mut row = Record::new();
        row.insert(column.into(), value);
        row
    }

    #[tokio::test]
    async fn insert_calls_assign_team_and_reads_back_the_id() {
        let store = Arc::new(MockStore::new().respond(|q| {
            if q.text.starts_with("SELECT @projectID_out") {
                Ok(vec![out_row("projectID", json!(42))])
            } else {
                Ok(vec![])
            }
        }));
        let inserted = mapper(store.clone()).insert(project()).await.unwrap().data;
        assert_eq!(inserted.uid.as_deref(), Some("42"));

        let executed = store.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0].transaction, executed[1].transaction);
        assert_eq!(executed[0].query.text, "CALL assignTeam (?,?,?,@projectID_out);");
        assert_eq!(
            executed[0].query.values,
            vec![
                SqlParam::Text("Lighthouse".into()),
                SqlParam::Text("u1,u2".into()),
                SqlParam::Text("3,1".into()),
            ]
        );
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn assign_table_uses_lowest_category() {
        let store = Arc::new(MockStore::new().respond(|q| {
            if q.text.starts_with("SELECT @tableNumber_out") {
                Ok(vec![out_row("table_number", json!("17"))])
            } else {
                Ok(vec![])
            }
        }));
        let stored = Project {
            uid: Some("p1".into()),
            ..project()
        };
        let table = mapper(store.clone()).assign_table(&stored).await.unwrap();
        assert_eq!(table.data, 17);
        assert_eq!(
            store.queries()[0].values,
            vec![SqlParam::Text("p1".into()), SqlParam::Int(1)]
        );
    }

    #[tokio::test]
    async fn assign_table_requires_a_stored_project() {
        let store = Arc::new(MockStore::new());
        let err = mapper(store.clone()).assign_table(&project()).await.unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn count_is_scoped_when_asked() {
        let store = Arc::new(MockStore::new());
        mapper(store.clone())
            .get_count(&UowOpts::new().hackathon("h1"))
            .await
            .unwrap();
        assert_eq!(
            store.queries()[0].text,
            "SELECT COUNT(uid) AS \"project_count\" FROM `PROJECTS` WHERE (hackathon = ?);"
        );
    }

    #[test]
    fn deletion_needs_technology() {
        let mapper = mapper(Arc::new(MockStore::new()));
        assert!(mapper.acl().can("TECHNOLOGY", ProjectMapper::DELETE, None));
        assert!(!mapper.acl().can("DIRECTOR", ProjectMapper::DELETE, None));
        assert!(mapper.acl().can("VOLUNTEER", ProjectMapper::READ_ALL, None));
    }
}
