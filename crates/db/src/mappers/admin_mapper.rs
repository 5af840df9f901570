//! Administrative operations: email delivery history, account lookup and
//! privilege changes through the [`AuthDirectory`].

use std::sync::Arc;

use async_trait::async_trait;
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;

use crate::directory::AuthDirectory;
use crate::entity::Entity;
use crate::error::DbError;
use crate::mapper::{not_supported, DataMapper, GenericDataMapper};
use crate::models::admin::{DirectoryUser, EmailHistory};
use crate::opts::UowOpts;
use crate::query::{Insert, QuoteOptions};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

pub const EMAIL_HISTORY_TABLE: &str = "EMAIL_HISTORY";

pub struct AdminMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    directory: Arc<dyn AuthDirectory>,
}

impl AdminMapper {
    pub const CREATE: &'static str = "admin:create";
    pub const GET_EMAIL: &'static str = "admin:get_email";
    pub const MAKE_ACTIVE: &'static str = "admin:make_active";
    pub const REDUCE_PERMISSION: &'static str = "admin:reduce_perm";
    pub const SEND_EMAIL: &'static str = "admin:send_email";

    pub fn new(acl: Arc<dyn AclRegistry>, sql: Arc<MysqlUow>, directory: Arc<dyn AuthDirectory>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::GET_EMAIL, Self::SEND_EMAIL, Self::CREATE, Self::MAKE_ACTIVE],
            &[AuthLevel::Director],
            None,
            &[AuthLevel::TeamMember],
        );
        base.add_rbac(
            &[Self::REDUCE_PERMISSION],
            &[AuthLevel::Technology],
            None,
            &[AuthLevel::Director],
        );
        Self { base, sql, directory }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    pub async fn get_email_from_id(&self, id: &str) -> DbResult<DirectoryUser> {
        let user = self
            .directory
            .lookup(id)
            .await
            .map_err(|err| DbError::from(CoreError::http(err.status(), err.to_string())))?;
        Ok(DbResponse::success(user))
    }

    /// Record delivered and failed messages in one multi-row insert.
    pub async fn add_email_history(&self, successful: &[EmailHistory], failed: &[EmailHistory]) -> DbResult<()> {
        let rows = successful
            .iter()
            .chain(failed)
            .map(Entity::db_representation)
            .collect::<Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Ok(DbResponse::success(()));
        }
        let query = Insert::into(QuoteOptions::ALL, EMAIL_HISTORY_TABLE)
            .set_fields_rows(&rows)
            .to_param()
            .terminated();
        self.sql.query(&query, QueryOpts::UNCACHED).await?;
        tracing::info!(delivered = successful.len(), failed = failed.len(), "Recorded email history");
        Ok(DbResponse::success(()))
    }

    /// Set the privilege of the account `identifier` names. Lowering an
    /// existing privilege needs [`Self::REDUCE_PERMISSION`] for `caller`.
    pub async fn modify_permissions(&self, identifier: &str, level: AuthLevel, caller: AuthLevel) -> DbResult<()> {
        let user = self.directory.lookup(identifier).await.map_err(|err| {
            tracing::warn!(identifier, error = %err, "Directory lookup failed");
            DbError::from(CoreError::validation(
                "Could not retrieve user record. Did you provide a valid identifier?",
            ))
        })?;
        let reduces = user
            .privilege
            .is_some_and(|current| level.privilege() < current.privilege());
        if reduces && !self.acl().can(caller.as_str(), Self::REDUCE_PERMISSION, None) {
            return Err(CoreError::validation("You do not have permission to reduce someone else's permission").into());
        }
        self.directory
            .elevate(&user.uid, level)
            .await
            .map_err(|err| DbError::from(CoreError::http(err.status(), err.to_string())))?;
        tracing::info!(uid = %user.uid, level = %level, "Modified permissions");
        Ok(DbResponse::success(()))
    }
}

impl AclPerm for AdminMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Create => Some(Self::CREATE),
            AclOperation::GetEmail => Some(Self::GET_EMAIL),
            AclOperation::MakeActive => Some(Self::MAKE_ACTIVE),
            AclOperation::ReducePermission => Some(Self::REDUCE_PERMISSION),
            AclOperation::SendEmail => Some(Self::SEND_EMAIL),
            _ => None,
        }
    }
}

#[async_trait]
impl DataMapper for AdminMapper {
    type Entity = EmailHistory;
    type Id = str;

    fn table_name(&self) -> &'static str {
        EMAIL_HISTORY_TABLE
    }

    async fn get(&self, _id: &str, _opts: &UowOpts) -> DbResult<Option<EmailHistory>> {
        not_supported()
    }

    async fn get_all(&self, _opts: &UowOpts) -> DbResult<Listing<EmailHistory>> {
        not_supported()
    }

    async fn get_count(&self, _opts: &UowOpts) -> DbResult<i64> {
        not_supported()
    }

    async fn insert(&self, _object: EmailHistory) -> DbResult<EmailHistory> {
        not_supported()
    }

    async fn update(&self, _object: EmailHistory) -> DbResult<EmailHistory> {
        not_supported()
    }

    async fn delete(&self, _id: &str) -> DbResult<()> {
        not_supported()
    }
}

#[cfg(test)]
mod tests {
    use hackpsu_core::acl::Rbac;

    use super::*;
    use crate::cache::NoCache;
    use crate::directory::MemoryDirectory;
    use crate::store::MockStore;

    async fn mapper(store: Arc<MockStore>) -> (AdminMapper, Arc<MemoryDirectory>) {
        let directory = Arc::new(MemoryDirectory::new());
        directory
            .insert(DirectoryUser {
                uid: "u1".into(),
                email: Some("u1@psu.edu".into()),
                privilege: Some(AuthLevel::TeamMember),
            })
            .await;
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        let mapper = AdminMapper::new(Arc::new(Rbac::new()), sql, directory.clone());
        (mapper, directory)
    }

    #[tokio::test]
    async fn email_history_is_one_insert() {
        let store = Arc::new(MockStore::new());
        let (mapper, _) = mapper(store.clone()).await;
        let delivered = EmailHistory::delivered("admin", "a@psu.edu", "<p>hi</p>", "Hello", None);
        let failed = EmailHistory::delivered("admin", "b@psu.edu", "<p>hi</p>", "Hello", Some("B".into()))
            .failed("mailbox full");
        mapper.add_email_history(&[delivered], &[failed]).await.unwrap();
        let queries = store.queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].text.starts_with("INSERT INTO `EMAIL_HISTORY` ("));
        assert!(!queries[0].text.contains("`error`"));
    }

    #[tokio::test]
    async fn empty_history_skips_the_store() {
        let store = Arc::new(MockStore::new());
        let (mapper, _) = mapper(store.clone()).await;
        mapper.add_email_history(&[], &[]).await.unwrap();
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn unknown_identifier_is_bad_input() {
        let (mapper, _) = mapper(Arc::new(MockStore::new())).await;
        let err = mapper
            .modify_permissions("ghost", AuthLevel::Volunteer, AuthLevel::Technology)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(
            err.to_string(),
            "Could not retrieve user record. Did you provide a valid identifier?"
        );
    }

    #[tokio::test]
    async fn directors_cannot_reduce() {
        let (mapper, directory) = mapper(Arc::new(MockStore::new())).await;
        let err = mapper
            .modify_permissions("u1@psu.edu", AuthLevel::Volunteer, AuthLevel::Director)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(
            directory.lookup("u1").await.unwrap().privilege,
            Some(AuthLevel::TeamMember)
        );
    }

    #[tokio::test]
    async fn technology_reduces_and_directors_elevate() {
        let (mapper, directory) = mapper(Arc::new(MockStore::new())).await;
        mapper
            .modify_permissions("u1", AuthLevel::Volunteer, AuthLevel::Technology)
            .await
            .unwrap();
        assert_eq!(directory.lookup("u1").await.unwrap().privilege, Some(AuthLevel::Volunteer));
        mapper
            .modify_permissions("u1", AuthLevel::Director, AuthLevel::Director)
            .await
            .unwrap();
        assert_eq!(directory.lookup("u1").await.unwrap().privilege, Some(AuthLevel::Director));
    }
}
