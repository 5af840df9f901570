//! Live announcements. Stored in the [`LiveStore`] rather than MySQL,
//! one document per update under `<hackathon>/<uid>` of the active
//! hackathon.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::error::CoreError;
use hackpsu_core::roles::AuthLevel;

use crate::entity::Entity;
use crate::error::DbError;
use crate::live::{LiveStore, LiveStoreError};
use crate::mapper::{ensure_valid, update_fields, DataMapper, GenericDataMapper};
use crate::mappers::hackathon_mapper::HackathonMapper;
use crate::models::update::Update;
use crate::opts::UowOpts;
use crate::response::{DbResponse, DbResult, Listing};

pub struct UpdateMapper {
    base: GenericDataMapper,
    live: Arc<dyn LiveStore>,
    hackathons: Arc<HackathonMapper>,
}

impl UpdateMapper {
    pub const COUNT: &'static str = "update:count";
    pub const CREATE: &'static str = "update:create";
    pub const DELETE: &'static str = "update:delete";
    pub const READ: &'static str = "update:read";
    pub const READ_ALL: &'static str = "update:readall";
    pub const UPDATE: &'static str = "update:update";

    pub fn new(acl: Arc<dyn AclRegistry>, live: Arc<dyn LiveStore>, hackathons: Arc<HackathonMapper>) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(
            &[Self::CREATE, Self::UPDATE, Self::DELETE],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        base.add_rbac(
            &[Self::READ_ALL, Self::READ, Self::COUNT],
            &[AuthLevel::Participant],
            None,
            &[],
        );
        Self { base, live, hackathons }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// Address clients subscribe to for the active hackathon's updates.
    pub async fn get_reference(&self) -> DbResult<String> {
        let parent = self.hackathons.active_uid().await?;
        Ok(DbResponse::success(self.live.reference(&parent)))
    }

    async fn path(&self, uid: &str) -> Result<String, DbError> {
        Ok(format!("{}/{uid}", self.hackathons.active_uid().await?))
    }
}

fn unavailable(err: LiveStoreError) -> DbError {
    tracing::error!(error = %err, "Live store failure");
    CoreError::http(500, err.to_string()).into()
}

impl AclPerm for UpdateMapper {
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
impl DataMapper for UpdateMapper {
    type Entity = Update;
    type Id = str;

    fn table_name(&self) -> &'static str {
        "updates"
    }

    async fn get(&self, id: &str, _opts: &UowOpts) -> DbResult<Option<Update>> {
        let path = self.path(id).await?;
        let update = self
            .live
            .get(&path)
            .await
            .map_err(unavailable)?
            .map(Update::from_row)
            .transpose()?;
        Ok(DbResponse::success(update))
    }

    async fn get_all(&self, opts: &UowOpts) -> DbResult<Listing<Update>> {
        let parent = self.hackathons.active_uid().await?;
        let documents = self.live.list(&parent).await.map_err(unavailable)?;
        let listing = if opts.stream {
            Listing::Lazy(stream::iter(documents).map(Update::from_row).boxed())
        } else {
            Listing::Materialized(
                documents
                    .into_iter()
                    .map(Update::from_row)
                    .collect::<Result<_, _>>()?,
            )
        };
        Ok(DbResponse::success(listing))
    }

    async fn get_count(&self, _opts: &UowOpts) -> DbResult<i64> {
        let parent = self.hackathons.active_uid().await?;
        let count = self.live.count(&parent).await.map_err(unavailable)?;
        Ok(DbResponse::success(count))
    }

    /// Stores the update under a fresh time-ordered id.
    async fn insert(&self, mut object: Update) -> DbResult<Update> {
        ensure_valid(&object, "adding")?;
        let uid = uuid::Uuid::now_v7().to_string();
        object.uid = Some(uid.clone());
        let path = self.path(&uid).await?;
        self.live
            .set(&path, object.db_representation()?)
            .await
            .map_err(unavailable)?;
        tracing::info!(path = %path, push = object.push_notification, "Published update");
        Ok(DbResponse::success(object))
    }

    async fn update(&self, object: Update) -> DbResult<Update> {
        ensure_valid(&object, "updating")?;
        let Some(uid) = object.uid.as_deref() else {
            return Err(CoreError::validation("data.uid is required").into());
        };
        let path = self.path(uid).await?;
        self.live
            .update(&path, update_fields(&object, "uid")?)
            .await
            .map_err(unavailable)?;
        Ok(DbResponse::success(object))
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let path = self.path(id).await?;
        self.live.delete(&path).await.map_err(unavailable)?;
        Ok(DbResponse::success(()))
    }
}

#[cfg(test)]
mod tests {
    use hackpsu_core::acl::Rbac;
    use serde_json::json;

    use super::*;
    use crate::cache::NoCache;
    use crate::live::MemoryLiveStore;
    use crate::store::MockStore;
    use crate::uow::MysqlUow;

    fn mapper() -> (UpdateMapper, Arc<MemoryLiveStore>) {
        let store = Arc::new(MockStore::new().respond(|_| {
            Ok(vec![json!({"uid": "h1", "name": "HackPSU", "active": 1})
                .as_object()
                .cloned()
                .unwrap_or_default()])
        }));
        let acl: Arc<dyn AclRegistry> = Arc::new(Rbac::new());
        let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
        let hackathons = Arc::new(HackathonMapper::new(acl.clone(), sql));
        let live = Arc::new(MemoryLiveStore::new());
        (UpdateMapper::new(acl, live.clone(), hackathons), live)
    }

    fn update() -> Update {
        Update {
            uid: None,
            update_title: "Dinner".into(),
            update_text: "Pizza in the HUB".into(),
            update_image: None,
            update_time: 1_000,
            push_notification: true,
        }
    }

    #[tokio::test]
    async fn insert_files_under_active_hackathon_without_push_flag() {
        let (mapper, live) = mapper();
        let inserted = mapper.insert(update()).await.unwrap().data;
        let uid = inserted.uid.clone().unwrap_or_default();
        assert!(!uid.is_empty());

        let stored = live.get(&format!("h1/{uid}")).await.unwrap().unwrap_or_default();
        assert_eq!(stored["update_title"], "Dinner");
        assert!(!stored.contains_key("push_notification"));

        let fetched = mapper.get(&uid, &UowOpts::new()).await.unwrap().data;
        assert_eq!(fetched.map(|u| u.update_text), Some("Pizza in the HUB".to_string()));
        assert_eq!(mapper.get_count(&UowOpts::new()).await.unwrap().data, 1);
    }

    #[tokio::test]
    async fn update_overlays_and_delete_removes() {
        let (mapper, _) = mapper();
        let inserted = mapper.insert(update()).await.unwrap().data;
        let uid = inserted.uid.clone().unwrap_or_default();
        mapper
            .update(Update {
                update_text: "Pizza moved to Business".into(),
                ..inserted
            })
            .await
            .unwrap();
        let all = mapper.get_all(&UowOpts::new()).await.unwrap().data.collect().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].update_text, "Pizza moved to Business");

        mapper.delete(&uid).await.unwrap();
        assert_eq!(mapper.get(&uid, &UowOpts::new()).await.unwrap().data, None);
    }

    #[tokio::test]
    async fn update_without_uid_is_rejected() {
        let (mapper, _) = mapper();
        let err = mapper.update(update()).await.unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn reference_names_active_hackathon() {
        let (mapper, _) = mapper();
        assert_eq!(mapper.get_reference().await.unwrap().data, "memory:///h1");
    }
}
