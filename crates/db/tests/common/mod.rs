#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hackpsu_core::acl::Rbac;
use hackpsu_db::cache::NoCache;
use hackpsu_db::directory::MemoryDirectory;
use hackpsu_db::live::MemoryLiveStore;
use hackpsu_db::mappers::DataMappers;
use hackpsu_db::store::MockStore;
use hackpsu_db::uow::MysqlUow;
use hackpsu_db::Record;
use serde_json::json;

/// A `HACKATHON` row flagged active.
pub fn active_row(uid: &str) -> Record {
    json!({"uid": uid, "name": "HackPSU", "start_time": "1000", "end_time": null, "base_pin": "0", "active": 1})
        .as_object()
        .cloned()
        .unwrap_or_default()
}

/// A store that answers reads of `HACKATHON` with one active row and every
/// other statement with nothing.
pub fn store_with_active(uid: &'static str) -> MockStore {
    MockStore::new().respond(move |q| {
        if q.text.starts_with("SELECT * FROM `HACKATHON`") {
            Ok(vec![active_row(uid)])
        } else {
            Ok(vec![])
        }
    })
}

/// Same as [`store_with_active`], answering slowly.
pub fn slow_store_with_active(uid: &'static str) -> MockStore {
    store_with_active(uid).with_delay(Duration::from_millis(50))
}

/// Every mapper over `store`, without a result cache.
pub fn mappers(store: Arc<MockStore>) -> DataMappers {
    let sql = Arc::new(MysqlUow::new(store, Arc::new(NoCache)));
    DataMappers::new(
        Arc::new(Rbac::new()),
        sql,
        Arc::new(MemoryDirectory::new()),
        Arc::new(MemoryLiveStore::new()),
    )
}
