//! InMemoryTaskStorage - 開発用・テスト用のストレージ
//!
//! `HashMap<TaskId, TaskRecord>` behind a `tokio::sync::RwLock`. Records are
//! cloned in and out, so a caller never observes a record mid-update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::domain::{Payload, StorageError, TaskId, TaskRecord};
use crate::ports::TaskStorage;

/// In-memory task storage.
///
/// Cheap to clone; clones share the same map.
///
/// # 使用例
/// ```ignore
/// let storage = Arc::new(InMemoryTaskStorage::<String, String>::new());
/// let executor = ExecutorBuilder::new(handler, storage.clone()).build()?;
/// ```
pub struct InMemoryTaskStorage<Req, Resp> {
    records: Arc<RwLock<HashMap<TaskId, TaskRecord<Req, Resp>>>>,
}

impl<Req, Resp> InMemoryTaskStorage<Req, Resp> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<Req, Resp> Clone for InMemoryTaskStorage<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<Req, Resp> Default for InMemoryTaskStorage<Req, Resp> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Req: Payload, Resp: Payload> TaskStorage<Req, Resp> for InMemoryTaskStorage<Req, Resp> {
    async fn set(&self, task_id: &TaskId, record: &TaskRecord<Req, Resp>) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        records.insert(task_id.clone(), record.clone());
        trace!(task_id = %task_id, status = ?record.status, "stored task record");
        Ok(())
    }

    async fn get(&self, task_id: &TaskId) -> Result<Option<TaskRecord<Req, Resp>>, StorageError> {
        let records = self.records.read().await;
        Ok(records.get(task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskOptions, TaskStatus};
    use chrono::Utc;

    fn record(id: &str, req: &str) -> TaskRecord<String, String> {
        TaskRecord::new(TaskId::new(id), req.to_string(), TaskOptions::default(), Utc::now())
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let storage = InMemoryTaskStorage::new();
        let id = TaskId::new("t1");
        storage.set(&id, &record("t1", "hello")).await.unwrap();

        let got = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(got.task_id, id);
        assert_eq!(got.request, "hello");
        assert_eq!(got.status, TaskStatus::Init);
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let storage = InMemoryTaskStorage::<String, String>::new();
        let got = storage.get(&TaskId::new("missing")).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn set_overwrites_same_id() {
        let storage = InMemoryTaskStorage::new();
        let id = TaskId::new("dup");
        storage.set(&id, &record("dup", "first")).await.unwrap();
        storage.set(&id, &record("dup", "second")).await.unwrap();

        assert_eq!(storage.len().await, 1);
        let got = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(got.request, "second");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let storage = InMemoryTaskStorage::new();
        let other = storage.clone();
        assert!(other.is_empty().await);

        storage.set(&TaskId::new("t1"), &record("t1", "x")).await.unwrap();
        assert_eq!(other.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_writes_for_distinct_ids() {
        let storage = Arc::new(InMemoryTaskStorage::new());
        let mut joins = Vec::new();
        for i in 0..32 {
            let storage = Arc::clone(&storage);
            joins.push(tokio::spawn(async move {
                let id = format!("t{i}");
                storage.set(&TaskId::new(&id), &record(&id, "x")).await.unwrap();
            }));
        }
        for j in joins {
            j.await.unwrap();
        }
        assert_eq!(storage.len().await, 32);
    }
}
