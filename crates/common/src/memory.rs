//! In-memory implementations of the store and queue seams.
//!
//! Used by the test suites and for local development without Postgres or
//! Redis. Semantics mirror the production backends: `record` is
//! insert-if-absent, queues are FIFO per name.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::queue::DeliveryQueue;
use crate::store::{DedupeStore, RecordStore};
use crate::types::{DedupeKey, EmployeeRecord, QueueItem, RecordFilter, RecordOutcome};

/// In-memory employee population, mutable so tests can flip flags between
/// enqueue and processing.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<i64, EmployeeRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: EmployeeRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn remove(&self, id: i64) {
        self.records.lock().unwrap().remove(&id);
    }

    pub fn set_visa_created(&self, id: i64, created: bool) {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            record.visa_created = created;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_eligible(&self, filter: &RecordFilter) -> Result<Vec<EmployeeRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut eligible: Vec<EmployeeRecord> = records
            .values()
            .filter(|r| r.active && r.join_date.is_some())
            .filter(|r| !filter.require_email || r.email.is_some())
            .filter(|r| !filter.require_manager || r.manager_email.is_some())
            .filter(|r| !filter.academy_only || r.academy)
            .cloned()
            .collect();
        eligible.sort_by_key(|r| r.id);
        Ok(eligible)
    }

    async fn load(&self, id: i64) -> Result<Option<EmployeeRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }
}

/// In-memory dedupe log with insert-if-absent semantics.
#[derive(Default)]
pub struct MemoryDedupeStore {
    entries: Mutex<HashMap<DedupeKey, DateTime<Utc>>>,
}

impl MemoryDedupeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DedupeStore for MemoryDedupeStore {
    async fn has_sent(&self, key: &DedupeKey) -> Result<bool, AppError> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    async fn record(
        &self,
        key: &DedupeKey,
        sent_at: DateTime<Utc>,
    ) -> Result<RecordOutcome, AppError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            return Ok(RecordOutcome::AlreadyRecorded);
        }
        entries.insert(key.clone(), sent_at);
        Ok(RecordOutcome::Recorded)
    }
}

/// In-memory named FIFO queues.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, VecDeque<QueueItem>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }
}

#[async_trait]
impl DeliveryQueue for MemoryQueue {
    async fn enqueue(&self, queue: &str, item: &QueueItem) -> Result<(), AppError> {
        self.queues
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default()
            .push_back(item.clone());
        Ok(())
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<QueueItem>, AppError> {
        Ok(self
            .queues
            .lock()
            .unwrap()
            .get_mut(queue)
            .and_then(VecDeque::pop_front))
    }
}
