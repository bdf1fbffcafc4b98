//! Record store and dedupe store seams.
//!
//! The engine and the workers only see these traits; production wiring uses
//! the Postgres implementations below, tests use [`crate::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;
use crate::types::{DedupeKey, EmployeeRecord, RecordFilter, RecordOutcome};

/// Read-only access to the employee/candidate population.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch active records with a join date set, narrowed by `filter`.
    async fn find_eligible(&self, filter: &RecordFilter) -> Result<Vec<EmployeeRecord>, AppError>;

    /// Load a single record by id. `None` when it no longer exists.
    async fn load(&self, id: i64) -> Result<Option<EmployeeRecord>, AppError>;
}

/// Durable log of milestone sends, keyed by (subject-type, subject-id, mail-key).
///
/// `record` is an explicit insert-if-absent: calling it for an existing key
/// returns [`RecordOutcome::AlreadyRecorded`] instead of an error. That
/// covers the race of two workers processing redundant deliveries of the
/// same logical item. Entries are permanent audit history; there is no
/// expiry or deletion.
#[async_trait]
pub trait DedupeStore: Send + Sync {
    async fn has_sent(&self, key: &DedupeKey) -> Result<bool, AppError>;

    async fn record(
        &self,
        key: &DedupeKey,
        sent_at: DateTime<Utc>,
    ) -> Result<RecordOutcome, AppError>;
}

/// Postgres-backed record store over the `employees` table.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_eligible(&self, filter: &RecordFilter) -> Result<Vec<EmployeeRecord>, AppError> {
        let mut sql = String::from(
            "SELECT * FROM employees WHERE active = true AND join_date IS NOT NULL",
        );
        if filter.require_email {
            sql.push_str(" AND email IS NOT NULL");
        }
        if filter.require_manager {
            sql.push_str(" AND manager_email IS NOT NULL");
        }
        if filter.academy_only {
            sql.push_str(" AND academy = true");
        }
        sql.push_str(" ORDER BY id");

        let records: Vec<EmployeeRecord> =
            sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(records)
    }

    async fn load(&self, id: i64) -> Result<Option<EmployeeRecord>, AppError> {
        let record: Option<EmployeeRecord> =
            sqlx::query_as("SELECT * FROM employees WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }
}

/// Postgres-backed dedupe store over the append-only `milestone_send_log`.
///
/// The table's UNIQUE constraint on (subject_type, subject_id, mail_key) is
/// the only synchronization primitive the scheduler needs; `ON CONFLICT DO
/// NOTHING` turns the duplicate-insert race into a defined outcome.
pub struct PgDedupeStore {
    pool: PgPool,
}

impl PgDedupeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DedupeStore for PgDedupeStore {
    async fn has_sent(&self, key: &DedupeKey) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM milestone_send_log
            WHERE subject_type = $1 AND subject_id = $2 AND mail_key = $3
            LIMIT 1
            "#,
        )
        .bind(key.subject_type.to_string())
        .bind(key.subject_id)
        .bind(&key.mail_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn record(
        &self,
        key: &DedupeKey,
        sent_at: DateTime<Utc>,
    ) -> Result<RecordOutcome, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO milestone_send_log (subject_type, subject_id, mail_key, sent_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_type, subject_id, mail_key) DO NOTHING
            "#,
        )
        .bind(key.subject_type.to_string())
        .bind(key.subject_id)
        .bind(&key.mail_key)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(RecordOutcome::Recorded)
        } else {
            Ok(RecordOutcome::AlreadyRecorded)
        }
    }
}
