//! SQLite persistence for presence-creation jobs.
//!
//! The jobs table is the single source of truth for job progress. Every
//! sub-status change goes through one guarded UPDATE so concurrent workers
//! can never move a platform backwards, and terminal timestamps are stamped
//! exactly once.

pub mod error;
mod job;

pub use error::{Result, StoreError};
pub use job::{Job, JobEvent, NewJob, PlatformSlot};

use chrono::Utc;
use socialforge_common::{JobState, Platform, PlatformIdentifiers, PlatformState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use job::JobRow;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id               TEXT PRIMARY KEY,
    external_key     TEXT NOT NULL UNIQUE,
    title            TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending',
    platforms        TEXT NOT NULL,
    handles          TEXT NOT NULL,
    callback_url     TEXT,
    fb_status        TEXT NOT NULL DEFAULT 'pending',
    fb_identifiers   TEXT,
    fb_error         TEXT,
    yt_status        TEXT NOT NULL DEFAULT 'pending',
    yt_identifiers   TEXT,
    yt_error         TEXT,
    ig_status        TEXT NOT NULL DEFAULT 'pending',
    ig_identifiers   TEXT,
    ig_error         TEXT,
    created_at       INTEGER NOT NULL,
    updated_at       INTEGER NOT NULL,
    completed_at     INTEGER,
    callback_sent_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);

CREATE TABLE IF NOT EXISTS job_events (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id     TEXT NOT NULL REFERENCES jobs(id),
    kind       TEXT NOT NULL,
    detail     TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_events_job ON job_events(job_id);
"#;

#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Open (creating if missing) the database file and run the schema.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection, because each pooled
    /// `sqlite::memory:` connection would otherwise be its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a new job with every platform pending.
    /// A duplicate external key comes back as `Conflict`.
    pub async fn create(&self, new: NewJob) -> Result<Job> {
        let id = Uuid::new_v4();
        let now = Utc::now().timestamp();
        let platforms = serde_json::to_string(&new.platforms)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        let handles =
            serde_json::to_string(&new.handles).map_err(|e| StoreError::Parse(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (id, external_key, title, platforms, handles, callback_url,
                              created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new.external_key)
        .bind(&new.title)
        .bind(&platforms)
        .bind(&handles)
        .bind(&new.callback_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self.get(id).await,
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(new.external_key)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, job_id: Uuid) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;
        row.try_into()
    }

    pub async fn find_by_external_key(&self, external_key: &str) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE external_key = ?")
            .bind(external_key)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    /// Newest jobs first, optionally filtered by overall status.
    pub async fn list(&self, status: Option<JobState>, limit: i64) -> Result<Vec<Job>> {
        let rows = match status {
            Some(s) => {
                sqlx::query_as::<_, JobRow>(
                    "SELECT * FROM jobs WHERE status = ? ORDER BY created_at DESC LIMIT ?",
                )
                .bind(s.to_string())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, JobRow>(
                    "SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Job::try_from).collect()
    }

    /// Move one platform's sub-status forward. The transition guard lives in
    /// the WHERE clause, so a stale caller loses the race instead of
    /// clobbering newer state.
    ///
    /// On success the error column is overwritten (clearing it when `error`
    /// is None) and identifiers are kept unless new ones are provided.
    pub async fn update_platform(
        &self,
        job_id: Uuid,
        platform: Platform,
        next: PlatformState,
        identifiers: Option<&PlatformIdentifiers>,
        error: Option<&str>,
    ) -> Result<()> {
        let predecessors = PlatformState::allowed_predecessors(next);
        let prefix = platform.column_prefix();

        let identifiers_json = identifiers
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        let placeholders = vec!["?"; predecessors.len()].join(", ");
        let sql = format!(
            "UPDATE jobs SET {prefix}_status = ?, \
             {prefix}_identifiers = COALESCE(?, {prefix}_identifiers), \
             {prefix}_error = ?, updated_at = ? \
             WHERE id = ? AND {prefix}_status IN ({placeholders})",
        );

        let mut query = sqlx::query(&sql)
            .bind(next.to_string())
            .bind(&identifiers_json)
            .bind(error)
            .bind(Utc::now().timestamp())
            .bind(job_id.to_string());
        for p in predecessors {
            query = query.bind(p.to_string());
        }

        let affected = query.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            // Distinguish a missing job from a rejected transition.
            let job = self.get(job_id).await?;
            return Err(StoreError::IllegalTransition {
                job_id: job_id.to_string(),
                platform,
                from: job.slot(platform).status,
                to: next,
            });
        }
        Ok(())
    }

    /// Re-derive the overall status from the selected platforms' sub-status
    /// columns and write it, all in one statement. Two platforms finishing at
    /// the same time therefore cannot interleave a stale overall write between
    /// a sibling's sub-status update and its recompute.
    ///
    /// The rule, over the selected platforms only:
    /// - all still pending: pending
    /// - anything running, or a mix of settled and pending: in_progress
    /// - all settled, all succeeded: done
    /// - all settled, none succeeded: failed
    /// - all settled, mixed outcomes: partial
    ///
    /// On the first terminal derivation completed_at is stamped; it never
    /// moves afterwards. Returns the status this call wrote.
    pub async fn recompute_overall(&self, job_id: Uuid) -> Result<JobState> {
        let status: Option<String> = sqlx::query_scalar(
            r#"
            WITH slots AS (
                SELECT id,
                    CASE WHEN instr(platforms, '"facebook"') > 0 THEN 1 ELSE 0 END AS fb_sel,
                    CASE WHEN instr(platforms, '"youtube"') > 0 THEN 1 ELSE 0 END AS yt_sel,
                    CASE WHEN instr(platforms, '"instagram"') > 0 THEN 1 ELSE 0 END AS ig_sel,
                    fb_status, yt_status, ig_status
                FROM jobs
                WHERE id = ?2
            ),
            counts AS (
                SELECT id,
                    fb_sel + yt_sel + ig_sel AS selected,
                    fb_sel * (fb_status IN ('done', 'failed', 'warming_up', 'ready'))
                        + yt_sel * (yt_status IN ('done', 'failed', 'warming_up', 'ready'))
                        + ig_sel * (ig_status IN ('done', 'failed', 'warming_up', 'ready'))
                        AS settled,
                    fb_sel * (fb_status IN ('done', 'warming_up', 'ready'))
                        + yt_sel * (yt_status IN ('done', 'warming_up', 'ready'))
                        + ig_sel * (ig_status IN ('done', 'warming_up', 'ready'))
                        AS succeeded,
                    fb_sel * (fb_status = 'in_progress')
                        + yt_sel * (yt_status = 'in_progress')
                        + ig_sel * (ig_status = 'in_progress')
                        AS running
                FROM slots
            ),
            derived AS (
                SELECT id,
                    CASE
                        WHEN selected = 0 THEN 'pending'
                        WHEN settled < selected THEN
                            CASE WHEN running > 0 OR settled > 0
                                THEN 'in_progress' ELSE 'pending' END
                        WHEN succeeded = selected THEN 'done'
                        WHEN succeeded = 0 THEN 'failed'
                        ELSE 'partial'
                    END AS next_status
                FROM counts
            )
            UPDATE jobs SET
                status = derived.next_status,
                updated_at = ?1,
                completed_at = CASE
                    WHEN derived.next_status IN ('done', 'failed', 'partial')
                         AND completed_at IS NULL
                    THEN ?1
                    ELSE completed_at
                END
            FROM derived
            WHERE jobs.id = derived.id
            RETURNING jobs.status
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(job_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let status = status.ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;
        status.parse().map_err(StoreError::Parse)
    }

    /// Claim the right to send the terminal callback. Returns true for
    /// exactly one caller per terminal run; everyone else gets false.
    pub async fn mark_callback_sent(&self, job_id: Uuid) -> Result<bool> {
        let affected = sqlx::query(
            "UPDATE jobs SET callback_sent_at = ? WHERE id = ? AND callback_sent_at IS NULL",
        )
        .bind(Utc::now().timestamp())
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    /// Reset every failed platform of a terminal job back to pending so a
    /// retry can re-run just those. Clears the terminal stamp and re-arms the
    /// callback. Returns the platforms that were reset; empty means there was
    /// nothing to retry.
    pub async fn reset_failed_platforms(&self, job_id: Uuid) -> Result<Vec<Platform>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(job_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;
        let job: Job = row.try_into()?;

        let failed: Vec<Platform> = Platform::ALL
            .into_iter()
            .filter(|p| job.wants(*p) && job.slot(*p).status == PlatformState::Failed)
            .collect();

        if failed.is_empty() {
            tx.rollback().await?;
            return Ok(failed);
        }

        let now = Utc::now().timestamp();
        for platform in &failed {
            let prefix = platform.column_prefix();
            let sql = format!(
                "UPDATE jobs SET {prefix}_status = 'pending', {prefix}_error = NULL WHERE id = ?",
            );
            sqlx::query(&sql)
                .bind(job_id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            r#"
            UPDATE jobs SET status = 'in_progress', updated_at = ?,
                completed_at = NULL, callback_sent_at = NULL
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(job_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(failed)
    }

    /// Append to the audit trail. Failures are logged, not propagated; a lost
    /// event must not abort the job it describes.
    pub async fn record_event(&self, job_id: Uuid, kind: &str, detail: Option<&str>) {
        let result = sqlx::query(
            "INSERT INTO job_events (job_id, kind, detail, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(job_id.to_string())
        .bind(kind)
        .bind(detail)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(job_id = %job_id, kind, error = %e, "Failed to record job event");
        }
    }

    pub async fn events(&self, job_id: Uuid) -> Result<Vec<JobEvent>> {
        let rows = sqlx::query_as::<_, JobEvent>(
            "SELECT * FROM job_events WHERE job_id = ? ORDER BY id ASC",
        )
        .bind(job_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
