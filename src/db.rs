// src/db.rs
use crate::intake::RequestStore;
use crate::models::{Applicant, DbUser, RequestId, RequestStatus, SubscriptionRequest};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("user {user_id} already has a pending subscription request")]
    DuplicatePending { user_id: i64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id                INTEGER PRIMARY KEY,
        username               TEXT,
        first_name             TEXT,
        last_name              TEXT,
        is_admin               INTEGER NOT NULL DEFAULT 0,
        subscription_end       TEXT,
        subscription_unlimited INTEGER NOT NULL DEFAULT 0,
        trial_claimed          INTEGER NOT NULL DEFAULT 0,
        created_at             TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS subscription_requests (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id    INTEGER NOT NULL,
        username   TEXT,
        first_name TEXT,
        last_name  TEXT,
        status     TEXT    NOT NULL DEFAULT 'pending'
                   CHECK (status IN ('pending', 'approved', 'denied')),
        created_at TEXT    NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_one_pending
        ON subscription_requests(user_id) WHERE status = 'pending';
    CREATE TABLE IF NOT EXISTS user_sessions (
        user_id        INTEGER PRIMARY KEY,
        session_string TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS referrals (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        referrer_id INTEGER NOT NULL,
        referred_id INTEGER NOT NULL UNIQUE,
        created_at  TEXT    NOT NULL
    );
"#;

/// SQLite client; every operation takes the connection lock and releases it before returning
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open the database file (creating parent directories) and initialise the schema
    pub async fn open(path: &str) -> StoreResult<Self> {
        if let Some(dir) = Path::new(path).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Db {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn get_user(&self, user_id: i64) -> StoreResult<Option<DbUser>> {
        let c = self.conn.lock().await;
        let user = c
            .query_row(
                "SELECT user_id, username, first_name, last_name, is_admin,
                        subscription_end, subscription_unlimited, trial_claimed
                 FROM users WHERE user_id=?1",
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Insert the user unless they already exist
    pub async fn create_user(&self, applicant: &Applicant, is_admin: bool) -> StoreResult<()> {
        let c = self.conn.lock().await;
        c.execute(
            "INSERT OR IGNORE INTO users(user_id, username, first_name, last_name, is_admin, created_at)
             VALUES(?1,?2,?3,?4,?5,?6)",
            params![
                applicant.user_id,
                applicant.username,
                applicant.first_name,
                applicant.last_name,
                is_admin,
                Utc::now()
            ],
        )?;
        Ok(())
    }

    /// Claim the one-time trial: the subscription then runs `days` past the later of now and its
    /// current end. Returns the new end, or `None` if the trial was already claimed.
    pub async fn claim_trial(&self, user_id: i64, days: i64) -> StoreResult<Option<DateTime<Utc>>> {
        let now = Utc::now();
        let c = self.conn.lock().await;
        let current = c
            .query_row(
                "SELECT subscription_end FROM users WHERE user_id=?1",
                params![user_id],
                |r| r.get::<_, Option<DateTime<Utc>>>(0),
            )
            .optional()?
            .flatten();
        let end = current.filter(|e| *e > now).unwrap_or(now) + Duration::days(days);
        let changed = c.execute(
            "UPDATE users SET trial_claimed=1, subscription_end=?2
             WHERE user_id=?1 AND trial_claimed=0",
            params![user_id, end],
        )?;
        Ok((changed > 0).then_some(end))
    }

    pub async fn user_session(&self, user_id: i64) -> StoreResult<Option<String>> {
        let c = self.conn.lock().await;
        let session = c
            .query_row(
                "SELECT session_string FROM user_sessions WHERE user_id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(session)
    }

    /// Record that `referred_id` joined through `referrer_id`; a user is referred at most once
    pub async fn record_referral(&self, referrer_id: i64, referred_id: i64) -> StoreResult<bool> {
        let c = self.conn.lock().await;
        let inserted = c.execute(
            "INSERT OR IGNORE INTO referrals(referrer_id, referred_id, created_at) VALUES(?1,?2,?3)",
            params![referrer_id, referred_id, Utc::now()],
        )?;
        Ok(inserted > 0)
    }

    pub async fn referral_count(&self, referrer_id: i64) -> StoreResult<i64> {
        let c = self.conn.lock().await;
        let count = c.query_row(
            "SELECT COUNT(*) FROM referrals WHERE referrer_id=?1",
            params![referrer_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Operator-side transition out of `pending`, used by the approval workflow
    pub async fn set_request_status(&self, id: RequestId, status: RequestStatus) -> StoreResult<bool> {
        let c = self.conn.lock().await;
        let changed = c.execute(
            "UPDATE subscription_requests SET status=?2 WHERE id=?1",
            params![id.0, status.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Full request history of a user, oldest first, for the operator's review
    pub async fn requests_for_user(&self, user_id: i64) -> StoreResult<Vec<SubscriptionRequest>> {
        let c = self.conn.lock().await;
        let mut stmt = c.prepare(
            "SELECT id, user_id, username, first_name, last_name, status
             FROM subscription_requests WHERE user_id=?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], request_from_row)?;
        let requests = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(requests)
    }
}

#[async_trait]
impl RequestStore for Db {
    async fn find_pending(&self, user_id: i64) -> StoreResult<Option<SubscriptionRequest>> {
        let c = self.conn.lock().await;
        let request = c
            .query_row(
                "SELECT id, user_id, username, first_name, last_name, status
                 FROM subscription_requests WHERE user_id=?1 AND status='pending'",
                params![user_id],
                request_from_row,
            )
            .optional()?;
        Ok(request)
    }

    async fn insert_pending(&self, applicant: &Applicant) -> StoreResult<RequestId> {
        let c = self.conn.lock().await;
        let result = c.execute(
            "INSERT INTO subscription_requests(user_id, username, first_name, last_name, status, created_at)
             VALUES(?1,?2,?3,?4,'pending',?5)",
            params![
                applicant.user_id,
                applicant.username,
                applicant.first_name,
                applicant.last_name,
                Utc::now()
            ],
        );
        match result {
            Ok(_) => Ok(RequestId(c.last_insert_rowid())),
            Err(e) => Err(insert_error(e, applicant.user_id)),
        }
    }
}

/// Only the one-pending-per-user index maps to `DuplicatePending`; other constraints stay errors
fn insert_error(err: rusqlite::Error, user_id: i64) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            StoreError::DuplicatePending { user_id }
        }
        e => e.into(),
    }
}

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<DbUser> {
    Ok(DbUser {
        user_id: r.get(0)?,
        username: r.get(1)?,
        first_name: r.get(2)?,
        last_name: r.get(3)?,
        is_admin: r.get(4)?,
        subscription_end: r.get(5)?,
        subscription_unlimited: r.get(6)?,
        trial_claimed: r.get(7)?,
    })
}

fn request_from_row(r: &Row<'_>) -> rusqlite::Result<SubscriptionRequest> {
    let status: String = r.get(5)?;
    let status = status.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(SubscriptionRequest {
        id: RequestId(r.get(0)?),
        user_id: r.get(1)?,
        username: r.get(2)?,
        first_name: r.get(3)?,
        last_name: r.get(4)?,
        status,
    })
}
