/*
[INPUT]:  schema.sql, domain types, DataLayer trait
[OUTPUT]: SQLite-backed DataLayer over an r2d2 pool
[POS]:    Data layer - relational store for users, notifications, ledger and rewards
[UPDATE]: When schema.sql or DataLayer operations change
*/

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Result, RewardsError};
use crate::types::{
    Notification, NotificationId, Reward, Transaction, TransactionKind, User, UserId,
};

use super::DataLayer;

#[derive(Debug, Clone)]
pub struct SqliteDataLayer {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl SqliteDataLayer {
    /// Open (or create) a database file and apply the schema
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });

        let pool = r2d2::Pool::new(manager)?;
        let db = Self { pool };
        db.run_migrations()?;
        Ok(db)
    }

    /// Private in-memory database. The pool holds a single connection so all
    /// callers see the same data.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });

        let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    async fn with_conn<T, F>(&self, label: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|err| RewardsError::Storage(format!("{label}: blocking task failed: {err}")))?
    }
}

#[async_trait]
impl DataLayer for SqliteDataLayer {
    async fn upsert_user(&self, email: &str, name: &str) -> Result<User> {
        let email = email.trim().to_string();
        let name = name.to_string();
        if email.is_empty() {
            return Err(RewardsError::InvalidData("email must not be empty".to_string()));
        }

        self.with_conn("upsert_user", move |conn| {
            let row = conn.query_row(
                "INSERT INTO users (email, name, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO UPDATE SET name = excluded.name
                 RETURNING id, email, name, created_at",
                params![email, name, now_timestamp()],
                UserRow::from_row,
            )?;
            debug!(user_id = row.id, email = %row.email, "user upserted");
            User::try_from(row)
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_string();
        self.with_conn("get_user_by_email", move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, name, created_at FROM users WHERE email = ?1",
                    params![email],
                    UserRow::from_row,
                )
                .optional()?;
            row.map(User::try_from).transpose()
        })
        .await
    }

    async fn get_user_balance(&self, user_id: UserId) -> Result<Decimal> {
        self.with_conn("get_user_balance", move |conn| {
            let mut stmt = conn.prepare("SELECT type, amount FROM transactions WHERE user_id = ?1")?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut balance = Decimal::ZERO;
            for row in rows {
                let (kind, amount) = row?;
                let kind = TransactionKind::from_str(&kind).map_err(RewardsError::InvalidData)?;
                let amount = decode_decimal(&amount)?;
                if kind.is_earned() {
                    balance += amount;
                } else {
                    balance -= amount;
                }
            }

            Ok(balance.max(Decimal::ZERO))
        })
        .await
    }

    async fn get_available_rewards(&self, user_id: UserId) -> Result<Decimal> {
        self.with_conn("get_available_rewards", move |conn| {
            let mut stmt = conn
                .prepare("SELECT points FROM rewards WHERE user_id = ?1 AND is_available = 1")?;
            let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

            let mut total = Decimal::ZERO;
            for row in rows {
                total += decode_decimal(&row?)?;
            }
            Ok(total)
        })
        .await
    }

    async fn get_unread_notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.with_conn("get_unread_notifications", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, type, message, is_read, created_at FROM notifications
                 WHERE user_id = ?1 AND is_read = 0 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![user_id], NotificationRow::from_row)?;

            let mut notifications = Vec::new();
            for row in rows {
                notifications.push(Notification::try_from(row?)?);
            }
            Ok(notifications)
        })
        .await
    }

    async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<()> {
        self.with_conn("mark_notification_read", move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1",
                params![notification_id],
            )?;
            if changed == 0 {
                return Err(RewardsError::InvalidData(format!(
                    "notification {notification_id} not found"
                )));
            }
            Ok(())
        })
        .await
    }

    async fn create_notification(
        &self,
        user_id: UserId,
        kind: &str,
        message: &str,
    ) -> Result<NotificationId> {
        let kind = kind.to_string();
        let message = message.to_string();
        self.with_conn("create_notification", move |conn| {
            conn.execute(
                "INSERT INTO notifications (user_id, type, message, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, kind, message, now_timestamp()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn record_transaction(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
    ) -> Result<Transaction> {
        if amount.is_sign_negative() {
            return Err(RewardsError::InvalidData(format!(
                "transaction amount must not be negative: {amount}"
            )));
        }

        let description = description.to_string();
        self.with_conn("record_transaction", move |conn| {
            let date = Utc::now();
            conn.execute(
                "INSERT INTO transactions (user_id, type, amount, description, date) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_id,
                    kind.as_str(),
                    amount.to_string(),
                    description,
                    format_timestamp(date)
                ],
            )?;
            Ok(Transaction {
                id: conn.last_insert_rowid(),
                user_id,
                kind,
                amount,
                description,
                date,
            })
        })
        .await
    }

    async fn create_reward(&self, user_id: UserId, name: &str, points: Decimal) -> Result<Reward> {
        let name = name.to_string();
        self.with_conn("create_reward", move |conn| {
            conn.execute(
                "INSERT INTO rewards (user_id, name, points, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, name, points.to_string(), now_timestamp()],
            )?;
            Ok(Reward {
                id: conn.last_insert_rowid(),
                user_id,
                name,
                points,
                is_available: true,
            })
        })
        .await
    }
}

struct UserRow {
    id: i64,
    email: String,
    name: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = RewardsError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

struct NotificationRow {
    id: i64,
    user_id: i64,
    kind: String,
    message: String,
    is_read: bool,
    created_at: String,
}

impl NotificationRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            message: row.get(3)?,
            is_read: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RewardsError;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            message: row.message,
            is_read: row.is_read,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| RewardsError::InvalidData(format!("invalid timestamp {value:?}: {err}")))
}

fn decode_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|err| RewardsError::InvalidData(format!("invalid decimal {value:?}: {err}")))
}
