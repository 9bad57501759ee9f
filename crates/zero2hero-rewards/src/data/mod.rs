/*
[INPUT]:  User identities, notification ids, ledger writes
[OUTPUT]: Fallible async access to users, balances, rewards and notifications
[POS]:    Data layer - trait seam between the client core and the relational store
[UPDATE]: When adding data layer operations or backends
*/

pub mod sqlite;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::types::{Notification, NotificationId, Reward, Transaction, TransactionKind, User, UserId};

pub use sqlite::SqliteDataLayer;

/// Relational store used by the gateway and poller.
///
/// Every call is a round-trip that may fail; no transactional guarantee spans calls.
#[async_trait]
pub trait DataLayer: Send + Sync {
    /// Create the user if absent, otherwise refresh its name. Never duplicates an email.
    async fn upsert_user(&self, email: &str, name: &str) -> Result<User>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Earned minus redeemed, never below zero
    async fn get_user_balance(&self, user_id: UserId) -> Result<Decimal>;

    /// Sum of points over rewards still available to the user
    async fn get_available_rewards(&self, user_id: UserId) -> Result<Decimal>;

    async fn get_unread_notifications(&self, user_id: UserId) -> Result<Vec<Notification>>;

    async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<()>;

    async fn create_notification(
        &self,
        user_id: UserId,
        kind: &str,
        message: &str,
    ) -> Result<NotificationId>;

    async fn record_transaction(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
    ) -> Result<Transaction>;

    async fn create_reward(&self, user_id: UserId, name: &str, points: Decimal) -> Result<Reward>;
}
