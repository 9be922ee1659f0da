use baeum_core::model::{Notification, UserId};

use super::SqliteRepository;
use super::mapping::{map_notification_row, u64_to_i64};
use crate::repository::{NotificationRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl NotificationRepository for SqliteRepository {
    async fn append(&self, notification: &Notification) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO notifications (user_id, kind, message, created_at, read)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(u64_to_i64("user_id", notification.user_id.value())?)
        .bind(notification.kind.as_str())
        .bind(notification.message.clone())
        .bind(notification.created_at)
        .bind(i64::from(notification.read))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn unread_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, kind, message, created_at, read
            FROM notifications
            WHERE user_id = ?1 AND read = 0
            ORDER BY id ASC
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            notifications.push(map_notification_row(&row)?);
        }
        Ok(notifications)
    }

    async fn mark_read(&self, id: i64) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE notifications SET read = 1 WHERE id = ?1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
