use baeum_core::gamification::Streak;
use baeum_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_streak_row, u64_to_i64};
use crate::repository::{GamificationRepository, StorageError, XpEventRecord};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl GamificationRepository for SqliteRepository {
    async fn append_xp_event(&self, event: XpEventRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO xp_events (user_id, reason, amount, awarded_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(u64_to_i64("user_id", event.user_id.value())?)
        .bind(event.reason.as_str())
        .bind(u64_to_i64("amount", event.amount)?)
        .bind(event.awarded_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn total_xp(&self, user_id: UserId) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(amount), 0) AS total FROM xp_events WHERE user_id = ?1
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let total: i64 = row.try_get("total").map_err(conn)?;
        u64::try_from(total)
            .map_err(|_| StorageError::Serialization("negative xp total".into()))
    }

    async fn get_streak(&self, user_id: UserId) -> Result<Option<Streak>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT current, longest, last_activity_date FROM streaks WHERE user_id = ?1
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_streak_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn upsert_streak(&self, user_id: UserId, streak: &Streak) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO streaks (user_id, current, longest, last_activity_date)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                current = excluded.current,
                longest = excluded.longest,
                last_activity_date = excluded.last_activity_date
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(i64::from(streak.current()))
        .bind(i64::from(streak.longest()))
        .bind(streak.last_activity_date())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
