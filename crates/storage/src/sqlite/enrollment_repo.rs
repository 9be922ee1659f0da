use baeum_core::model::{ClassId, UserId};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{class_id_from_i64, u64_to_i64};
use crate::repository::{EnrollmentRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn enroll(
        &self,
        user_id: UserId,
        class_id: ClassId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO enrollments (user_id, class_id, enrolled_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, class_id) DO NOTHING
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("class_id", class_id.value())?)
        .bind(enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn is_enrolled(&self, user_id: UserId, class_id: ClassId) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
            SELECT 1 FROM enrollments WHERE user_id = ?1 AND class_id = ?2
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("class_id", class_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        Ok(row.is_some())
    }

    async fn enrolled_classes(&self, user_id: UserId) -> Result<Vec<ClassId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT class_id FROM enrollments
            WHERE user_id = ?1
            ORDER BY class_id ASC
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(class_id_from_i64(
                row.try_get::<i64, _>("class_id").map_err(conn)?,
            )?);
        }
        Ok(ids)
    }
}
