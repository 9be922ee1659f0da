use baeum_core::model::{ClassId, CompletionRecord, LessonId, UserId};

use super::SqliteRepository;
use super::mapping::{map_completion_row, u64_to_i64};
use crate::repository::{CompletionRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn get_record(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<CompletionRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, lesson_id, content_viewed, assessment_passed, first_viewed_at, updated_at
            FROM completion_records
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_completion_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn records_for_user_in_class(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT r.user_id, r.lesson_id, r.content_viewed, r.assessment_passed,
                   r.first_viewed_at, r.updated_at
            FROM completion_records r
            JOIN lessons l ON l.id = r.lesson_id
            WHERE r.user_id = ?1 AND l.class_id = ?2
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(u64_to_i64("class_id", class_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_completion_row(&row)?);
        }
        Ok(records)
    }

    async fn upsert_record(&self, record: &CompletionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO completion_records (
                user_id, lesson_id, content_viewed, assessment_passed, first_viewed_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                -- first_viewed_at is fixed at creation; only the flags move
                content_viewed = excluded.content_viewed,
                assessment_passed = excluded.assessment_passed,
                updated_at = excluded.updated_at
            ",
        )
        .bind(u64_to_i64("user_id", record.user_id().value())?)
        .bind(u64_to_i64("lesson_id", record.lesson_id().value())?)
        .bind(i64::from(record.content_viewed()))
        .bind(i64::from(record.assessment_passed()))
        .bind(record.first_viewed_at())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
