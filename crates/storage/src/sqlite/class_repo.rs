use baeum_core::model::{Class, ClassId, Lesson, LessonId};

use super::SqliteRepository;
use super::mapping::{class_id_from_i64, lesson_id_from_i64, map_class_row, map_lesson_row};
use crate::repository::{ClassRepository, NewClassRecord, NewLessonRecord, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        other => StorageError::Connection(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ClassRepository for SqliteRepository {
    async fn insert_class(&self, record: NewClassRecord) -> Result<ClassId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO classes (name, description, level, passing_score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.name)
        .bind(record.description)
        .bind(record.level.as_str())
        .bind(i64::from(record.passing_score))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        class_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_class(&self, class: &Class) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO classes (id, name, description, level, passing_score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                name = excluded.name,
                description = excluded.description,
                level = excluded.level,
                passing_score = excluded.passing_score
            ",
        )
        .bind(super::mapping::u64_to_i64("class_id", class.id().value())?)
        .bind(class.name().to_owned())
        .bind(class.description().map(str::to_owned))
        .bind(class.level().as_str())
        .bind(i64::from(class.passing_score()))
        .bind(class.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, description, level, passing_score, created_at
            FROM classes WHERE id = ?1
            ",
        )
        .bind(super::mapping::u64_to_i64("class_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_class_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_classes(&self, limit: u32) -> Result<Vec<Class>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, level, passing_score, created_at
            FROM classes
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut classes = Vec::with_capacity(rows.len());
        for row in rows {
            classes.push(map_class_row(&row)?);
        }
        Ok(classes)
    }

    async fn insert_lesson(&self, record: NewLessonRecord) -> Result<LessonId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons (class_id, title, ord, requires_passing_score, video_url, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(super::mapping::u64_to_i64("class_id", record.class_id.value())?)
        .bind(record.title)
        .bind(i64::from(record.order))
        .bind(i64::from(record.requires_passing_score))
        .bind(record.video_url)
        .bind(record.body)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        lesson_id_from_i64(res.last_insert_rowid())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, class_id, title, ord, requires_passing_score, video_url, body, created_at
            FROM lessons WHERE id = ?1
            ",
        )
        .bind(super::mapping::u64_to_i64("lesson_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_lesson_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn lessons_for_class(&self, class_id: ClassId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, class_id, title, ord, requires_passing_score, video_url, body, created_at
            FROM lessons
            WHERE class_id = ?1
            ORDER BY ord ASC
            ",
        )
        .bind(super::mapping::u64_to_i64("class_id", class_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(map_lesson_row(&row)?);
        }
        Ok(lessons)
    }
}
