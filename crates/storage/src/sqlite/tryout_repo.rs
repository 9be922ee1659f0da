use std::collections::HashMap;

use baeum_core::model::{
    AttemptId, Question, QuestionId, Tryout, TryoutAttempt, TryoutId, UserId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    map_attempt_row, map_question_row, question_id_from_i64, ser, u64_to_i64,
};
use crate::repository::{NewQuestionRecord, NewTryoutRecord, StorageError, TryoutRepository};

fn conn(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        other => StorageError::Connection(other.to_string()),
    }
}

async fn tryout_from_parts(
    repo: &SqliteRepository,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Tryout, StorageError> {
    let id_i64: i64 = row.try_get("id").map_err(ser)?;
    let question_rows = sqlx::query(
        r"
        SELECT question_id FROM tryout_questions
        WHERE tryout_id = ?1
        ORDER BY position ASC
        ",
    )
    .bind(id_i64)
    .fetch_all(&repo.pool)
    .await
    .map_err(conn)?;

    let mut question_ids = Vec::with_capacity(question_rows.len());
    for qrow in question_rows {
        question_ids.push(question_id_from_i64(
            qrow.try_get::<i64, _>("question_id").map_err(ser)?,
        )?);
    }

    let duration_i64: i64 = row.try_get("duration_minutes").map_err(ser)?;
    let duration_minutes = u32::try_from(duration_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid duration_minutes: {duration_i64}"))
    })?;

    let passing_score = row
        .try_get::<Option<i64>, _>("passing_score")
        .map_err(ser)?
        .map(|score| {
            u8::try_from(score)
                .map_err(|_| StorageError::Serialization(format!("invalid passing_score: {score}")))
        })
        .transpose()?;

    Tryout::new(
        TryoutId::new(
            u64::try_from(id_i64)
                .map_err(|_| StorageError::Serialization("tryout_id sign overflow".into()))?,
        ),
        row.try_get::<String, _>("title").map_err(ser)?,
        question_ids,
        duration_minutes,
        passing_score,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl TryoutRepository for SqliteRepository {
    async fn insert_question(
        &self,
        record: NewQuestionRecord,
    ) -> Result<QuestionId, StorageError> {
        let choices = serde_json::to_string(&record.choices).map_err(ser)?;
        let correct = i64::try_from(record.correct_choice)
            .map_err(|_| StorageError::Serialization("correct_choice overflow".into()))?;

        let res = sqlx::query(
            r"
            INSERT INTO questions (prompt, choices, correct_choice, explanation)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(record.prompt)
        .bind(choices)
        .bind(correct)
        .bind(record.explanation)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        question_id_from_i64(res.last_insert_rowid())
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT id, prompt, choices, correct_choice, explanation
            FROM questions
            WHERE id IN (
            ",
        );

        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(")\n");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(u64_to_i64("question_id", id.value())?);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let mut by_id: HashMap<u64, Question> = HashMap::with_capacity(rows.len());
        for row in rows {
            let question = map_question_row(&row)?;
            by_id.insert(question.id().value(), question);
        }

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.remove(&id.value()) {
                Some(question) => out.push(question),
                None => return Err(StorageError::NotFound),
            }
        }

        Ok(out)
    }

    async fn insert_tryout(&self, record: NewTryoutRecord) -> Result<TryoutId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO tryouts (title, duration_minutes, passing_score, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(record.title)
        .bind(i64::from(record.duration_minutes))
        .bind(record.passing_score.map(i64::from))
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let tryout_id = res.last_insert_rowid();

        for (position, question_id) in record.question_ids.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO tryout_questions (tryout_id, position, question_id)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(tryout_id)
            .bind(position)
            .bind(u64_to_i64("question_id", question_id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;

        u64::try_from(tryout_id)
            .map(TryoutId::new)
            .map_err(|_| StorageError::Serialization("tryout_id sign overflow".into()))
    }

    async fn get_tryout(&self, id: TryoutId) -> Result<Option<Tryout>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, duration_minutes, passing_score, created_at
            FROM tryouts WHERE id = ?1
            ",
        )
        .bind(u64_to_i64("tryout_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => tryout_from_parts(self, &row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn insert_attempt(&self, attempt: &TryoutAttempt) -> Result<(), StorageError> {
        let answers = serde_json::to_string(attempt.answers()).map_err(ser)?;
        let (score_correct, score_total) = match attempt.score() {
            Some(report) => (
                Some(
                    i64::try_from(report.correct)
                        .map_err(|_| StorageError::Serialization("score overflow".into()))?,
                ),
                Some(
                    i64::try_from(report.total)
                        .map_err(|_| StorageError::Serialization("score overflow".into()))?,
                ),
            ),
            None => (None, None),
        };

        sqlx::query(
            r"
            INSERT INTO tryout_attempts (
                id, tryout_id, user_id, state, started_at, deadline,
                submitted_at, answers, score_correct, score_total, late
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(attempt.id().to_string())
        .bind(u64_to_i64("tryout_id", attempt.tryout_id().value())?)
        .bind(u64_to_i64("user_id", attempt.user_id().value())?)
        .bind(attempt.state().as_str())
        .bind(attempt.started_at())
        .bind(attempt.deadline())
        .bind(attempt.submitted_at())
        .bind(answers)
        .bind(score_correct)
        .bind(score_total)
        .bind(i64::from(attempt.is_late()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn update_attempt(&self, attempt: &TryoutAttempt) -> Result<(), StorageError> {
        let answers = serde_json::to_string(attempt.answers()).map_err(ser)?;
        let (score_correct, score_total) = match attempt.score() {
            Some(report) => (
                Some(
                    i64::try_from(report.correct)
                        .map_err(|_| StorageError::Serialization("score overflow".into()))?,
                ),
                Some(
                    i64::try_from(report.total)
                        .map_err(|_| StorageError::Serialization("score overflow".into()))?,
                ),
            ),
            None => (None, None),
        };

        let res = sqlx::query(
            r"
            UPDATE tryout_attempts SET
                state = ?2,
                submitted_at = ?3,
                answers = ?4,
                score_correct = ?5,
                score_total = ?6,
                late = ?7
            WHERE id = ?1
            ",
        )
        .bind(attempt.id().to_string())
        .bind(attempt.state().as_str())
        .bind(attempt.submitted_at())
        .bind(answers)
        .bind(score_correct)
        .bind(score_total)
        .bind(i64::from(attempt.is_late()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<TryoutAttempt>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, tryout_id, user_id, state, started_at, deadline,
                   submitted_at, answers, score_correct, score_total, late
            FROM tryout_attempts WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_attempt_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TryoutAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, tryout_id, user_id, state, started_at, deadline,
                   submitted_at, answers, score_correct, score_total, late
            FROM tryout_attempts
            WHERE user_id = ?1
            ORDER BY started_at DESC
            LIMIT ?2
            ",
        )
        .bind(u64_to_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut attempts = Vec::with_capacity(rows.len());
        for row in rows {
            attempts.push(map_attempt_row(&row)?);
        }
        Ok(attempts)
    }
}
