use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: classes with ordered lessons, enrollments,
/// completion records, vocabulary, question banks, tryouts with attempts,
/// the XP ledger and streaks, posts/comments, notifications, and indexes.
/// Ownership is explicit: every child table declares its foreign key with an
/// `ON DELETE CASCADE` rule.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS classes (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT,
                    level TEXT NOT NULL,
                    passing_score INTEGER NOT NULL CHECK (passing_score BETWEEN 1 AND 100),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lessons (
                    id INTEGER PRIMARY KEY,
                    class_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    ord INTEGER NOT NULL CHECK (ord >= 0),
                    requires_passing_score INTEGER NOT NULL,
                    video_url TEXT,
                    body TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE (class_id, ord),
                    FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS enrollments (
                    user_id INTEGER NOT NULL,
                    class_id INTEGER NOT NULL,
                    enrolled_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, class_id),
                    FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completion_records (
                    user_id INTEGER NOT NULL,
                    lesson_id INTEGER NOT NULL,
                    content_viewed INTEGER NOT NULL,
                    assessment_passed INTEGER NOT NULL,
                    first_viewed_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, lesson_id),
                    FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS vocab_sets (
                    id INTEGER PRIMARY KEY,
                    class_id INTEGER,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS vocab_entries (
                    id INTEGER PRIMARY KEY,
                    set_id INTEGER NOT NULL,
                    hangul TEXT NOT NULL,
                    romanization TEXT NOT NULL,
                    meaning TEXT NOT NULL,
                    example TEXT,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (set_id) REFERENCES vocab_sets(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER PRIMARY KEY,
                    prompt TEXT NOT NULL,
                    choices TEXT NOT NULL,
                    correct_choice INTEGER NOT NULL CHECK (correct_choice >= 0),
                    explanation TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS tryouts (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
                    passing_score INTEGER CHECK (passing_score BETWEEN 1 AND 100),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS tryout_questions (
                    tryout_id INTEGER NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    question_id INTEGER NOT NULL,
                    PRIMARY KEY (tryout_id, position),
                    FOREIGN KEY (tryout_id) REFERENCES tryouts(id) ON DELETE CASCADE,
                    FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS tryout_attempts (
                    id TEXT PRIMARY KEY,
                    tryout_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    state TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    deadline TEXT NOT NULL,
                    submitted_at TEXT,
                    answers TEXT NOT NULL,
                    score_correct INTEGER,
                    score_total INTEGER,
                    late INTEGER NOT NULL,
                    FOREIGN KEY (tryout_id) REFERENCES tryouts(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS xp_events (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    reason TEXT NOT NULL,
                    amount INTEGER NOT NULL CHECK (amount >= 0),
                    awarded_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS streaks (
                    user_id INTEGER PRIMARY KEY,
                    current INTEGER NOT NULL CHECK (current >= 0),
                    longest INTEGER NOT NULL CHECK (longest >= 0),
                    last_activity_date TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY,
                    author INTEGER NOT NULL,
                    body TEXT NOT NULL,
                    attachment_url TEXT,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY,
                    post_id INTEGER NOT NULL,
                    author INTEGER NOT NULL,
                    body TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS notifications (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    message TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    read INTEGER NOT NULL DEFAULT 0
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_lessons_class_ord
                    ON lessons (class_id, ord);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_completion_user
                    ON completion_records (user_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempts_user_started
                    ON tryout_attempts (user_id, started_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_xp_events_user
                    ON xp_events (user_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_comments_post
                    ON comments (post_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_notifications_user_read
                    ON notifications (user_id, read);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
