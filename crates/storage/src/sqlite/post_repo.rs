use baeum_core::model::{Comment, CommentId, Post, PostId};

use super::SqliteRepository;
use super::mapping::{map_comment_row, map_post_row, u64_to_i64};
use crate::repository::{NewCommentRecord, NewPostRecord, PostRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        other => StorageError::Connection(other.to_string()),
    }
}

#[async_trait::async_trait]
impl PostRepository for SqliteRepository {
    async fn insert_post(&self, record: NewPostRecord) -> Result<PostId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO posts (author, body, attachment_url, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(u64_to_i64("author", record.author.value())?)
        .bind(record.body)
        .bind(record.attachment_url)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        u64::try_from(id)
            .map(PostId::new)
            .map_err(|_| StorageError::Serialization("post_id sign overflow".into()))
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, author, body, attachment_url, created_at FROM posts WHERE id = ?1
            ",
        )
        .bind(u64_to_i64("post_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_post_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_posts(&self, limit: u32) -> Result<Vec<Post>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, author, body, attachment_url, created_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(map_post_row(&row)?);
        }
        Ok(posts)
    }

    async fn insert_comment(&self, record: NewCommentRecord) -> Result<CommentId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO comments (post_id, author, body, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(u64_to_i64("post_id", record.post_id.value())?)
        .bind(u64_to_i64("author", record.author.value())?)
        .bind(record.body)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        u64::try_from(id)
            .map(CommentId::new)
            .map_err(|_| StorageError::Serialization("comment_id sign overflow".into()))
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, post_id, author, body, created_at
            FROM comments
            WHERE post_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(u64_to_i64("post_id", post_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(map_comment_row(&row)?);
        }
        Ok(comments)
    }
}
