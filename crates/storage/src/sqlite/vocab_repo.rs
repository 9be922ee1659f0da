use baeum_core::model::{VocabEntry, VocabEntryId, VocabSet, VocabSetId};

use super::SqliteRepository;
use super::mapping::{map_vocab_entry_row, map_vocab_set_row, set_id_from_i64, u64_to_i64};
use crate::repository::{NewVocabEntryRecord, NewVocabSetRecord, StorageError, VocabRepository};

fn conn(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        other => StorageError::Connection(other.to_string()),
    }
}

#[async_trait::async_trait]
impl VocabRepository for SqliteRepository {
    async fn insert_set(&self, record: NewVocabSetRecord) -> Result<VocabSetId, StorageError> {
        let class_id = record
            .class_id
            .map(|id| u64_to_i64("class_id", id.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO vocab_sets (class_id, name, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(class_id)
        .bind(record.name)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        set_id_from_i64(res.last_insert_rowid())
    }

    async fn get_set(&self, id: VocabSetId) -> Result<Option<VocabSet>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, class_id, name, created_at FROM vocab_sets WHERE id = ?1
            ",
        )
        .bind(u64_to_i64("set_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_vocab_set_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_sets(&self, limit: u32) -> Result<Vec<VocabSet>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, class_id, name, created_at
            FROM vocab_sets
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut sets = Vec::with_capacity(rows.len());
        for row in rows {
            sets.push(map_vocab_set_row(&row)?);
        }
        Ok(sets)
    }

    async fn insert_entry(
        &self,
        record: NewVocabEntryRecord,
    ) -> Result<VocabEntryId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO vocab_entries (set_id, hangul, romanization, meaning, example, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(u64_to_i64("set_id", record.set_id.value())?)
        .bind(record.hangul)
        .bind(record.romanization)
        .bind(record.meaning)
        .bind(record.example)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        u64::try_from(id)
            .map(VocabEntryId::new)
            .map_err(|_| StorageError::Serialization("entry_id sign overflow".into()))
    }

    async fn entries_for_set(&self, set_id: VocabSetId) -> Result<Vec<VocabEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, set_id, hangul, romanization, meaning, example, created_at
            FROM vocab_entries
            WHERE set_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(u64_to_i64("set_id", set_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(map_vocab_entry_row(&row)?);
        }
        Ok(entries)
    }
}
