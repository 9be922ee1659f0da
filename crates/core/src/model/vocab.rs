use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ClassId, VocabEntryId, VocabSetId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VocabError {
    #[error("vocabulary set name cannot be empty")]
    EmptyName,

    #[error("hangul form cannot be empty")]
    EmptyHangul,

    #[error("romanization cannot be empty")]
    EmptyRomanization,

    #[error("meaning cannot be empty")]
    EmptyMeaning,
}

//
// ─── VOCAB SET ─────────────────────────────────────────────────────────────────
//

/// A named collection of vocabulary entries, optionally attached to a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabSet {
    id: VocabSetId,
    class_id: Option<ClassId>,
    name: String,
    created_at: DateTime<Utc>,
}

impl VocabSet {
    /// Creates a new vocabulary set.
    ///
    /// # Errors
    ///
    /// Returns `VocabError::EmptyName` if the name is empty or whitespace-only.
    pub fn new(
        id: VocabSetId,
        class_id: Option<ClassId>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, VocabError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(VocabError::EmptyName);
        }

        Ok(Self {
            id,
            class_id,
            name: name.trim().to_owned(),
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> VocabSetId {
        self.id
    }

    #[must_use]
    pub fn class_id(&self) -> Option<ClassId> {
        self.class_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── VOCAB ENTRY ───────────────────────────────────────────────────────────────
//

/// One vocabulary item: the hangul form, its romanization, and its meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabEntry {
    id: VocabEntryId,
    set_id: VocabSetId,
    hangul: String,
    romanization: String,
    meaning: String,
    example: Option<String>,
    created_at: DateTime<Utc>,
}

impl VocabEntry {
    /// Creates a new vocabulary entry.
    ///
    /// # Errors
    ///
    /// Returns a `VocabError` variant naming the first empty required field.
    pub fn new(
        id: VocabEntryId,
        set_id: VocabSetId,
        hangul: impl Into<String>,
        romanization: impl Into<String>,
        meaning: impl Into<String>,
        example: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, VocabError> {
        let hangul = hangul.into();
        if hangul.trim().is_empty() {
            return Err(VocabError::EmptyHangul);
        }
        let romanization = romanization.into();
        if romanization.trim().is_empty() {
            return Err(VocabError::EmptyRomanization);
        }
        let meaning = meaning.into();
        if meaning.trim().is_empty() {
            return Err(VocabError::EmptyMeaning);
        }

        let example = example
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Self {
            id,
            set_id,
            hangul: hangul.trim().to_owned(),
            romanization: romanization.trim().to_owned(),
            meaning: meaning.trim().to_owned(),
            example,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> VocabEntryId {
        self.id
    }

    #[must_use]
    pub fn set_id(&self) -> VocabSetId {
        self.set_id
    }

    #[must_use]
    pub fn hangul(&self) -> &str {
        &self.hangul
    }

    #[must_use]
    pub fn romanization(&self) -> &str {
        &self.romanization
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
