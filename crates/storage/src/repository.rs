//! Repository contracts for the platform's persisted entities.
//!
//! Each trait covers one aggregate; implementations exist in-memory (tests,
//! prototyping) and on SQLite. `New*Record` structs carry the persisted shape
//! of an entity whose ID the storage layer assigns on insert, so validated
//! domain values never leak placeholder IDs into storage.

use async_trait::async_trait;
use baeum_core::gamification::{Streak, XpReason};
use baeum_core::model::{
    AttemptId, Class, ClassId, ClassLevel, Comment, CommentId, CompletionRecord, Lesson, LessonId,
    Notification, Post, PostId, Question, QuestionId, Tryout, TryoutAttempt, TryoutId, UserId,
    VocabEntry, VocabEntryId, VocabSet, VocabSetId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated, e.g. a duplicate
    /// `(class_id, order)` lesson rank.
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── NEW-ENTITY RECORDS ────────────────────────────────────────────────────────
//

/// Persisted shape for a class awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewClassRecord {
    pub name: String,
    pub description: Option<String>,
    pub level: ClassLevel,
    pub passing_score: u8,
    pub created_at: DateTime<Utc>,
}

impl NewClassRecord {
    #[must_use]
    pub fn from_class(class: &Class) -> Self {
        Self {
            name: class.name().to_owned(),
            description: class.description().map(str::to_owned),
            level: class.level(),
            passing_score: class.passing_score(),
            created_at: class.created_at(),
        }
    }
}

/// Persisted shape for a lesson awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewLessonRecord {
    pub class_id: ClassId,
    pub title: String,
    pub order: u32,
    pub requires_passing_score: bool,
    pub video_url: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl NewLessonRecord {
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            class_id: lesson.class_id(),
            title: lesson.title().to_owned(),
            order: lesson.order(),
            requires_passing_score: lesson.requires_passing_score(),
            video_url: lesson.video_url().map(str::to_owned),
            body: lesson.body().to_owned(),
            created_at: lesson.created_at(),
        }
    }
}

/// Persisted shape for a vocabulary set awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewVocabSetRecord {
    pub class_id: Option<ClassId>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewVocabSetRecord {
    #[must_use]
    pub fn from_set(set: &VocabSet) -> Self {
        Self {
            class_id: set.class_id(),
            name: set.name().to_owned(),
            created_at: set.created_at(),
        }
    }
}

/// Persisted shape for a vocabulary entry awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewVocabEntryRecord {
    pub set_id: VocabSetId,
    pub hangul: String,
    pub romanization: String,
    pub meaning: String,
    pub example: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewVocabEntryRecord {
    #[must_use]
    pub fn from_entry(entry: &VocabEntry) -> Self {
        Self {
            set_id: entry.set_id(),
            hangul: entry.hangul().to_owned(),
            romanization: entry.romanization().to_owned(),
            meaning: entry.meaning().to_owned(),
            example: entry.example().map(str::to_owned),
            created_at: entry.created_at(),
        }
    }
}

/// Persisted shape for a question awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewQuestionRecord {
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
    pub explanation: Option<String>,
}

impl NewQuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            prompt: question.prompt().to_owned(),
            choices: question.choices().to_vec(),
            correct_choice: question.correct_choice(),
            explanation: question.explanation().map(str::to_owned),
        }
    }
}

/// Persisted shape for a tryout awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewTryoutRecord {
    pub title: String,
    pub question_ids: Vec<QuestionId>,
    pub duration_minutes: u32,
    pub passing_score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl NewTryoutRecord {
    #[must_use]
    pub fn from_tryout(tryout: &Tryout) -> Self {
        Self {
            title: tryout.title().to_owned(),
            question_ids: tryout.question_ids().to_vec(),
            duration_minutes: tryout.duration_minutes(),
            passing_score: tryout.passing_score(),
            created_at: tryout.created_at(),
        }
    }
}

/// Persisted shape for a post awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewPostRecord {
    pub author: UserId,
    pub body: String,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPostRecord {
    #[must_use]
    pub fn from_post(post: &Post) -> Self {
        Self {
            author: post.author(),
            body: post.body().to_owned(),
            attachment_url: post.attachment_url().map(str::to_owned),
            created_at: post.created_at(),
        }
    }
}

/// Persisted shape for a comment awaiting an ID.
#[derive(Debug, Clone)]
pub struct NewCommentRecord {
    pub post_id: PostId,
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl NewCommentRecord {
    #[must_use]
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            post_id: comment.post_id(),
            author: comment.author(),
            body: comment.body().to_owned(),
            created_at: comment.created_at(),
        }
    }
}

//
// ─── XP LEDGER ─────────────────────────────────────────────────────────────────
//

/// One row of the append-only XP ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpEventRecord {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub reason: XpReason,
    pub amount: u64,
    pub awarded_at: DateTime<Utc>,
}

impl XpEventRecord {
    /// Builds a ledger row for an award, taking the amount from the reason.
    #[must_use]
    pub fn new(user_id: UserId, reason: XpReason, awarded_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            reason,
            amount: reason.amount(),
            awarded_at,
        }
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Classes and their ordered lesson sequences.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Persist a new class, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the class cannot be stored.
    async fn insert_class(&self, record: NewClassRecord) -> Result<ClassId, StorageError>;

    /// Persist or update an existing class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the class cannot be stored.
    async fn upsert_class(&self, class: &Class) -> Result<(), StorageError>;

    /// Fetch a class by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError>;

    /// List classes ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_classes(&self, limit: u32) -> Result<Vec<Class>, StorageError>;

    /// Persist a new lesson, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the class already has a lesson at
    /// the record's order rank.
    async fn insert_lesson(&self, record: NewLessonRecord) -> Result<LessonId, StorageError>;

    /// Fetch a lesson by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// The class's lessons sorted ascending by order rank.
    ///
    /// This is the ordering the progress gate relies on; implementations
    /// must never return an unsorted sequence.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn lessons_for_class(&self, class_id: ClassId) -> Result<Vec<Lesson>, StorageError>;
}

/// Which learners belong to which classes.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Enroll a user into a class. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn enroll(
        &self,
        user_id: UserId,
        class_id: ClassId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// True if the user is enrolled in the class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn is_enrolled(&self, user_id: UserId, class_id: ClassId) -> Result<bool, StorageError>;

    /// Classes the user is enrolled in, ordered by class ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn enrolled_classes(&self, user_id: UserId) -> Result<Vec<ClassId>, StorageError>;
}

/// Per-user, per-lesson completion records.
///
/// The `(user, lesson)` pair is the primary key; `upsert_record` is the only
/// write path, so uniqueness lives here rather than in application locks.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Fetch the record for one `(user, lesson)` pair. `Ok(None)` means the
    /// lesson was never started — a valid state, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_record(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<CompletionRecord>, StorageError>;

    /// All of one user's records for lessons of one class, in one query.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn records_for_user_in_class(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<Vec<CompletionRecord>, StorageError>;

    /// Insert or update the record keyed by `(user, lesson)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_record(&self, record: &CompletionRecord) -> Result<(), StorageError>;
}

/// Vocabulary sets and entries.
#[async_trait]
pub trait VocabRepository: Send + Sync {
    /// Persist a new vocabulary set, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn insert_set(&self, record: NewVocabSetRecord) -> Result<VocabSetId, StorageError>;

    /// Fetch a set by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_set(&self, id: VocabSetId) -> Result<Option<VocabSet>, StorageError>;

    /// List sets ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_sets(&self, limit: u32) -> Result<Vec<VocabSet>, StorageError>;

    /// Persist a new entry, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the set does not exist.
    async fn insert_entry(&self, record: NewVocabEntryRecord)
        -> Result<VocabEntryId, StorageError>;

    /// Entries of a set ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn entries_for_set(&self, set_id: VocabSetId) -> Result<Vec<VocabEntry>, StorageError>;
}

/// Question banks, tryouts, and attempts.
#[async_trait]
pub trait TryoutRepository: Send + Sync {
    /// Persist a new question, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(&self, record: NewQuestionRecord)
        -> Result<QuestionId, StorageError>;

    /// Fetch questions by ID, preserving the requested order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if any requested question is missing.
    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError>;

    /// Persist a new tryout, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if a referenced question is missing.
    async fn insert_tryout(&self, record: NewTryoutRecord) -> Result<TryoutId, StorageError>;

    /// Fetch a tryout by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_tryout(&self, id: TryoutId) -> Result<Option<Tryout>, StorageError>;

    /// Persist a freshly started attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt ID already exists.
    async fn insert_attempt(&self, attempt: &TryoutAttempt) -> Result<(), StorageError>;

    /// Persist the new state of an existing attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the attempt does not exist.
    async fn update_attempt(&self, attempt: &TryoutAttempt) -> Result<(), StorageError>;

    /// Fetch an attempt by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_attempt(&self, id: AttemptId) -> Result<Option<TryoutAttempt>, StorageError>;

    /// A user's attempts, most recently started first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TryoutAttempt>, StorageError>;
}

/// XP ledger and streak state.
#[async_trait]
pub trait GamificationRepository: Send + Sync {
    /// Append one ledger row, returning its assigned row ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the event cannot be stored.
    async fn append_xp_event(&self, event: XpEventRecord) -> Result<i64, StorageError>;

    /// Sum of all XP the user has been awarded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn total_xp(&self, user_id: UserId) -> Result<u64, StorageError>;

    /// The user's streak, if any activity was ever recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_streak(&self, user_id: UserId) -> Result<Option<Streak>, StorageError>;

    /// Insert or update the user's streak row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the streak cannot be stored.
    async fn upsert_streak(&self, user_id: UserId, streak: &Streak) -> Result<(), StorageError>;
}

/// Social posts and comments.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new post, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the post cannot be stored.
    async fn insert_post(&self, record: NewPostRecord) -> Result<PostId, StorageError>;

    /// Fetch a post by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError>;

    /// Posts newest-first, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_posts(&self, limit: u32) -> Result<Vec<Post>, StorageError>;

    /// Persist a new comment, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the post does not exist.
    async fn insert_comment(&self, record: NewCommentRecord) -> Result<CommentId, StorageError>;

    /// Comments of a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StorageError>;
}

/// In-app notification inbox rows.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Append one notification, returning its assigned row ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the notification cannot be stored.
    async fn append(&self, notification: &Notification) -> Result<i64, StorageError>;

    /// The user's unread notifications, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn unread_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, StorageError>;

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row does not exist.
    async fn mark_read(&self, id: i64) -> Result<(), StorageError>;
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates every repository behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub classes: Arc<dyn ClassRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub completions: Arc<dyn CompletionRepository>,
    pub vocab: Arc<dyn VocabRepository>,
    pub tryouts: Arc<dyn TryoutRepository>,
    pub gamification: Arc<dyn GamificationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Storage {
    /// Build a `Storage` backed by the in-memory repository.
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = crate::memory::InMemoryRepository::new();
        Self::from_repo(Arc::new(repo))
    }

    pub(crate) fn from_repo<R>(repo: Arc<R>) -> Self
    where
        R: ClassRepository
            + EnrollmentRepository
            + CompletionRepository
            + VocabRepository
            + TryoutRepository
            + GamificationRepository
            + PostRepository
            + NotificationRepository
            + 'static,
    {
        Self {
            classes: repo.clone(),
            enrollments: repo.clone(),
            completions: repo.clone(),
            vocab: repo.clone(),
            tryouts: repo.clone(),
            gamification: repo.clone(),
            posts: repo.clone(),
            notifications: repo,
        }
    }
}
