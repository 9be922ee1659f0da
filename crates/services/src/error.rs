//! Shared error types for the services crate.

use thiserror::Error;

use baeum_core::model::{
    AttemptError, ClassError, LessonError, PostError, QuestionError, TryoutError, VocabError,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ClassService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassServiceError {
    #[error(transparent)]
    Class(#[from] ClassError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("user is not enrolled in this class")]
    NotEnrolled,
    #[error("lesson does not exist")]
    UnknownLesson,
    #[error("lesson is locked by an unsatisfied predecessor")]
    LessonLocked,
    #[error(transparent)]
    Gamification(#[from] GamificationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TryoutService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TryoutServiceError {
    #[error("tryout does not exist")]
    UnknownTryout,
    #[error("attempt does not exist")]
    UnknownAttempt,
    #[error(transparent)]
    Tryout(#[from] TryoutError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Gamification(#[from] GamificationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `VocabService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VocabServiceError {
    #[error("vocabulary set does not exist")]
    UnknownSet,
    #[error("drill needs at least {needed} entries, set has {available}")]
    NotEnoughEntries { needed: usize, available: usize },
    #[error(transparent)]
    Vocab(#[from] VocabError),
    #[error(transparent)]
    Gamification(#[from] GamificationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `GamificationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GamificationError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PostService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PostServiceError {
    #[error("post does not exist")]
    UnknownPost,
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Gamification(#[from] GamificationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
