use thiserror::Error;

use crate::model::{ClassError, LessonError, PostError, QuestionError, TryoutError, VocabError};

/// Aggregate domain error for callers that span several model areas.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Class(#[from] ClassError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Vocab(#[from] VocabError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Tryout(#[from] TryoutError),
    #[error(transparent)]
    Post(#[from] PostError),
}
