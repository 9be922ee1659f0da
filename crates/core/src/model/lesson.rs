use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::model::ids::{ClassId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson video URL is not a valid URL")]
    InvalidVideoUrl,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// One unit of course content ("materi") within a class.
///
/// Lessons of a class form a total order by `order`; the storage layer
/// rejects duplicate `(class_id, order)` pairs, so callers can rely on the
/// rank being unique when they fetch the ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    class_id: ClassId,
    title: String,
    order: u32,
    requires_passing_score: bool,
    video_url: Option<String>,
    body: String,
    created_at: DateTime<Utc>,
}

impl Lesson {
    /// Creates a new lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or
    /// whitespace-only, and `LessonError::InvalidVideoUrl` if a video URL is
    /// present but does not parse.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LessonId,
        class_id: ClassId,
        title: impl Into<String>,
        order: u32,
        requires_passing_score: bool,
        video_url: Option<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        let video_url = video_url
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty());
        if let Some(raw) = video_url.as_ref() {
            if Url::parse(raw).is_err() {
                return Err(LessonError::InvalidVideoUrl);
            }
        }

        Ok(Self {
            id,
            class_id,
            title: title.trim().to_owned(),
            order,
            requires_passing_score,
            video_url,
            body: body.into(),
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rank of this lesson within its class sequence.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// True if an assessment must be passed before successors unlock and
    /// before this lesson counts as fully completed.
    #[must_use]
    pub fn requires_passing_score(&self) -> bool {
        self.requires_passing_score
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
