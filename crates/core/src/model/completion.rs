use chrono::{DateTime, Utc};

use crate::model::ids::{LessonId, UserId};

/// Per-user, per-lesson completion state.
///
/// At most one record exists per `(user, lesson)` pair; the storage layer
/// enforces that with a composite key. A record is created on the first
/// content-view event and is never deleted while the user stays enrolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    user_id: UserId,
    lesson_id: LessonId,
    content_viewed: bool,
    assessment_passed: bool,
    first_viewed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CompletionRecord {
    /// Creates the record for a user's first view of a lesson.
    #[must_use]
    pub fn on_first_view(user_id: UserId, lesson_id: LessonId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            lesson_id,
            content_viewed: true,
            assessment_passed: false,
            first_viewed_at: now,
            updated_at: now,
        }
    }

    /// Rehydrates a record from persisted storage.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        lesson_id: LessonId,
        content_viewed: bool,
        assessment_passed: bool,
        first_viewed_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            content_viewed,
            assessment_passed,
            first_viewed_at,
            updated_at,
        }
    }

    /// Marks the lesson's content as viewed. Idempotent.
    pub fn mark_viewed(&mut self, now: DateTime<Utc>) {
        self.content_viewed = true;
        self.updated_at = now;
    }

    /// Records the outcome of an assessment submission.
    ///
    /// The latest submission wins; a failing submission after a passing one
    /// does not revoke the pass (passing is sticky, matching how the
    /// platform treats retakes).
    pub fn record_assessment(&mut self, passed: bool, now: DateTime<Utc>) {
        if passed {
            self.assessment_passed = true;
        }
        self.updated_at = now;
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn content_viewed(&self) -> bool {
        self.content_viewed
    }

    /// Meaningless when the lesson does not require an assessment; the gate
    /// ignores it in that case.
    #[must_use]
    pub fn assessment_passed(&self) -> bool {
        self.assessment_passed
    }

    #[must_use]
    pub fn first_viewed_at(&self) -> DateTime<Utc> {
        self.first_viewed_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
