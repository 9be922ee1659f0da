use chrono::{DateTime, Utc};

use crate::model::ids::UserId;

/// What happened, from the learner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    LessonUnlocked,
    LevelUp,
    StreakMilestone,
    TryoutGraded,
}

impl NotificationKind {
    /// Stable storage tag for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::LessonUnlocked => "lesson_unlocked",
            NotificationKind::LevelUp => "level_up",
            NotificationKind::StreakMilestone => "streak_milestone",
            NotificationKind::TryoutGraded => "tryout_graded",
        }
    }

    /// Parse a storage tag back into a kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lesson_unlocked" => Some(NotificationKind::LessonUnlocked),
            "level_up" => Some(NotificationKind::LevelUp),
            "streak_milestone" => Some(NotificationKind::StreakMilestone),
            "tryout_graded" => Some(NotificationKind::TryoutGraded),
            _ => None,
        }
    }
}

/// An in-app notification row.
///
/// The push transport is out of scope; these records are what an in-app
/// inbox lists. `id` is `None` until the storage layer assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// Creates an unread notification awaiting a storage-assigned ID.
    #[must_use]
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            kind,
            message: message.into(),
            created_at,
            read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn kind_tags_roundtrip() {
        for kind in [
            NotificationKind::LessonUnlocked,
            NotificationKind::LevelUp,
            NotificationKind::StreakMilestone,
            NotificationKind::TryoutGraded,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("marketing"), None);
    }

    #[test]
    fn new_notifications_start_unread() {
        let n = Notification::new(
            UserId::new(3),
            NotificationKind::LevelUp,
            "Level 4 reached",
            fixed_now(),
        );
        assert!(!n.read);
        assert_eq!(n.id, None);
    }
}
