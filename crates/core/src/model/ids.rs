use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_u64_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`")]
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map($name::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

define_u64_id!(
    /// Unique identifier for a learner account
    UserId
);
define_u64_id!(
    /// Unique identifier for a class
    ClassId
);
define_u64_id!(
    /// Unique identifier for a lesson within a class
    LessonId
);
define_u64_id!(
    /// Unique identifier for a vocabulary set
    VocabSetId
);
define_u64_id!(
    /// Unique identifier for a vocabulary entry
    VocabEntryId
);
define_u64_id!(
    /// Unique identifier for a question-bank entry
    QuestionId
);
define_u64_id!(
    /// Unique identifier for a mock exam
    TryoutId
);
define_u64_id!(
    /// Unique identifier for a social post
    PostId
);
define_u64_id!(
    /// Unique identifier for a comment on a post
    CommentId
);

/// Unique identifier for a tryout attempt.
///
/// Attempt tokens are handed to clients while an attempt is open, so they are
/// random UUIDs rather than sequential integers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generates a fresh random attempt ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID (used when rehydrating from storage).
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID value
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttemptId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(AttemptId::from_uuid)
            .map_err(|_| ParseIdError { kind: "AttemptId" })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display() {
        let id = UserId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn class_id_from_str() {
        let id: ClassId = "123".parse().unwrap();
        assert_eq!(id, ClassId::new(123));
    }

    #[test]
    fn lesson_id_from_str_invalid() {
        let result = "not-a-number".parse::<LessonId>();
        assert!(result.is_err());
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", TryoutId::new(7)), "TryoutId(7)");
    }

    #[test]
    fn id_roundtrip() {
        let original = QuestionId::new(42);
        let serialized = original.to_string();
        let deserialized: QuestionId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn attempt_id_roundtrip() {
        let original = AttemptId::generate();
        let deserialized: AttemptId = original.to_string().parse().unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn attempt_id_rejects_garbage() {
        assert!("definitely-not-a-uuid".parse::<AttemptId>().is_err());
    }
}
