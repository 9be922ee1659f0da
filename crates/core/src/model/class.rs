use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::ClassId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassError {
    #[error("class name cannot be empty")]
    EmptyName,

    #[error("passing score must be in 1..=100, got {provided}")]
    InvalidPassingScore { provided: u8 },
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// Proficiency band a class is pitched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ClassLevel {
    /// Stable storage tag for this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClassLevel::Beginner => "beginner",
            ClassLevel::Intermediate => "intermediate",
            ClassLevel::Advanced => "advanced",
        }
    }

    /// Parse a storage tag back into a level.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beginner" => Some(ClassLevel::Beginner),
            "intermediate" => Some(ClassLevel::Intermediate),
            "advanced" => Some(ClassLevel::Advanced),
            _ => None,
        }
    }
}

//
// ─── CLASS ─────────────────────────────────────────────────────────────────────
//

/// Default assessment threshold applied when a class does not override it.
pub const DEFAULT_PASSING_SCORE: u8 = 70;

/// A class ("kelas") groups an ordered sequence of lessons.
///
/// The `passing_score` is the class-wide percentage threshold used when
/// grading lesson assessments; lessons flagged as requiring a passing score
/// gate their successors on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    id: ClassId,
    name: String,
    description: Option<String>,
    level: ClassLevel,
    passing_score: u8,
    created_at: DateTime<Utc>,
}

impl Class {
    /// Creates a new class.
    ///
    /// # Errors
    ///
    /// Returns `ClassError::EmptyName` if the name is empty or whitespace-only.
    /// Returns `ClassError::InvalidPassingScore` if the score is outside `1..=100`.
    pub fn new(
        id: ClassId,
        name: impl Into<String>,
        description: Option<String>,
        level: ClassLevel,
        passing_score: u8,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ClassError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClassError::EmptyName);
        }
        if !(1..=100).contains(&passing_score) {
            return Err(ClassError::InvalidPassingScore {
                provided: passing_score,
            });
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            description,
            level,
            passing_score,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn level(&self) -> ClassLevel {
        self.level
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn class_new_rejects_empty_name() {
        let err = Class::new(
            ClassId::new(1),
            "   ",
            None,
            ClassLevel::Beginner,
            DEFAULT_PASSING_SCORE,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ClassError::EmptyName);
    }

    #[test]
    fn class_new_rejects_out_of_range_passing_score() {
        for provided in [0, 101] {
            let err = Class::new(
                ClassId::new(1),
                "TOPIK I",
                None,
                ClassLevel::Beginner,
                provided,
                fixed_now(),
            )
            .unwrap_err();
            assert_eq!(err, ClassError::InvalidPassingScore { provided });
        }
    }

    #[test]
    fn class_trims_name_and_description() {
        let class = Class::new(
            ClassId::new(1),
            "  Hangul Basics  ",
            Some("  reading + writing  ".into()),
            ClassLevel::Beginner,
            DEFAULT_PASSING_SCORE,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(class.name(), "Hangul Basics");
        assert_eq!(class.description(), Some("reading + writing"));
    }

    #[test]
    fn class_filters_empty_description() {
        let class = Class::new(
            ClassId::new(1),
            "TOPIK II",
            Some("   ".into()),
            ClassLevel::Advanced,
            80,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(class.description(), None);
        assert_eq!(class.passing_score(), 80);
    }

    #[test]
    fn level_storage_tags_roundtrip() {
        for level in [
            ClassLevel::Beginner,
            ClassLevel::Intermediate,
            ClassLevel::Advanced,
        ] {
            assert_eq!(ClassLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(ClassLevel::parse("expert"), None);
    }
}
