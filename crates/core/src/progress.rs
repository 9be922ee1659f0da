//! Sequential content-unlock derivation for a class's lesson sequence.
//!
//! Given the ordered lessons of a class and a learner's completion records,
//! [`evaluate`] derives which lessons are currently accessible, which are
//! fully completed, and the aggregate completion summary. The derivation is
//! pure: it never mutates its inputs, performs no I/O, and is safe to call
//! repeatedly and concurrently.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{CompletionRecord, Lesson, LessonId};

//
// ─── INPUT PROJECTIONS ─────────────────────────────────────────────────────────
//

/// Minimal read-only projection of a lesson the gate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateLesson {
    pub lesson_id: LessonId,
    pub requires_passing_score: bool,
}

impl GateLesson {
    #[must_use]
    pub fn new(lesson_id: LessonId, requires_passing_score: bool) -> Self {
        Self {
            lesson_id,
            requires_passing_score,
        }
    }
}

impl From<&Lesson> for GateLesson {
    fn from(lesson: &Lesson) -> Self {
        Self {
            lesson_id: lesson.id(),
            requires_passing_score: lesson.requires_passing_score(),
        }
    }
}

/// Projection of a completion record as the gate sees it.
///
/// A missing record is the valid "not started" state, not an error;
/// [`LessonStatus::not_started`] is what the evaluator substitutes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LessonStatus {
    pub content_viewed: bool,
    pub assessment_passed: bool,
}

impl LessonStatus {
    #[must_use]
    pub fn new(content_viewed: bool, assessment_passed: bool) -> Self {
        Self {
            content_viewed,
            assessment_passed,
        }
    }

    #[must_use]
    pub fn not_started() -> Self {
        Self::default()
    }
}

impl From<&CompletionRecord> for LessonStatus {
    fn from(record: &CompletionRecord) -> Self {
        Self {
            content_viewed: record.content_viewed(),
            assessment_passed: record.assessment_passed(),
        }
    }
}

//
// ─── DERIVED OUTPUT ────────────────────────────────────────────────────────────
//

/// Per-lesson derived gate state.
///
/// `is_fully_completed` is independent of `is_accessible`: a lesson whose own
/// record says viewed (and passed, where required) counts as completed even
/// while an unsatisfied predecessor keeps it locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonGate {
    pub lesson_id: LessonId,
    pub is_accessible: bool,
    pub is_fully_completed: bool,
}

/// Aggregate completion summary over the whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed_count: usize,
    pub total_count: usize,
    /// `round(100 * completed / total)`, `0` when the sequence is empty.
    pub completion_percentage: u8,
}

impl ProgressSummary {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn derive(completed_count: usize, total_count: usize) -> Self {
        let completion_percentage = if total_count == 0 {
            0
        } else {
            (100.0 * completed_count as f64 / total_count as f64).round() as u8
        };

        Self {
            completed_count,
            total_count,
            completion_percentage,
        }
    }
}

/// Full result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResult {
    pub lessons: Vec<LessonGate>,
    pub summary: ProgressSummary,
}

//
// ─── EVALUATOR ─────────────────────────────────────────────────────────────────
//

/// Derives accessibility and completion for every lesson in a class sequence.
///
/// `lessons` must already be sorted ascending by order rank — the evaluator
/// does not re-sort or re-validate; the sort invariant is enforced once,
/// upstream, where the lesson list is materialized. `records` may be missing
/// entries for any lesson (treated as not started).
///
/// Single forward pass, O(n):
///
/// 1. The first lesson is always accessible — it is the sequence's entry
///    point and has no predecessor to satisfy.
/// 2. Every later lesson is accessible iff its immediate predecessor's
///    content was viewed and, when the predecessor requires a passing score,
///    its assessment was passed. The rule is one-hop, not cumulative, so
///    re-opening an early lesson never retroactively locks later ones.
/// 3. Full completion is evaluated from the lesson's own record alone:
///    viewed, and passed where the lesson itself requires it.
#[must_use]
pub fn evaluate(
    lessons: &[GateLesson],
    records: &HashMap<LessonId, LessonStatus>,
) -> GateResult {
    let status_of = |lesson: &GateLesson| {
        records
            .get(&lesson.lesson_id)
            .copied()
            .unwrap_or_else(LessonStatus::not_started)
    };

    let mut out = Vec::with_capacity(lessons.len());
    let mut completed_count = 0;

    for (i, lesson) in lessons.iter().enumerate() {
        let is_accessible = if i == 0 {
            true
        } else {
            let prev = &lessons[i - 1];
            let prev_status = status_of(prev);
            prev_status.content_viewed
                && (!prev.requires_passing_score || prev_status.assessment_passed)
        };

        let own = status_of(lesson);
        let is_fully_completed = own.content_viewed
            && (!lesson.requires_passing_score || own.assessment_passed);
        if is_fully_completed {
            completed_count += 1;
        }

        out.push(LessonGate {
            lesson_id: lesson.lesson_id,
            is_accessible,
            is_fully_completed,
        });
    }

    GateResult {
        summary: ProgressSummary::derive(completed_count, lessons.len()),
        lessons: out,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
