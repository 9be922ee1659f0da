//! Enrollment-scoped course progress: the persistence-aware shell around the
//! pure gate in `baeum_core::progress`.
//!
//! The gate itself never touches storage; this service is the caller that
//! materializes the ordered lesson list and the user's completion records
//! (one repository pass each, so the gate sees one consistent snapshot) and
//! feeds the derived result back out as view data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use baeum_core::Clock;
use baeum_core::gamification::XpReason;
use baeum_core::model::{
    ClassId, CompletionRecord, GradeReport, Lesson, LessonId, Notification, NotificationKind,
    UserId,
};
use baeum_core::progress::{self, GateLesson, GateResult, LessonStatus, ProgressSummary};
use storage::repository::{
    ClassRepository, CompletionRepository, EnrollmentRepository, NotificationRepository,
};

use crate::error::ProgressError;
use crate::gamification_service::{AwardOutcome, GamificationService};

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// One lesson as the enrolled learner sees it: metadata plus gate state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonProgressView {
    pub lesson_id: LessonId,
    pub title: String,
    pub order: u32,
    pub requires_passing_score: bool,
    pub is_accessible: bool,
    pub is_fully_completed: bool,
}

/// Full progress picture for one user in one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassProgress {
    pub class_id: ClassId,
    pub lessons: Vec<LessonProgressView>,
    pub summary: ProgressSummary,
}

/// Result of viewing a lesson: the updated record plus any XP side effect.
#[derive(Debug, Clone)]
pub struct LessonViewOutcome {
    pub record: CompletionRecord,
    pub award: Option<AwardOutcome>,
}

/// Result of an assessment submission against a lesson.
#[derive(Debug, Clone)]
pub struct AssessmentOutcome {
    pub passed: bool,
    pub record: CompletionRecord,
    pub progress: ClassProgress,
    pub newly_unlocked: Vec<LessonId>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Derives lesson accessibility/completion for enrolled learners and owns the
/// completion-record write paths (content viewed, assessment graded).
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    classes: Arc<dyn ClassRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    completions: Arc<dyn CompletionRepository>,
    notifications: Arc<dyn NotificationRepository>,
    gamification: GamificationService,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        classes: Arc<dyn ClassRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        completions: Arc<dyn CompletionRepository>,
        notifications: Arc<dyn NotificationRepository>,
        gamification: GamificationService,
    ) -> Self {
        Self {
            clock,
            classes,
            enrollments,
            completions,
            notifications,
            gamification,
        }
    }

    /// The user's gate-derived progress across a class's lesson sequence.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotEnrolled` if the user is not enrolled, or
    /// `ProgressError::Storage` if repository access fails.
    pub async fn class_progress(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<ClassProgress, ProgressError> {
        self.ensure_enrolled(user_id, class_id).await?;
        let (lessons, gate) = self.evaluate_gate(user_id, class_id).await?;
        Ok(assemble_progress(class_id, &lessons, &gate))
    }

    /// Record that the user viewed a lesson's content.
    ///
    /// Creates the completion record on the first view. Completing an
    /// ungated lesson this way awards lesson XP.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` if the lesson does not exist,
    /// `ProgressError::NotEnrolled` if the user is not enrolled in its class,
    /// and `ProgressError::LessonLocked` if the gate has not unlocked it.
    pub async fn view_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<LessonViewOutcome, ProgressError> {
        let lesson = self
            .classes
            .get_lesson(lesson_id)
            .await?
            .ok_or(ProgressError::UnknownLesson)?;
        self.ensure_enrolled(user_id, lesson.class_id()).await?;

        let (_, gate) = self.evaluate_gate(user_id, lesson.class_id()).await?;
        let entry = gate
            .lessons
            .iter()
            .find(|g| g.lesson_id == lesson_id)
            .ok_or(ProgressError::UnknownLesson)?;
        if !entry.is_accessible {
            return Err(ProgressError::LessonLocked);
        }

        let now = self.clock.now();
        let existing = self.completions.get_record(user_id, lesson_id).await?;
        let completed_before = existing
            .as_ref()
            .is_some_and(|r| is_fully_completed(&lesson, r));

        let record = match existing {
            Some(mut record) => {
                record.mark_viewed(now);
                record
            }
            None => CompletionRecord::on_first_view(user_id, lesson_id, now),
        };
        self.completions.upsert_record(&record).await?;

        let award = if !completed_before && is_fully_completed(&lesson, &record) {
            Some(
                self.gamification
                    .award(user_id, XpReason::LessonCompleted)
                    .await?,
            )
        } else {
            None
        };

        Ok(LessonViewOutcome { record, award })
    }

    /// Fold a graded assessment into the lesson's completion record.
    ///
    /// Passing means meeting the class-wide passing score. A newly earned
    /// pass awards XP, and any lessons the pass unlocked produce
    /// notifications so the learner sees what opened up.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` if the lesson does not exist and
    /// `ProgressError::NotEnrolled` if the user is not enrolled in its class.
    pub async fn record_assessment(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        report: GradeReport,
    ) -> Result<AssessmentOutcome, ProgressError> {
        let lesson = self
            .classes
            .get_lesson(lesson_id)
            .await?
            .ok_or(ProgressError::UnknownLesson)?;
        let class = self
            .classes
            .get_class(lesson.class_id())
            .await?
            .ok_or(ProgressError::UnknownLesson)?;
        self.ensure_enrolled(user_id, class.id()).await?;

        let (lessons, gate_before) = self.evaluate_gate(user_id, class.id()).await?;

        let now = self.clock.now();
        let passed = report.meets(class.passing_score());

        let existing = self.completions.get_record(user_id, lesson_id).await?;
        let passed_before = existing.as_ref().is_some_and(CompletionRecord::assessment_passed);
        let completed_before = existing
            .as_ref()
            .is_some_and(|r| is_fully_completed(&lesson, r));

        // Submitting the lesson's assessment counts as having opened the
        // lesson, so a missing record starts from the first-view state.
        let mut record = existing
            .unwrap_or_else(|| CompletionRecord::on_first_view(user_id, lesson_id, now));
        record.record_assessment(passed, now);
        self.completions.upsert_record(&record).await?;

        if passed && !passed_before {
            self.gamification
                .award(user_id, XpReason::AssessmentPassed)
                .await?;
        }
        if !completed_before && is_fully_completed(&lesson, &record) {
            self.gamification
                .award(user_id, XpReason::LessonCompleted)
                .await?;
        }

        let (_, gate_after) = self.evaluate_gate(user_id, class.id()).await?;
        let newly_unlocked =
            self.notify_unlocks(user_id, &lessons, &gate_before, &gate_after, now).await?;

        Ok(AssessmentOutcome {
            passed,
            record,
            progress: assemble_progress(class.id(), &lessons, &gate_after),
            newly_unlocked,
        })
    }

    async fn ensure_enrolled(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<(), ProgressError> {
        if self.enrollments.is_enrolled(user_id, class_id).await? {
            Ok(())
        } else {
            Err(ProgressError::NotEnrolled)
        }
    }

    /// One fetch of the ordered lessons, one fetch of the user's records,
    /// then the pure gate derivation over both.
    async fn evaluate_gate(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<(Vec<Lesson>, GateResult), ProgressError> {
        let lessons = self.classes.lessons_for_class(class_id).await?;
        let records = self
            .completions
            .records_for_user_in_class(user_id, class_id)
            .await?;

        let gate_lessons: Vec<GateLesson> = lessons.iter().map(GateLesson::from).collect();
        let statuses: HashMap<LessonId, LessonStatus> = records
            .iter()
            .map(|record| (record.lesson_id(), LessonStatus::from(record)))
            .collect();

        let gate = progress::evaluate(&gate_lessons, &statuses);
        Ok((lessons, gate))
    }

    async fn notify_unlocks(
        &self,
        user_id: UserId,
        lessons: &[Lesson],
        before: &GateResult,
        after: &GateResult,
        now: DateTime<Utc>,
    ) -> Result<Vec<LessonId>, ProgressError> {
        let mut unlocked = Vec::new();
        for (i, gate) in after.lessons.iter().enumerate() {
            let was_accessible = before
                .lessons
                .get(i)
                .is_some_and(|g| g.is_accessible);
            if gate.is_accessible && !was_accessible {
                unlocked.push(gate.lesson_id);
                if let Some(lesson) = lessons.iter().find(|l| l.id() == gate.lesson_id) {
                    self.notifications
                        .append(&Notification::new(
                            user_id,
                            NotificationKind::LessonUnlocked,
                            format!("\"{}\" is now unlocked", lesson.title()),
                            now,
                        ))
                        .await?;
                }
            }
        }
        Ok(unlocked)
    }
}

fn is_fully_completed(lesson: &Lesson, record: &CompletionRecord) -> bool {
    record.content_viewed()
        && (!lesson.requires_passing_score() || record.assessment_passed())
}

fn assemble_progress(class_id: ClassId, lessons: &[Lesson], gate: &GateResult) -> ClassProgress {
    let views = lessons
        .iter()
        .zip(gate.lessons.iter())
        .map(|(lesson, gate)| LessonProgressView {
            lesson_id: lesson.id(),
            title: lesson.title().to_owned(),
            order: lesson.order(),
            requires_passing_score: lesson.requires_passing_score(),
            is_accessible: gate.is_accessible,
            is_fully_completed: gate.is_fully_completed,
        })
        .collect();

    ClassProgress {
        class_id,
        lessons: views,
        summary: gate.summary,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use baeum_core::model::{ClassLevel, DEFAULT_PASSING_SCORE};
    use baeum_core::time::{fixed_clock, fixed_now};
    use storage::InMemoryRepository;
    use storage::repository::{NewClassRecord, NewLessonRecord};

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        service: ProgressService,
        class_id: ClassId,
        lessons: Vec<LessonId>,
    }

    async fn fixture(gating: &[bool]) -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let gamification = GamificationService::new(fixed_clock(), repo.clone(), repo.clone());
        let service = ProgressService::new(
            fixed_clock(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            gamification,
        );

        let class = baeum_core::model::Class::new(
            ClassId::new(1),
            "Hangul Basics",
            None,
            ClassLevel::Beginner,
            DEFAULT_PASSING_SCORE,
            fixed_now(),
        )
        .unwrap();
        let class_id = repo
            .insert_class(NewClassRecord::from_class(&class))
            .await
            .unwrap();

        let mut lessons = Vec::new();
        for (order, gated) in gating.iter().enumerate() {
            let lesson = baeum_core::model::Lesson::new(
                LessonId::new(1),
                class_id,
                format!("Lesson {order}"),
                u32::try_from(order).unwrap(),
                *gated,
                None,
                "",
                fixed_now(),
            )
            .unwrap();
            lessons.push(
                repo.insert_lesson(NewLessonRecord::from_lesson(&lesson))
                    .await
                    .unwrap(),
            );
        }

        repo.enroll(UserId::new(1), class_id, fixed_now())
            .await
            .unwrap();

        Fixture {
            repo,
            service,
            class_id,
            lessons,
        }
    }

    #[tokio::test]
    async fn progress_requires_enrollment() {
        let fx = fixture(&[false, false]).await;
        let err = fx
            .service
            .class_progress(UserId::new(99), fx.class_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::NotEnrolled));
    }

    #[tokio::test]
    async fn fresh_class_unlocks_only_the_first_lesson() {
        let fx = fixture(&[false, false, false]).await;
        let progress = fx
            .service
            .class_progress(UserId::new(1), fx.class_id)
            .await
            .unwrap();

        assert!(progress.lessons[0].is_accessible);
        assert!(!progress.lessons[1].is_accessible);
        assert!(!progress.lessons[2].is_accessible);
        assert_eq!(progress.summary.completion_percentage, 0);
    }

    #[tokio::test]
    async fn viewing_unlocks_successor_and_awards_xp() {
        let fx = fixture(&[false, false]).await;
        let user = UserId::new(1);

        let outcome = fx.service.view_lesson(user, fx.lessons[0]).await.unwrap();
        assert!(outcome.record.content_viewed());
        let award = outcome.award.expect("ungated first view completes");
        assert_eq!(award.reason, XpReason::LessonCompleted);

        let progress = fx.service.class_progress(user, fx.class_id).await.unwrap();
        assert!(progress.lessons[1].is_accessible);
        assert_eq!(progress.summary.completed_count, 1);
        assert_eq!(progress.summary.completion_percentage, 50);
    }

    #[tokio::test]
    async fn locked_lesson_cannot_be_viewed() {
        let fx = fixture(&[false, false]).await;
        let err = fx
            .service
            .view_lesson(UserId::new(1), fx.lessons[1])
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::LessonLocked));
    }

    #[tokio::test]
    async fn repeat_views_do_not_award_twice() {
        let fx = fixture(&[false]).await;
        let user = UserId::new(1);

        let first = fx.service.view_lesson(user, fx.lessons[0]).await.unwrap();
        assert!(first.award.is_some());
        let second = fx.service.view_lesson(user, fx.lessons[0]).await.unwrap();
        assert!(second.award.is_none());
    }

    #[tokio::test]
    async fn gated_lesson_blocks_successor_until_passed() {
        let fx = fixture(&[true, false]).await;
        let user = UserId::new(1);

        fx.service.view_lesson(user, fx.lessons[0]).await.unwrap();
        let progress = fx.service.class_progress(user, fx.class_id).await.unwrap();
        assert!(!progress.lessons[0].is_fully_completed);
        assert!(!progress.lessons[1].is_accessible);

        let failing = GradeReport::derive(1, 10);
        let outcome = fx
            .service
            .record_assessment(user, fx.lessons[0], failing)
            .await
            .unwrap();
        assert!(!outcome.passed);
        assert!(outcome.newly_unlocked.is_empty());
        assert!(!outcome.progress.lessons[1].is_accessible);

        let passing = GradeReport::derive(8, 10);
        let outcome = fx
            .service
            .record_assessment(user, fx.lessons[0], passing)
            .await
            .unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.newly_unlocked, vec![fx.lessons[1]]);
        assert!(outcome.progress.lessons[0].is_fully_completed);
        assert!(outcome.progress.lessons[1].is_accessible);

        let unread = fx.repo.unread_for_user(user).await.unwrap();
        assert!(
            unread
                .iter()
                .any(|n| n.kind == NotificationKind::LessonUnlocked)
        );
    }

    #[tokio::test]
    async fn class_progress_serializes_for_api_handlers() {
        let fx = fixture(&[false, true]).await;
        let user = UserId::new(1);
        fx.service.view_lesson(user, fx.lessons[0]).await.unwrap();

        let progress = fx.service.class_progress(user, fx.class_id).await.unwrap();
        let json = serde_json::to_value(&progress).unwrap();

        assert_eq!(json["summary"]["completed_count"], 1);
        assert_eq!(json["summary"]["completion_percentage"], 50);
        assert_eq!(json["lessons"][0]["is_fully_completed"], true);
        assert_eq!(json["lessons"][1]["is_accessible"], true);
        assert_eq!(json["lessons"][1]["requires_passing_score"], true);
    }

    #[tokio::test]
    async fn passing_is_sticky_for_the_gate() {
        let fx = fixture(&[true, false]).await;
        let user = UserId::new(1);

        fx.service.view_lesson(user, fx.lessons[0]).await.unwrap();
        fx.service
            .record_assessment(user, fx.lessons[0], GradeReport::derive(9, 10))
            .await
            .unwrap();

        // A later failing retake must not re-lock the successor.
        let outcome = fx
            .service
            .record_assessment(user, fx.lessons[0], GradeReport::derive(0, 10))
            .await
            .unwrap();
        assert!(!outcome.passed);
        assert!(outcome.progress.lessons[0].is_fully_completed);
        assert!(outcome.progress.lessons[1].is_accessible);
    }
}
