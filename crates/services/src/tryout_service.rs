use std::sync::Arc;

use baeum_core::Clock;
use baeum_core::gamification::XpReason;
use baeum_core::model::{
    grade, Answer, AttemptId, GradeReport, Notification, NotificationKind, Question, QuestionId,
    Tryout, TryoutAttempt, TryoutId, UserId,
};
use storage::repository::{
    NewQuestionRecord, NewTryoutRecord, NotificationRepository, TryoutRepository,
};

use crate::error::TryoutServiceError;
use crate::gamification_service::GamificationService;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// A graded, persisted submission.
#[derive(Debug, Clone)]
pub struct SubmittedAttempt {
    pub attempt: TryoutAttempt,
    pub report: GradeReport,
    /// `None` when the tryout declares no passing threshold.
    pub passed: Option<bool>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Runs the mock-exam lifecycle: authoring, starting attempts, grading
/// submissions, and handing out the related XP and notifications.
#[derive(Clone)]
pub struct TryoutService {
    clock: Clock,
    tryouts: Arc<dyn TryoutRepository>,
    notifications: Arc<dyn NotificationRepository>,
    gamification: GamificationService,
}

impl TryoutService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tryouts: Arc<dyn TryoutRepository>,
        notifications: Arc<dyn NotificationRepository>,
        gamification: GamificationService,
    ) -> Self {
        Self {
            clock,
            tryouts,
            notifications,
            gamification,
        }
    }

    /// Add one question to the bank.
    ///
    /// # Errors
    ///
    /// Returns `TryoutServiceError::Question` for validation failures and
    /// `TryoutServiceError::Storage` if persistence fails.
    pub async fn add_question(
        &self,
        prompt: String,
        choices: Vec<String>,
        correct_choice: usize,
        explanation: Option<String>,
    ) -> Result<QuestionId, TryoutServiceError> {
        let question = Question::new(
            QuestionId::new(1),
            prompt,
            choices,
            correct_choice,
            explanation,
        )?;
        let question_id = self
            .tryouts
            .insert_question(NewQuestionRecord::from_question(&question))
            .await?;
        Ok(question_id)
    }

    /// Create a tryout over existing bank questions.
    ///
    /// # Errors
    ///
    /// Returns `TryoutServiceError::Tryout` for validation failures and
    /// `TryoutServiceError::Storage(NotFound)` for dangling question IDs.
    pub async fn create_tryout(
        &self,
        title: String,
        question_ids: Vec<QuestionId>,
        duration_minutes: u32,
        passing_score: Option<u8>,
    ) -> Result<TryoutId, TryoutServiceError> {
        let now = self.clock.now();
        let tryout = Tryout::new(
            TryoutId::new(1),
            title,
            question_ids,
            duration_minutes,
            passing_score,
            now,
        )?;
        let tryout_id = self
            .tryouts
            .insert_tryout(NewTryoutRecord::from_tryout(&tryout))
            .await?;
        Ok(tryout_id)
    }

    /// The questions of a tryout in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `TryoutServiceError::UnknownTryout` if the tryout is missing.
    pub async fn questions(&self, tryout_id: TryoutId) -> Result<Vec<Question>, TryoutServiceError> {
        let tryout = self
            .tryouts
            .get_tryout(tryout_id)
            .await?
            .ok_or(TryoutServiceError::UnknownTryout)?;
        let questions = self.tryouts.get_questions(tryout.question_ids()).await?;
        Ok(questions)
    }

    /// Open an attempt; the deadline is fixed from the tryout's duration.
    ///
    /// # Errors
    ///
    /// Returns `TryoutServiceError::UnknownTryout` if the tryout is missing.
    pub async fn start_attempt(
        &self,
        tryout_id: TryoutId,
        user_id: UserId,
    ) -> Result<TryoutAttempt, TryoutServiceError> {
        let tryout = self
            .tryouts
            .get_tryout(tryout_id)
            .await?
            .ok_or(TryoutServiceError::UnknownTryout)?;

        let attempt = TryoutAttempt::start(&tryout, user_id, self.clock.now());
        self.tryouts.insert_attempt(&attempt).await?;
        Ok(attempt)
    }

    /// Grade a submitted answer sheet and close the attempt.
    ///
    /// Awards submission XP, pass XP when the threshold is met, and leaves a
    /// `TryoutGraded` notification with the score.
    ///
    /// # Errors
    ///
    /// Returns `TryoutServiceError::UnknownAttempt` / `UnknownTryout` for
    /// dangling IDs and `TryoutServiceError::Attempt` for double submits or
    /// sheet-length mismatches.
    pub async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        answers: Vec<Answer>,
    ) -> Result<SubmittedAttempt, TryoutServiceError> {
        let mut attempt = self
            .tryouts
            .get_attempt(attempt_id)
            .await?
            .ok_or(TryoutServiceError::UnknownAttempt)?;
        let tryout = self
            .tryouts
            .get_tryout(attempt.tryout_id())
            .await?
            .ok_or(TryoutServiceError::UnknownTryout)?;

        let questions = self.tryouts.get_questions(tryout.question_ids()).await?;
        let report = grade(&questions, &answers);

        let now = self.clock.now();
        attempt.submit(answers, report, now)?;
        self.tryouts.update_attempt(&attempt).await?;

        let user_id = attempt.user_id();
        self.gamification
            .award(user_id, XpReason::TryoutSubmitted)
            .await?;

        let passed = attempt.passed(&tryout);
        if passed == Some(true) {
            self.gamification
                .award(user_id, XpReason::TryoutPassed)
                .await?;
        }

        self.notifications
            .append(&Notification::new(
                user_id,
                NotificationKind::TryoutGraded,
                format!(
                    "\"{}\" graded: {}/{} ({}%)",
                    tryout.title(),
                    report.correct,
                    report.total,
                    report.score_percentage
                ),
                now,
            ))
            .await?;

        Ok(SubmittedAttempt {
            attempt,
            report,
            passed,
        })
    }

    /// A user's attempts, most recently started first.
    ///
    /// # Errors
    ///
    /// Returns `TryoutServiceError::Storage` if repository access fails.
    pub async fn attempt_history(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TryoutAttempt>, TryoutServiceError> {
        let attempts = self.tryouts.attempts_for_user(user_id, limit).await?;
        Ok(attempts)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use baeum_core::model::AttemptState;
    use baeum_core::time::fixed_clock;
    use storage::InMemoryRepository;

    async fn build_service() -> (Arc<InMemoryRepository>, TryoutService) {
        let repo = Arc::new(InMemoryRepository::new());
        let gamification = GamificationService::new(fixed_clock(), repo.clone(), repo.clone());
        let service = TryoutService::new(fixed_clock(), repo.clone(), repo.clone(), gamification);
        (repo, service)
    }

    async fn seed_tryout(service: &TryoutService, passing_score: Option<u8>) -> TryoutId {
        let q1 = service
            .add_question(
                "What does 네 mean?".into(),
                vec!["yes".into(), "no".into()],
                0,
                None,
            )
            .await
            .unwrap();
        let q2 = service
            .add_question(
                "What does 아니요 mean?".into(),
                vec!["yes".into(), "no".into()],
                1,
                None,
            )
            .await
            .unwrap();

        service
            .create_tryout("Placement mock".into(), vec![q1, q2], 30, passing_score)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn full_attempt_lifecycle_scores_and_notifies() {
        let (repo, service) = build_service().await;
        let tryout_id = seed_tryout(&service, Some(60)).await;
        let user = UserId::new(5);

        let attempt = service.start_attempt(tryout_id, user).await.unwrap();
        assert_eq!(attempt.state(), AttemptState::InProgress);

        let submitted = service
            .submit_attempt(
                attempt.id(),
                vec![Answer::Selected { choice: 0 }, Answer::Selected { choice: 1 }],
            )
            .await
            .unwrap();

        assert_eq!(submitted.report.score_percentage, 100);
        assert_eq!(submitted.passed, Some(true));
        assert_eq!(submitted.attempt.state(), AttemptState::Submitted);

        let unread = repo.unread_for_user(user).await.unwrap();
        assert!(
            unread
                .iter()
                .any(|n| n.kind == NotificationKind::TryoutGraded)
        );
    }

    #[tokio::test]
    async fn pass_awards_more_xp_than_plain_submission() {
        let (repo, service) = build_service().await;
        let tryout_id = seed_tryout(&service, Some(60)).await;

        let passer = UserId::new(1);
        let attempt = service.start_attempt(tryout_id, passer).await.unwrap();
        service
            .submit_attempt(
                attempt.id(),
                vec![Answer::Selected { choice: 0 }, Answer::Selected { choice: 1 }],
            )
            .await
            .unwrap();

        let failer = UserId::new(2);
        let attempt = service.start_attempt(tryout_id, failer).await.unwrap();
        service
            .submit_attempt(attempt.id(), vec![Answer::Blank, Answer::Blank])
            .await
            .unwrap();

        use storage::repository::GamificationRepository as _;
        assert_eq!(repo.total_xp(passer).await.unwrap(), 100);
        assert_eq!(repo.total_xp(failer).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn double_submit_is_rejected() {
        let (_, service) = build_service().await;
        let tryout_id = seed_tryout(&service, None).await;

        let attempt = service
            .start_attempt(tryout_id, UserId::new(1))
            .await
            .unwrap();
        service
            .submit_attempt(attempt.id(), vec![Answer::Blank, Answer::Blank])
            .await
            .unwrap();

        let err = service
            .submit_attempt(attempt.id(), vec![Answer::Blank, Answer::Blank])
            .await
            .unwrap_err();
        assert!(matches!(err, TryoutServiceError::Attempt(_)));
    }

    #[tokio::test]
    async fn unknown_ids_error_cleanly() {
        let (_, service) = build_service().await;
        let err = service
            .start_attempt(TryoutId::new(404), UserId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TryoutServiceError::UnknownTryout));

        let err = service
            .submit_attempt(AttemptId::generate(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, TryoutServiceError::UnknownAttempt));
    }

    #[tokio::test]
    async fn history_returns_submitted_attempts() {
        let (_, service) = build_service().await;
        let tryout_id = seed_tryout(&service, None).await;
        let user = UserId::new(9);

        let attempt = service.start_attempt(tryout_id, user).await.unwrap();
        service
            .submit_attempt(attempt.id(), vec![Answer::Blank, Answer::Blank])
            .await
            .unwrap();

        let history = service.attempt_history(user, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id(), attempt.id());
        assert_eq!(history[0].state(), AttemptState::Submitted);
    }
}
