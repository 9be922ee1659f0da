use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::ids::{AttemptId, QuestionId, TryoutId, UserId};
use crate::model::question::{Answer, GradeReport};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryoutError {
    #[error("tryout title cannot be empty")]
    EmptyTitle,

    #[error("tryout must reference at least one question")]
    NoQuestions,

    #[error("tryout duration must be > 0 minutes")]
    InvalidDuration,

    #[error("passing score must be in 1..=100, got {provided}")]
    InvalidPassingScore { provided: u8 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt has already been submitted")]
    AlreadySubmitted,

    #[error("expected {expected} answers, got {provided}")]
    AnswerCountMismatch { expected: usize, provided: usize },
}

//
// ─── TRYOUT ────────────────────────────────────────────────────────────────────
//

/// A timed mock exam over a fixed list of question-bank entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tryout {
    id: TryoutId,
    title: String,
    question_ids: Vec<QuestionId>,
    duration_minutes: u32,
    passing_score: Option<u8>,
    created_at: DateTime<Utc>,
}

impl Tryout {
    /// Creates a new tryout.
    ///
    /// # Errors
    ///
    /// Returns a `TryoutError` variant for an empty title, an empty question
    /// list, a zero duration, or an out-of-range passing score.
    pub fn new(
        id: TryoutId,
        title: impl Into<String>,
        question_ids: Vec<QuestionId>,
        duration_minutes: u32,
        passing_score: Option<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TryoutError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TryoutError::EmptyTitle);
        }
        if question_ids.is_empty() {
            return Err(TryoutError::NoQuestions);
        }
        if duration_minutes == 0 {
            return Err(TryoutError::InvalidDuration);
        }
        if let Some(score) = passing_score {
            if !(1..=100).contains(&score) {
                return Err(TryoutError::InvalidPassingScore { provided: score });
            }
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            question_ids,
            duration_minutes,
            passing_score,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> TryoutId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn passing_score(&self) -> Option<u8> {
        self.passing_score
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// Lifecycle state of a tryout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    InProgress,
    Submitted,
}

impl AttemptState {
    /// Stable storage tag for this state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptState::InProgress => "in_progress",
            AttemptState::Submitted => "submitted",
        }
    }

    /// Parse a storage tag back into a state.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(AttemptState::InProgress),
            "submitted" => Some(AttemptState::Submitted),
            _ => None,
        }
    }
}

/// One learner's run through a tryout.
///
/// `start` opens the attempt and fixes its deadline; `submit` grades it and
/// moves it to `Submitted`. Submitting past the deadline is allowed but
/// flagged as late — the platform scores late sheets rather than discarding
/// the learner's work.
#[derive(Debug, Clone, PartialEq)]
pub struct TryoutAttempt {
    id: AttemptId,
    tryout_id: TryoutId,
    user_id: UserId,
    state: AttemptState,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    answers: Vec<Answer>,
    score: Option<GradeReport>,
    late: bool,
}

impl TryoutAttempt {
    /// Opens a fresh attempt against the given tryout.
    #[must_use]
    pub fn start(tryout: &Tryout, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: AttemptId::generate(),
            tryout_id: tryout.id(),
            user_id,
            state: AttemptState::InProgress,
            started_at: now,
            deadline: now + tryout.duration(),
            submitted_at: None,
            answers: Vec::new(),
            score: None,
            late: false,
        }
    }

    /// Rehydrates an attempt from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: AttemptId,
        tryout_id: TryoutId,
        user_id: UserId,
        state: AttemptState,
        started_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
        submitted_at: Option<DateTime<Utc>>,
        answers: Vec<Answer>,
        score: Option<GradeReport>,
        late: bool,
    ) -> Self {
        Self {
            id,
            tryout_id,
            user_id,
            state,
            started_at,
            deadline,
            submitted_at,
            answers,
            score,
            late,
        }
    }

    /// Submits an answer sheet, recording the grade and closing the attempt.
    ///
    /// The caller grades the sheet against the tryout's questions (the
    /// attempt does not hold the questions themselves) and passes the report
    /// in alongside the raw answers.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AlreadySubmitted` on a second submit and
    /// `AttemptError::AnswerCountMismatch` if the sheet length does not match
    /// the graded report's total.
    pub fn submit(
        &mut self,
        answers: Vec<Answer>,
        report: GradeReport,
        now: DateTime<Utc>,
    ) -> Result<(), AttemptError> {
        if self.state == AttemptState::Submitted {
            return Err(AttemptError::AlreadySubmitted);
        }
        if answers.len() != report.total {
            return Err(AttemptError::AnswerCountMismatch {
                expected: report.total,
                provided: answers.len(),
            });
        }

        self.state = AttemptState::Submitted;
        self.submitted_at = Some(now);
        self.late = now > self.deadline;
        self.answers = answers;
        self.score = Some(report);
        Ok(())
    }

    /// Whether the submitted score meets the tryout's passing threshold.
    ///
    /// `None` while in progress or when the tryout sets no threshold.
    #[must_use]
    pub fn passed(&self, tryout: &Tryout) -> Option<bool> {
        let report = self.score?;
        let threshold = tryout.passing_score()?;
        Some(report.meets(threshold))
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn tryout_id(&self) -> TryoutId {
        self.tryout_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn state(&self) -> AttemptState {
        self.state
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> Option<GradeReport> {
        self.score
    }

    #[must_use]
    pub fn is_late(&self) -> bool {
        self.late
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_tryout(passing_score: Option<u8>) -> Tryout {
        Tryout::new(
            TryoutId::new(1),
            "TOPIK I mock",
            vec![QuestionId::new(1), QuestionId::new(2)],
            30,
            passing_score,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn tryout_validation_rejects_bad_input() {
        let err = Tryout::new(TryoutId::new(1), " ", vec![QuestionId::new(1)], 30, None, fixed_now())
            .unwrap_err();
        assert_eq!(err, TryoutError::EmptyTitle);

        let err =
            Tryout::new(TryoutId::new(1), "Mock", Vec::new(), 30, None, fixed_now()).unwrap_err();
        assert_eq!(err, TryoutError::NoQuestions);

        let err = Tryout::new(
            TryoutId::new(1),
            "Mock",
            vec![QuestionId::new(1)],
            0,
            None,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TryoutError::InvalidDuration);

        let err = Tryout::new(
            TryoutId::new(1),
            "Mock",
            vec![QuestionId::new(1)],
            30,
            Some(0),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TryoutError::InvalidPassingScore { provided: 0 });
    }

    #[test]
    fn start_fixes_deadline_from_duration() {
        let tryout = build_tryout(None);
        let attempt = TryoutAttempt::start(&tryout, UserId::new(5), fixed_now());

        assert_eq!(attempt.state(), AttemptState::InProgress);
        assert_eq!(attempt.deadline(), fixed_now() + Duration::minutes(30));
        assert!(!attempt.is_late());
        assert_eq!(attempt.score(), None);
    }

    #[test]
    fn submit_on_time_records_score() {
        let tryout = build_tryout(Some(50));
        let mut attempt = TryoutAttempt::start(&tryout, UserId::new(5), fixed_now());

        let answers = vec![Answer::Selected { choice: 0 }, Answer::Blank];
        let report = GradeReport::derive(1, 2);
        let submitted_at = fixed_now() + Duration::minutes(10);
        attempt.submit(answers, report, submitted_at).unwrap();

        assert_eq!(attempt.state(), AttemptState::Submitted);
        assert_eq!(attempt.submitted_at(), Some(submitted_at));
        assert!(!attempt.is_late());
        assert_eq!(attempt.score(), Some(report));
        assert_eq!(attempt.passed(&tryout), Some(true));
    }

    #[test]
    fn submit_past_deadline_is_late_but_scored() {
        let tryout = build_tryout(Some(80));
        let mut attempt = TryoutAttempt::start(&tryout, UserId::new(5), fixed_now());

        let report = GradeReport::derive(1, 2);
        let submitted_at = fixed_now() + Duration::minutes(45);
        attempt
            .submit(vec![Answer::Blank, Answer::Blank], report, submitted_at)
            .unwrap();

        assert!(attempt.is_late());
        assert_eq!(attempt.score(), Some(report));
        assert_eq!(attempt.passed(&tryout), Some(false));
    }

    #[test]
    fn double_submit_is_rejected() {
        let tryout = build_tryout(None);
        let mut attempt = TryoutAttempt::start(&tryout, UserId::new(5), fixed_now());

        let report = GradeReport::derive(0, 2);
        attempt
            .submit(vec![Answer::Blank, Answer::Blank], report, fixed_now())
            .unwrap();

        let err = attempt
            .submit(vec![Answer::Blank, Answer::Blank], report, fixed_now())
            .unwrap_err();
        assert_eq!(err, AttemptError::AlreadySubmitted);
    }

    #[test]
    fn answer_count_must_match_report_total() {
        let tryout = build_tryout(None);
        let mut attempt = TryoutAttempt::start(&tryout, UserId::new(5), fixed_now());

        let err = attempt
            .submit(vec![Answer::Blank], GradeReport::derive(0, 2), fixed_now())
            .unwrap_err();
        assert_eq!(
            err,
            AttemptError::AnswerCountMismatch {
                expected: 2,
                provided: 1
            }
        );
    }

    #[test]
    fn passed_is_none_without_threshold_or_score() {
        let ungated = build_tryout(None);
        let mut attempt = TryoutAttempt::start(&ungated, UserId::new(5), fixed_now());
        assert_eq!(attempt.passed(&ungated), None);

        attempt
            .submit(
                vec![Answer::Blank, Answer::Blank],
                GradeReport::derive(2, 2),
                fixed_now(),
            )
            .unwrap();
        assert_eq!(attempt.passed(&ungated), None);

        let gated = build_tryout(Some(90));
        let open = TryoutAttempt::start(&gated, UserId::new(5), fixed_now());
        assert_eq!(open.passed(&gated), None);
    }

    #[test]
    fn attempt_state_tags_roundtrip() {
        for state in [AttemptState::InProgress, AttemptState::Submitted] {
            assert_eq!(AttemptState::parse(state.as_str()), Some(state));
        }
        assert_eq!(AttemptState::parse("abandoned"), None);
    }
}
