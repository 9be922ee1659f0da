use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least {min} choices, got {provided}")]
    TooFewChoices { min: usize, provided: usize },

    #[error("question allows at most {max} choices, got {provided}")]
    TooManyChoices { max: usize, provided: usize },

    #[error("choice {index} cannot be empty")]
    EmptyChoice { index: usize },

    #[error("correct choice index {provided} is out of range for {choices} choices")]
    CorrectChoiceOutOfRange { provided: usize, choices: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 6;

/// A multiple-choice question-bank entry ("soal").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    correct_choice: usize,
    explanation: Option<String>,
}

impl Question {
    /// Creates a new question.
    ///
    /// # Errors
    ///
    /// Returns a `QuestionError` variant for an empty prompt, a choice count
    /// outside `MIN_CHOICES..=MAX_CHOICES`, an empty choice, or a correct
    /// index outside the choice list.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct_choice: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if choices.len() < MIN_CHOICES {
            return Err(QuestionError::TooFewChoices {
                min: MIN_CHOICES,
                provided: choices.len(),
            });
        }
        if choices.len() > MAX_CHOICES {
            return Err(QuestionError::TooManyChoices {
                max: MAX_CHOICES,
                provided: choices.len(),
            });
        }
        for (index, choice) in choices.iter().enumerate() {
            if choice.trim().is_empty() {
                return Err(QuestionError::EmptyChoice { index });
            }
        }
        if correct_choice >= choices.len() {
            return Err(QuestionError::CorrectChoiceOutOfRange {
                provided: correct_choice,
                choices: choices.len(),
            });
        }

        let explanation = explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Self {
            id,
            prompt: prompt.trim().to_owned(),
            choices,
            correct_choice,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_choice(&self) -> usize {
        self.correct_choice
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

//
// ─── ANSWERS & GRADING ─────────────────────────────────────────────────────────
//

/// A learner's answer to one question.
///
/// Submissions arrive as this tagged sum type and are matched exhaustively;
/// there is no untyped answer payload anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Answer {
    /// The learner selected the choice at this index.
    Selected { choice: usize },
    /// The learner left the question blank.
    Blank,
}

/// Result of grading a full answer sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeReport {
    pub correct: usize,
    pub total: usize,
    /// `round(100 * correct / total)`, `0` when there are no questions.
    pub score_percentage: u8,
}

impl GradeReport {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn derive(correct: usize, total: usize) -> Self {
        let score_percentage = if total == 0 {
            0
        } else {
            (100.0 * correct as f64 / total as f64).round() as u8
        };
        Self {
            correct,
            total,
            score_percentage,
        }
    }

    /// True if this score meets the given percentage threshold.
    #[must_use]
    pub fn meets(&self, threshold: u8) -> bool {
        self.score_percentage >= threshold
    }
}

/// Grades an answer sheet against its question list, position by position.
///
/// Blank answers, missing trailing answers, and out-of-range selections all
/// count as incorrect — a malformed selection is a wrong answer, never an
/// error.
#[must_use]
pub fn grade(questions: &[Question], answers: &[Answer]) -> GradeReport {
    let mut correct = 0;
    for (i, question) in questions.iter().enumerate() {
        let answered_right = match answers.get(i) {
            Some(Answer::Selected { choice }) => *choice == question.correct_choice,
            Some(Answer::Blank) | None => false,
        };
        if answered_right {
            correct += 1;
        }
    }
    GradeReport::derive(correct, questions.len())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            None,
        )
        .unwrap()
    }

    #[test]
    fn question_rejects_empty_prompt() {
        let err = Question::new(
            QuestionId::new(1),
            " ",
            vec!["a".into(), "b".into()],
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn question_rejects_bad_choice_counts() {
        let err = Question::new(QuestionId::new(1), "?", vec!["a".into()], 0, None).unwrap_err();
        assert!(matches!(err, QuestionError::TooFewChoices { .. }));

        let seven = (0..7).map(|i| format!("c{i}")).collect();
        let err = Question::new(QuestionId::new(1), "?", seven, 0, None).unwrap_err();
        assert!(matches!(err, QuestionError::TooManyChoices { .. }));
    }

    #[test]
    fn question_rejects_empty_choice_and_bad_index() {
        let err = Question::new(
            QuestionId::new(1),
            "?",
            vec!["a".into(), " ".into()],
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyChoice { index: 1 });

        let err = Question::new(
            QuestionId::new(1),
            "?",
            vec!["a".into(), "b".into()],
            2,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::CorrectChoiceOutOfRange { .. }));
    }

    #[test]
    fn grade_counts_only_exact_selections() {
        let questions = [question(1, 0), question(2, 1), question(3, 2)];
        let answers = [
            Answer::Selected { choice: 0 },
            Answer::Blank,
            Answer::Selected { choice: 3 },
        ];

        let report = grade(&questions, &answers);
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 3);
        assert_eq!(report.score_percentage, 33);
    }

    #[test]
    fn grade_treats_missing_trailing_answers_as_incorrect() {
        let questions = [question(1, 0), question(2, 1)];
        let answers = [Answer::Selected { choice: 0 }];

        let report = grade(&questions, &answers);
        assert_eq!(report.correct, 1);
        assert_eq!(report.score_percentage, 50);
    }

    #[test]
    fn grade_out_of_range_selection_is_wrong_not_an_error() {
        let questions = [question(1, 0)];
        let answers = [Answer::Selected { choice: 99 }];
        let report = grade(&questions, &answers);
        assert_eq!(report.correct, 0);
    }

    #[test]
    fn empty_sheet_scores_zero_without_dividing() {
        let report = grade(&[], &[]);
        assert_eq!(report.score_percentage, 0);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn meets_compares_against_threshold() {
        let report = GradeReport::derive(7, 10);
        assert!(report.meets(70));
        assert!(!report.meets(71));
    }

    #[test]
    fn answer_serde_tags_are_stable() {
        let json = serde_json::to_string(&Answer::Selected { choice: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"selected","choice":2}"#);
        let back: Answer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Answer::Selected { choice: 2 });
    }
}
