use baeum_core::gamification::Streak;
use baeum_core::model::{
    Answer, AttemptId, AttemptState, Class, ClassId, ClassLevel, Comment, CommentId,
    CompletionRecord, GradeReport, Lesson, LessonId, Notification, NotificationKind, Post, PostId,
    Question, QuestionId, TryoutAttempt, TryoutId, UserId, VocabEntry, VocabEntryId, VocabSet,
    VocabSetId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn class_id_from_i64(v: i64) -> Result<ClassId, StorageError> {
    Ok(ClassId::new(i64_to_u64("class_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn set_id_from_i64(v: i64) -> Result<VocabSetId, StorageError> {
    Ok(VocabSetId::new(i64_to_u64("set_id", v)?))
}

pub(crate) fn map_class_row(row: &SqliteRow) -> Result<Class, StorageError> {
    let level_str: String = row.try_get("level").map_err(ser)?;
    let level = ClassLevel::parse(&level_str)
        .ok_or_else(|| StorageError::Serialization(format!("invalid level: {level_str}")))?;

    let passing_score_i64: i64 = row.try_get("passing_score").map_err(ser)?;
    let passing_score = u8::try_from(passing_score_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid passing_score: {passing_score_i64}"))
    })?;

    Class::new(
        class_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("description")
            .map_err(ser)?,
        level,
        passing_score,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let ord_i64: i64 = row.try_get("ord").map_err(ser)?;
    let order = u32::try_from(ord_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid ord: {ord_i64}")))?;

    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        class_id_from_i64(row.try_get::<i64, _>("class_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        order,
        row.try_get::<i64, _>("requires_passing_score").map_err(ser)? != 0,
        row.try_get::<Option<String>, _>("video_url").map_err(ser)?,
        row.try_get::<String, _>("body").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_completion_row(row: &SqliteRow) -> Result<CompletionRecord, StorageError> {
    Ok(CompletionRecord::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        row.try_get::<i64, _>("content_viewed").map_err(ser)? != 0,
        row.try_get::<i64, _>("assessment_passed").map_err(ser)? != 0,
        row.try_get("first_viewed_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_vocab_set_row(row: &SqliteRow) -> Result<VocabSet, StorageError> {
    let class_id = row
        .try_get::<Option<i64>, _>("class_id")
        .map_err(ser)?
        .map(class_id_from_i64)
        .transpose()?;

    VocabSet::new(
        set_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        class_id,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_vocab_entry_row(row: &SqliteRow) -> Result<VocabEntry, StorageError> {
    VocabEntry::new(
        VocabEntryId::new(i64_to_u64(
            "entry_id",
            row.try_get::<i64, _>("id").map_err(ser)?,
        )?),
        set_id_from_i64(row.try_get::<i64, _>("set_id").map_err(ser)?)?,
        row.try_get::<String, _>("hangul").map_err(ser)?,
        row.try_get::<String, _>("romanization").map_err(ser)?,
        row.try_get::<String, _>("meaning").map_err(ser)?,
        row.try_get::<Option<String>, _>("example").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let choices_json: String = row.try_get("choices").map_err(ser)?;
    let choices: Vec<String> = serde_json::from_str(&choices_json).map_err(ser)?;

    let correct_i64: i64 = row.try_get("correct_choice").map_err(ser)?;
    let correct_choice = usize::try_from(correct_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid correct_choice: {correct_i64}"))
    })?;

    Question::new(
        question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("prompt").map_err(ser)?,
        choices,
        correct_choice,
        row.try_get::<Option<String>, _>("explanation")
            .map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<TryoutAttempt, StorageError> {
    let id_str: String = row.try_get("id").map_err(ser)?;
    let id: AttemptId = id_str
        .parse()
        .map_err(|_| StorageError::Serialization(format!("invalid attempt id: {id_str}")))?;

    let state_str: String = row.try_get("state").map_err(ser)?;
    let state = AttemptState::parse(&state_str)
        .ok_or_else(|| StorageError::Serialization(format!("invalid state: {state_str}")))?;

    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<Answer> = serde_json::from_str(&answers_json).map_err(ser)?;

    let score_correct: Option<i64> = row.try_get("score_correct").map_err(ser)?;
    let score_total: Option<i64> = row.try_get("score_total").map_err(ser)?;
    let score = match (score_correct, score_total) {
        (Some(correct), Some(total)) => {
            let correct = usize::try_from(correct).map_err(ser)?;
            let total = usize::try_from(total).map_err(ser)?;
            Some(GradeReport::derive(correct, total))
        }
        (None, None) => None,
        _ => {
            return Err(StorageError::Serialization(
                "attempt score columns must be both set or both null".into(),
            ));
        }
    };

    Ok(TryoutAttempt::from_persisted(
        id,
        TryoutId::new(i64_to_u64(
            "tryout_id",
            row.try_get::<i64, _>("tryout_id").map_err(ser)?,
        )?),
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        state,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("deadline").map_err(ser)?,
        row.try_get("submitted_at").map_err(ser)?,
        answers,
        score,
        row.try_get::<i64, _>("late").map_err(ser)? != 0,
    ))
}

pub(crate) fn map_streak_row(row: &SqliteRow) -> Result<Streak, StorageError> {
    let current_i64: i64 = row.try_get("current").map_err(ser)?;
    let longest_i64: i64 = row.try_get("longest").map_err(ser)?;
    let current = u32::try_from(current_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid current: {current_i64}")))?;
    let longest = u32::try_from(longest_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid longest: {longest_i64}")))?;

    Ok(Streak::from_persisted(
        current,
        longest,
        row.try_get("last_activity_date").map_err(ser)?,
    ))
}

pub(crate) fn map_post_row(row: &SqliteRow) -> Result<Post, StorageError> {
    Post::new(
        PostId::new(i64_to_u64(
            "post_id",
            row.try_get::<i64, _>("id").map_err(ser)?,
        )?),
        user_id_from_i64(row.try_get::<i64, _>("author").map_err(ser)?)?,
        row.try_get::<String, _>("body").map_err(ser)?,
        row.try_get::<Option<String>, _>("attachment_url")
            .map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_comment_row(row: &SqliteRow) -> Result<Comment, StorageError> {
    Comment::new(
        CommentId::new(i64_to_u64(
            "comment_id",
            row.try_get::<i64, _>("id").map_err(ser)?,
        )?),
        PostId::new(i64_to_u64(
            "post_id",
            row.try_get::<i64, _>("post_id").map_err(ser)?,
        )?),
        user_id_from_i64(row.try_get::<i64, _>("author").map_err(ser)?)?,
        row.try_get::<String, _>("body").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_notification_row(row: &SqliteRow) -> Result<Notification, StorageError> {
    let kind_str: String = row.try_get("kind").map_err(ser)?;
    let kind = NotificationKind::parse(&kind_str)
        .ok_or_else(|| StorageError::Serialization(format!("invalid kind: {kind_str}")))?;

    Ok(Notification {
        id: Some(row.try_get("id").map_err(ser)?),
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        kind,
        message: row.try_get("message").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        read: row.try_get::<i64, _>("read").map_err(ser)? != 0,
    })
}
