use baeum_core::gamification::{Streak, XpReason};
use baeum_core::model::{
    Answer, Class, ClassId, ClassLevel, GradeReport, Lesson, LessonId, Question, QuestionId,
    Tryout, TryoutAttempt, TryoutId, UserId, CompletionRecord, DEFAULT_PASSING_SCORE,
};
use baeum_core::time::fixed_now;
use chrono::{Duration, NaiveDate};
use storage::repository::{
    ClassRepository, CompletionRepository, GamificationRepository, NewClassRecord,
    NewLessonRecord, NewQuestionRecord, NewTryoutRecord, StorageError, TryoutRepository,
    XpEventRecord,
};
use storage::sqlite::SqliteRepository;

fn class_record(name: &str) -> NewClassRecord {
    let class = Class::new(
        ClassId::new(1),
        name,
        None,
        ClassLevel::Beginner,
        DEFAULT_PASSING_SCORE,
        fixed_now(),
    )
    .unwrap();
    NewClassRecord::from_class(&class)
}

fn lesson_record(class_id: ClassId, order: u32, gated: bool) -> NewLessonRecord {
    let lesson = Lesson::new(
        LessonId::new(1),
        class_id,
        format!("Lesson {order}"),
        order,
        gated,
        None,
        "",
        fixed_now(),
    )
    .unwrap();
    NewLessonRecord::from_lesson(&lesson)
}

fn question_record(prompt: &str) -> NewQuestionRecord {
    let question = Question::new(
        QuestionId::new(1),
        prompt,
        vec!["a".into(), "b".into(), "c".into()],
        0,
        Some("first choice".into()),
    )
    .unwrap();
    NewQuestionRecord::from_question(&question)
}

#[tokio::test]
async fn sqlite_keeps_lessons_ordered_and_rejects_duplicate_ranks() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_lessons?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let class_id = repo.insert_class(class_record("Hangul")).await.unwrap();

    for order in [2, 0, 1] {
        repo.insert_lesson(lesson_record(class_id, order, order == 1))
            .await
            .unwrap();
    }

    let lessons = repo.lessons_for_class(class_id).await.unwrap();
    let orders: Vec<_> = lessons.iter().map(Lesson::order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert!(lessons[1].requires_passing_score());

    let err = repo
        .insert_lesson(lesson_record(class_id, 1, false))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_completion_upsert_is_keyed_by_user_and_lesson() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_completion?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let class_id = repo.insert_class(class_record("Hangul")).await.unwrap();
    let lesson_id = repo
        .insert_lesson(lesson_record(class_id, 0, true))
        .await
        .unwrap();

    let user = UserId::new(7);
    let mut record = CompletionRecord::on_first_view(user, lesson_id, fixed_now());
    repo.upsert_record(&record).await.unwrap();

    let fetched = repo.get_record(user, lesson_id).await.unwrap().unwrap();
    assert!(fetched.content_viewed());
    assert!(!fetched.assessment_passed());

    record.record_assessment(true, fixed_now() + Duration::hours(1));
    repo.upsert_record(&record).await.unwrap();

    let records = repo
        .records_for_user_in_class(user, class_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].assessment_passed());
    assert_eq!(records[0].first_viewed_at(), fixed_now());
}

#[tokio::test]
async fn sqlite_attempt_roundtrip_preserves_answers_and_score() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_attempts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let q1 = repo
        .insert_question(question_record("What does 네 mean?"))
        .await
        .unwrap();
    let q2 = repo
        .insert_question(question_record("What does 아니요 mean?"))
        .await
        .unwrap();

    let tryout = Tryout::new(
        TryoutId::new(1),
        "Placement mock",
        vec![q1, q2],
        30,
        Some(60),
        fixed_now(),
    )
    .unwrap();
    let tryout_id = repo
        .insert_tryout(NewTryoutRecord::from_tryout(&tryout))
        .await
        .unwrap();

    let stored = repo.get_tryout(tryout_id).await.unwrap().unwrap();
    assert_eq!(stored.question_ids(), &[q1, q2]);

    let mut attempt = TryoutAttempt::start(&stored, UserId::new(3), fixed_now());
    repo.insert_attempt(&attempt).await.unwrap();

    attempt
        .submit(
            vec![Answer::Selected { choice: 0 }, Answer::Blank],
            GradeReport::derive(1, 2),
            fixed_now() + Duration::minutes(10),
        )
        .unwrap();
    repo.update_attempt(&attempt).await.unwrap();

    let fetched = repo.get_attempt(attempt.id()).await.unwrap().unwrap();
    assert_eq!(fetched.answers(), attempt.answers());
    assert_eq!(fetched.score(), Some(GradeReport::derive(1, 2)));
    assert!(!fetched.is_late());

    let history = repo.attempts_for_user(UserId::new(3), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id(), attempt.id());
}

#[tokio::test]
async fn sqlite_xp_ledger_and_streak_roundtrip() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_xp?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(11);
    repo.append_xp_event(XpEventRecord::new(
        user,
        XpReason::LessonCompleted,
        fixed_now(),
    ))
    .await
    .unwrap();
    repo.append_xp_event(XpEventRecord::new(
        user,
        XpReason::TryoutPassed,
        fixed_now(),
    ))
    .await
    .unwrap();

    assert_eq!(repo.total_xp(user).await.unwrap(), 130);
    assert_eq!(repo.total_xp(UserId::new(99)).await.unwrap(), 0);

    assert!(repo.get_streak(user).await.unwrap().is_none());

    let mut streak = Streak::new();
    streak.record_activity(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    streak.record_activity(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap());
    repo.upsert_streak(user, &streak).await.unwrap();

    let fetched = repo.get_streak(user).await.unwrap().unwrap();
    assert_eq!(fetched.current(), 2);
    assert_eq!(fetched.longest(), 2);
    assert_eq!(
        fetched.last_activity_date(),
        NaiveDate::from_ymd_opt(2024, 3, 21)
    );
}
