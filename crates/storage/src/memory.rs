//! In-memory repository implementation for testing and prototyping.
//!
//! All aggregates live behind one mutex; every trait method locks, works on
//! plain maps, and releases. ID assignment is a monotone counter per store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use baeum_core::gamification::Streak;
use baeum_core::model::{
    AttemptId, Class, ClassId, Comment, CommentId, CompletionRecord, Lesson, LessonId,
    Notification, Post, PostId, Question, QuestionId, Tryout, TryoutAttempt, TryoutId, UserId,
    VocabEntry, VocabEntryId, VocabSet, VocabSetId,
};
use chrono::{DateTime, Utc};

use crate::repository::{
    ClassRepository, CompletionRepository, EnrollmentRepository, GamificationRepository,
    NewClassRecord, NewCommentRecord, NewLessonRecord, NewPostRecord, NewQuestionRecord,
    NewTryoutRecord, NewVocabEntryRecord, NewVocabSetRecord, NotificationRepository,
    PostRepository, StorageError, TryoutRepository, VocabRepository, XpEventRecord,
};

#[derive(Default)]
struct Inner {
    classes: HashMap<ClassId, Class>,
    lessons: HashMap<LessonId, Lesson>,
    enrollments: HashMap<(u64, u64), DateTime<Utc>>,
    completions: HashMap<(u64, u64), CompletionRecord>,
    vocab_sets: HashMap<VocabSetId, VocabSet>,
    vocab_entries: HashMap<VocabEntryId, VocabEntry>,
    questions: HashMap<QuestionId, Question>,
    tryouts: HashMap<TryoutId, Tryout>,
    attempts: HashMap<AttemptId, TryoutAttempt>,
    xp_events: Vec<XpEventRecord>,
    streaks: HashMap<UserId, Streak>,
    posts: HashMap<PostId, Post>,
    comments: HashMap<CommentId, Comment>,
    notifications: Vec<Notification>,
    next_entity_id: u64,
    next_row_id: i64,
}

impl Inner {
    fn next_entity_id(&mut self) -> u64 {
        self.next_entity_id += 1;
        self.next_entity_id
    }

    fn next_row_id(&mut self) -> i64 {
        self.next_row_id += 1;
        self.next_row_id
    }
}

/// Simple in-memory repository implementing every storage contract.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn invalid(e: impl std::fmt::Display) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ClassRepository for InMemoryRepository {
    async fn insert_class(&self, record: NewClassRecord) -> Result<ClassId, StorageError> {
        let mut inner = self.lock()?;
        let id = ClassId::new(inner.next_entity_id());
        let class = Class::new(
            id,
            record.name,
            record.description,
            record.level,
            record.passing_score,
            record.created_at,
        )
        .map_err(invalid)?;
        inner.classes.insert(id, class);
        Ok(id)
    }

    async fn upsert_class(&self, class: &Class) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.classes.insert(class.id(), class.clone());
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.classes.get(&id).cloned())
    }

    async fn list_classes(&self, limit: u32) -> Result<Vec<Class>, StorageError> {
        let inner = self.lock()?;
        let mut classes: Vec<_> = inner.classes.values().cloned().collect();
        classes.sort_by_key(Class::id);
        classes.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(classes)
    }

    async fn insert_lesson(&self, record: NewLessonRecord) -> Result<LessonId, StorageError> {
        let mut inner = self.lock()?;
        let duplicate_rank = inner
            .lessons
            .values()
            .any(|l| l.class_id() == record.class_id && l.order() == record.order);
        if duplicate_rank {
            return Err(StorageError::Conflict);
        }

        let id = LessonId::new(inner.next_entity_id());
        let lesson = Lesson::new(
            id,
            record.class_id,
            record.title,
            record.order,
            record.requires_passing_score,
            record.video_url,
            record.body,
            record.created_at,
        )
        .map_err(invalid)?;
        inner.lessons.insert(id, lesson);
        Ok(id)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.lessons.get(&id).cloned())
    }

    async fn lessons_for_class(&self, class_id: ClassId) -> Result<Vec<Lesson>, StorageError> {
        let inner = self.lock()?;
        let mut lessons: Vec<_> = inner
            .lessons
            .values()
            .filter(|l| l.class_id() == class_id)
            .cloned()
            .collect();
        lessons.sort_by_key(Lesson::order);
        Ok(lessons)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn enroll(
        &self,
        user_id: UserId,
        class_id: ClassId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner
            .enrollments
            .entry((user_id.value(), class_id.value()))
            .or_insert(enrolled_at);
        Ok(())
    }

    async fn is_enrolled(&self, user_id: UserId, class_id: ClassId) -> Result<bool, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .enrollments
            .contains_key(&(user_id.value(), class_id.value())))
    }

    async fn enrolled_classes(&self, user_id: UserId) -> Result<Vec<ClassId>, StorageError> {
        let inner = self.lock()?;
        let mut ids: Vec<_> = inner
            .enrollments
            .keys()
            .filter(|(user, _)| *user == user_id.value())
            .map(|(_, class)| ClassId::new(*class))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn get_record(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<CompletionRecord>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .completions
            .get(&(user_id.value(), lesson_id.value()))
            .cloned())
    }

    async fn records_for_user_in_class(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let inner = self.lock()?;
        let records = inner
            .completions
            .values()
            .filter(|record| {
                record.user_id() == user_id
                    && inner
                        .lessons
                        .get(&record.lesson_id())
                        .is_some_and(|lesson| lesson.class_id() == class_id)
            })
            .cloned()
            .collect();
        Ok(records)
    }

    async fn upsert_record(&self, record: &CompletionRecord) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.completions.insert(
            (record.user_id().value(), record.lesson_id().value()),
            record.clone(),
        );
        Ok(())
    }
}

#[async_trait]
impl VocabRepository for InMemoryRepository {
    async fn insert_set(&self, record: NewVocabSetRecord) -> Result<VocabSetId, StorageError> {
        let mut inner = self.lock()?;
        let id = VocabSetId::new(inner.next_entity_id());
        let set =
            VocabSet::new(id, record.class_id, record.name, record.created_at).map_err(invalid)?;
        inner.vocab_sets.insert(id, set);
        Ok(id)
    }

    async fn get_set(&self, id: VocabSetId) -> Result<Option<VocabSet>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.vocab_sets.get(&id).cloned())
    }

    async fn list_sets(&self, limit: u32) -> Result<Vec<VocabSet>, StorageError> {
        let inner = self.lock()?;
        let mut sets: Vec<_> = inner.vocab_sets.values().cloned().collect();
        sets.sort_by_key(VocabSet::id);
        sets.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(sets)
    }

    async fn insert_entry(
        &self,
        record: NewVocabEntryRecord,
    ) -> Result<VocabEntryId, StorageError> {
        let mut inner = self.lock()?;
        if !inner.vocab_sets.contains_key(&record.set_id) {
            return Err(StorageError::NotFound);
        }

        let id = VocabEntryId::new(inner.next_entity_id());
        let entry = VocabEntry::new(
            id,
            record.set_id,
            record.hangul,
            record.romanization,
            record.meaning,
            record.example,
            record.created_at,
        )
        .map_err(invalid)?;
        inner.vocab_entries.insert(id, entry);
        Ok(id)
    }

    async fn entries_for_set(&self, set_id: VocabSetId) -> Result<Vec<VocabEntry>, StorageError> {
        let inner = self.lock()?;
        let mut entries: Vec<_> = inner
            .vocab_entries
            .values()
            .filter(|e| e.set_id() == set_id)
            .cloned()
            .collect();
        entries.sort_by_key(VocabEntry::id);
        Ok(entries)
    }
}

#[async_trait]
impl TryoutRepository for InMemoryRepository {
    async fn insert_question(
        &self,
        record: NewQuestionRecord,
    ) -> Result<QuestionId, StorageError> {
        let mut inner = self.lock()?;
        let id = QuestionId::new(inner.next_entity_id());
        let question = Question::new(
            id,
            record.prompt,
            record.choices,
            record.correct_choice,
            record.explanation,
        )
        .map_err(invalid)?;
        inner.questions.insert(id, question);
        Ok(id)
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let inner = self.lock()?;
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match inner.questions.get(id) {
                Some(question) => found.push(question.clone()),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(found)
    }

    async fn insert_tryout(&self, record: NewTryoutRecord) -> Result<TryoutId, StorageError> {
        let mut inner = self.lock()?;
        if record
            .question_ids
            .iter()
            .any(|id| !inner.questions.contains_key(id))
        {
            return Err(StorageError::NotFound);
        }

        let id = TryoutId::new(inner.next_entity_id());
        let tryout = Tryout::new(
            id,
            record.title,
            record.question_ids,
            record.duration_minutes,
            record.passing_score,
            record.created_at,
        )
        .map_err(invalid)?;
        inner.tryouts.insert(id, tryout);
        Ok(id)
    }

    async fn get_tryout(&self, id: TryoutId) -> Result<Option<Tryout>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.tryouts.get(&id).cloned())
    }

    async fn insert_attempt(&self, attempt: &TryoutAttempt) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if inner.attempts.contains_key(&attempt.id()) {
            return Err(StorageError::Conflict);
        }
        inner.attempts.insert(attempt.id(), attempt.clone());
        Ok(())
    }

    async fn update_attempt(&self, attempt: &TryoutAttempt) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if !inner.attempts.contains_key(&attempt.id()) {
            return Err(StorageError::NotFound);
        }
        inner.attempts.insert(attempt.id(), attempt.clone());
        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<TryoutAttempt>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.attempts.get(&id).cloned())
    }

    async fn attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TryoutAttempt>, StorageError> {
        let inner = self.lock()?;
        let mut attempts: Vec<_> = inner
            .attempts
            .values()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.started_at().cmp(&a.started_at()));
        attempts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(attempts)
    }
}

#[async_trait]
impl GamificationRepository for InMemoryRepository {
    async fn append_xp_event(&self, mut event: XpEventRecord) -> Result<i64, StorageError> {
        let mut inner = self.lock()?;
        let id = inner.next_row_id();
        event.id = Some(id);
        inner.xp_events.push(event);
        Ok(id)
    }

    async fn total_xp(&self, user_id: UserId) -> Result<u64, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .xp_events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.amount)
            .sum())
    }

    async fn get_streak(&self, user_id: UserId) -> Result<Option<Streak>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.streaks.get(&user_id).copied())
    }

    async fn upsert_streak(&self, user_id: UserId, streak: &Streak) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.streaks.insert(user_id, *streak);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn insert_post(&self, record: NewPostRecord) -> Result<PostId, StorageError> {
        let mut inner = self.lock()?;
        let id = PostId::new(inner.next_entity_id());
        let post = Post::new(
            id,
            record.author,
            record.body,
            record.attachment_url,
            record.created_at,
        )
        .map_err(invalid)?;
        inner.posts.insert(id, post);
        Ok(id)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.posts.get(&id).cloned())
    }

    async fn list_posts(&self, limit: u32) -> Result<Vec<Post>, StorageError> {
        let inner = self.lock()?;
        let mut posts: Vec<_> = inner.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id())));
        posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(posts)
    }

    async fn insert_comment(&self, record: NewCommentRecord) -> Result<CommentId, StorageError> {
        let mut inner = self.lock()?;
        if !inner.posts.contains_key(&record.post_id) {
            return Err(StorageError::NotFound);
        }

        let id = CommentId::new(inner.next_entity_id());
        let comment = Comment::new(
            id,
            record.post_id,
            record.author,
            record.body,
            record.created_at,
        )
        .map_err(invalid)?;
        inner.comments.insert(id, comment);
        Ok(id)
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StorageError> {
        let inner = self.lock()?;
        let mut comments: Vec<_> = inner
            .comments
            .values()
            .filter(|c| c.post_id() == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(Comment::id);
        Ok(comments)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn append(&self, notification: &Notification) -> Result<i64, StorageError> {
        let mut inner = self.lock()?;
        let id = inner.next_row_id();
        let mut stored = notification.clone();
        stored.id = Some(id);
        inner.notifications.push(stored);
        Ok(id)
    }

    async fn unread_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: i64) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        match inner
            .notifications
            .iter_mut()
            .find(|n| n.id == Some(id))
        {
            Some(notification) => {
                notification.read = true;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use baeum_core::model::{ClassLevel, DEFAULT_PASSING_SCORE};
    use baeum_core::time::fixed_now;

    fn class_record(name: &str) -> NewClassRecord {
        NewClassRecord {
            name: name.to_owned(),
            description: None,
            level: ClassLevel::Beginner,
            passing_score: DEFAULT_PASSING_SCORE,
            created_at: fixed_now(),
        }
    }

    fn lesson_record(class_id: ClassId, order: u32) -> NewLessonRecord {
        NewLessonRecord {
            class_id,
            title: format!("Lesson {order}"),
            order,
            requires_passing_score: order % 2 == 1,
            video_url: None,
            body: String::new(),
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn lessons_come_back_sorted_by_order() {
        let repo = InMemoryRepository::new();
        let class_id = repo.insert_class(class_record("Hangul")).await.unwrap();

        for order in [2, 0, 1] {
            repo.insert_lesson(lesson_record(class_id, order)).await.unwrap();
        }

        let lessons = repo.lessons_for_class(class_id).await.unwrap();
        let orders: Vec<_> = lessons.iter().map(Lesson::order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn duplicate_lesson_rank_conflicts() {
        let repo = InMemoryRepository::new();
        let class_id = repo.insert_class(class_record("Hangul")).await.unwrap();

        repo.insert_lesson(lesson_record(class_id, 0)).await.unwrap();
        let err = repo
            .insert_lesson(lesson_record(class_id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn completion_upsert_replaces_by_composite_key() {
        let repo = InMemoryRepository::new();
        let class_id = repo.insert_class(class_record("Hangul")).await.unwrap();
        let lesson_id = repo
            .insert_lesson(lesson_record(class_id, 0))
            .await
            .unwrap();

        let user = UserId::new(9);
        let mut record = CompletionRecord::on_first_view(user, lesson_id, fixed_now());
        repo.upsert_record(&record).await.unwrap();

        record.record_assessment(true, fixed_now());
        repo.upsert_record(&record).await.unwrap();

        let fetched = repo.get_record(user, lesson_id).await.unwrap().unwrap();
        assert!(fetched.assessment_passed());
        let all = repo
            .records_for_user_in_class(user, class_id)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn enroll_is_idempotent() {
        let repo = InMemoryRepository::new();
        let class_id = repo.insert_class(class_record("Hangul")).await.unwrap();
        let user = UserId::new(1);

        repo.enroll(user, class_id, fixed_now()).await.unwrap();
        repo.enroll(user, class_id, fixed_now()).await.unwrap();

        assert!(repo.is_enrolled(user, class_id).await.unwrap());
        assert_eq!(repo.enrolled_classes(user).await.unwrap(), vec![class_id]);
    }

    #[tokio::test]
    async fn xp_ledger_sums_per_user() {
        use baeum_core::gamification::XpReason;

        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let other = UserId::new(2);

        repo.append_xp_event(XpEventRecord::new(user, XpReason::LessonCompleted, fixed_now()))
            .await
            .unwrap();
        repo.append_xp_event(XpEventRecord::new(user, XpReason::PostCreated, fixed_now()))
            .await
            .unwrap();
        repo.append_xp_event(XpEventRecord::new(other, XpReason::TryoutPassed, fixed_now()))
            .await
            .unwrap();

        assert_eq!(repo.total_xp(user).await.unwrap(), 55);
        assert_eq!(repo.total_xp(other).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn notifications_track_unread_state() {
        use baeum_core::model::{Notification, NotificationKind};

        let repo = InMemoryRepository::new();
        let user = UserId::new(3);
        let id = repo
            .append(&Notification::new(
                user,
                NotificationKind::LevelUp,
                "Level 2 reached",
                fixed_now(),
            ))
            .await
            .unwrap();

        assert_eq!(repo.unread_for_user(user).await.unwrap().len(), 1);
        repo.mark_read(id).await.unwrap();
        assert!(repo.unread_for_user(user).await.unwrap().is_empty());
        assert!(matches!(
            repo.mark_read(999).await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
