use std::sync::Arc;

use baeum_core::Clock;
use baeum_core::model::{Class, ClassId, ClassLevel, Lesson, LessonId, UserId};
use storage::repository::{
    ClassRepository, EnrollmentRepository, NewClassRecord, NewLessonRecord, StorageError,
};

use crate::error::ClassServiceError;

/// Orchestrates class authoring, lesson sequencing, and enrollment.
#[derive(Clone)]
pub struct ClassService {
    clock: Clock,
    classes: Arc<dyn ClassRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl ClassService {
    #[must_use]
    pub fn new(
        clock: Clock,
        classes: Arc<dyn ClassRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            classes,
            enrollments,
        }
    }

    /// Create a new class and persist it.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Class` for validation failures.
    /// Returns `ClassServiceError::Storage` if persistence fails.
    pub async fn create_class(
        &self,
        name: String,
        description: Option<String>,
        level: ClassLevel,
        passing_score: u8,
    ) -> Result<ClassId, ClassServiceError> {
        let now = self.clock.now();
        let class = Class::new(ClassId::new(1), name, description, level, passing_score, now)?;
        let class_id = self
            .classes
            .insert_class(NewClassRecord::from_class(&class))
            .await?;
        Ok(class_id)
    }

    /// Fetch a class by ID. Returns `Ok(None)` when the class does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Storage` if repository access fails.
    pub async fn get_class(&self, class_id: ClassId) -> Result<Option<Class>, ClassServiceError> {
        let class = self.classes.get_class(class_id).await?;
        Ok(class)
    }

    /// List classes ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Storage` if repository access fails.
    pub async fn list_classes(&self, limit: u32) -> Result<Vec<Class>, ClassServiceError> {
        let classes = self.classes.list_classes(limit).await?;
        Ok(classes)
    }

    /// Append a lesson to a class's sequence.
    ///
    /// With `order: None` the lesson lands after the current last rank;
    /// with an explicit rank the storage layer's unique constraint rejects
    /// duplicates as `StorageError::Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Lesson` for validation failures,
    /// `ClassServiceError::Storage(StorageError::NotFound)` if the class is
    /// missing, and the storage `Conflict` for a taken rank.
    pub async fn add_lesson(
        &self,
        class_id: ClassId,
        title: String,
        requires_passing_score: bool,
        video_url: Option<String>,
        body: String,
        order: Option<u32>,
    ) -> Result<LessonId, ClassServiceError> {
        if self.classes.get_class(class_id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }

        let order = match order {
            Some(order) => order,
            None => {
                let lessons = self.classes.lessons_for_class(class_id).await?;
                lessons.last().map_or(0, |lesson| lesson.order() + 1)
            }
        };

        let now = self.clock.now();
        let lesson = Lesson::new(
            LessonId::new(1),
            class_id,
            title,
            order,
            requires_passing_score,
            video_url,
            body,
            now,
        )?;
        let lesson_id = self
            .classes
            .insert_lesson(NewLessonRecord::from_lesson(&lesson))
            .await?;
        Ok(lesson_id)
    }

    /// Update class name, description, level, and passing score.
    ///
    /// The creation timestamp is preserved.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Class` if validation fails.
    /// Returns `ClassServiceError::Storage` if repository access fails.
    pub async fn update_class(
        &self,
        class_id: ClassId,
        name: String,
        description: Option<String>,
        level: ClassLevel,
        passing_score: u8,
    ) -> Result<(), ClassServiceError> {
        let class = self
            .classes
            .get_class(class_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let updated = Class::new(
            class.id(),
            name,
            description,
            level,
            passing_score,
            class.created_at(),
        )?;
        self.classes.upsert_class(&updated).await?;
        Ok(())
    }

    /// The class's lessons in sequence order.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Storage` if repository access fails.
    pub async fn lessons(&self, class_id: ClassId) -> Result<Vec<Lesson>, ClassServiceError> {
        let lessons = self.classes.lessons_for_class(class_id).await?;
        Ok(lessons)
    }

    /// Enroll a user into an existing class. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::Storage(StorageError::NotFound)` if the
    /// class does not exist.
    pub async fn enroll(&self, user_id: UserId, class_id: ClassId) -> Result<(), ClassServiceError> {
        if self.classes.get_class(class_id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }
        self.enrollments
            .enroll(user_id, class_id, self.clock.now())
            .await?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use baeum_core::model::DEFAULT_PASSING_SCORE;
    use baeum_core::time::fixed_clock;
    use storage::InMemoryRepository;

    fn build_service() -> (Arc<InMemoryRepository>, ClassService) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ClassService::new(fixed_clock(), repo.clone(), repo.clone());
        (repo, service)
    }

    #[tokio::test]
    async fn create_and_fetch_class() {
        let (_, service) = build_service();
        let class_id = service
            .create_class(
                "TOPIK I".into(),
                Some("reading + listening".into()),
                ClassLevel::Beginner,
                DEFAULT_PASSING_SCORE,
            )
            .await
            .unwrap();

        let class = service.get_class(class_id).await.unwrap().unwrap();
        assert_eq!(class.name(), "TOPIK I");
        assert_eq!(class.passing_score(), DEFAULT_PASSING_SCORE);
    }

    #[tokio::test]
    async fn update_class_preserves_created_at() {
        let (_, service) = build_service();
        let class_id = service
            .create_class("Hangul".into(), None, ClassLevel::Beginner, 70)
            .await
            .unwrap();
        let before = service.get_class(class_id).await.unwrap().unwrap();

        service
            .update_class(
                class_id,
                "Hangul Basics".into(),
                Some("now with batchim".into()),
                ClassLevel::Intermediate,
                80,
            )
            .await
            .unwrap();

        let after = service.get_class(class_id).await.unwrap().unwrap();
        assert_eq!(after.name(), "Hangul Basics");
        assert_eq!(after.level(), ClassLevel::Intermediate);
        assert_eq!(after.passing_score(), 80);
        assert_eq!(after.created_at(), before.created_at());
    }

    #[tokio::test]
    async fn add_lesson_assigns_next_rank() {
        let (_, service) = build_service();
        let class_id = service
            .create_class("Hangul".into(), None, ClassLevel::Beginner, 70)
            .await
            .unwrap();

        service
            .add_lesson(class_id, "Consonants".into(), false, None, String::new(), None)
            .await
            .unwrap();
        service
            .add_lesson(class_id, "Vowels".into(), true, None, String::new(), None)
            .await
            .unwrap();

        let lessons = service.lessons(class_id).await.unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].order(), 0);
        assert_eq!(lessons[1].order(), 1);
        assert!(lessons[1].requires_passing_score());
    }

    #[tokio::test]
    async fn explicit_duplicate_rank_is_a_conflict() {
        let (_, service) = build_service();
        let class_id = service
            .create_class("Hangul".into(), None, ClassLevel::Beginner, 70)
            .await
            .unwrap();

        service
            .add_lesson(class_id, "One".into(), false, None, String::new(), Some(3))
            .await
            .unwrap();
        let err = service
            .add_lesson(class_id, "Two".into(), false, None, String::new(), Some(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClassServiceError::Storage(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn enroll_requires_existing_class() {
        let (_, service) = build_service();
        let err = service
            .enroll(UserId::new(1), ClassId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClassServiceError::Storage(StorageError::NotFound)
        ));
    }
}
