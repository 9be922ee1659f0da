use baeum_core::Clock;
use storage::repository::Storage;

use crate::class_service::ClassService;
use crate::error::AppServicesError;
use crate::gamification_service::GamificationService;
use crate::post_service::PostService;
use crate::progress_service::ProgressService;
use crate::tryout_service::TryoutService;
use crate::vocab_service::VocabService;

/// Every service wired over one `Storage`, sharing one clock.
#[derive(Clone)]
pub struct AppServices {
    pub classes: ClassService,
    pub progress: ProgressService,
    pub tryouts: TryoutService,
    pub vocab: VocabService,
    pub gamification: GamificationService,
    pub posts: PostService,
}

impl AppServices {
    /// Wire all services over the given storage backend.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        let gamification = GamificationService::new(
            clock,
            storage.gamification.clone(),
            storage.notifications.clone(),
        );

        Self {
            classes: ClassService::new(clock, storage.classes.clone(), storage.enrollments.clone()),
            progress: ProgressService::new(
                clock,
                storage.classes.clone(),
                storage.enrollments.clone(),
                storage.completions.clone(),
                storage.notifications.clone(),
                gamification.clone(),
            ),
            tryouts: TryoutService::new(
                clock,
                storage.tryouts.clone(),
                storage.notifications.clone(),
                gamification.clone(),
            ),
            vocab: VocabService::new(clock, storage.vocab.clone(), gamification.clone()),
            posts: PostService::new(clock, storage.posts.clone(), gamification.clone()),
            gamification,
        }
    }

    /// In-memory bootstrap for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), clock)
    }

    /// SQLite bootstrap: connect, migrate, wire.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if the database cannot be opened or
    /// migrated.
    pub async fn sqlite(database_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(database_url).await?;
        Ok(Self::new(&storage, clock))
    }
}
