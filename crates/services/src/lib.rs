#![forbid(unsafe_code)]

pub mod app_services;
pub mod class_service;
pub mod error;
pub mod gamification_service;
pub mod post_service;
pub mod progress_service;
pub mod tryout_service;
pub mod vocab_service;

pub use baeum_core::Clock;

pub use error::{
    AppServicesError, ClassServiceError, GamificationError, PostServiceError, ProgressError,
    TryoutServiceError, VocabServiceError,
};

pub use app_services::AppServices;
pub use class_service::ClassService;
pub use gamification_service::{AwardOutcome, GamificationProfile, GamificationService};
pub use post_service::PostService;
pub use progress_service::{
    AssessmentOutcome, ClassProgress, LessonProgressView, LessonViewOutcome, ProgressService,
};
pub use tryout_service::{SubmittedAttempt, TryoutService};
pub use vocab_service::{DrillQuestion, VocabService};
