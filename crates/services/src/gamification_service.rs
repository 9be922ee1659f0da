use std::sync::Arc;

use serde::Serialize;

use baeum_core::Clock;
use baeum_core::gamification::{Streak, StreakUpdate, XpReason, level_for_xp, xp_for_next_level};
use baeum_core::model::{Notification, NotificationKind, UserId};
use storage::repository::{GamificationRepository, NotificationRepository, XpEventRecord};

use crate::error::GamificationError;

/// Streaks that are a multiple of this many days trigger a milestone
/// notification.
const STREAK_MILESTONE_DAYS: u32 = 7;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What one XP award did to the user's totals and streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardOutcome {
    pub reason: XpReason,
    pub amount: u64,
    pub total_xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub streak: Streak,
    pub streak_update: StreakUpdate,
}

/// Aggregated gamification state for a profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamificationProfile {
    pub total_xp: u64,
    pub level: u32,
    pub xp_to_next_level: u64,
    pub streak_current: u32,
    pub streak_longest: u32,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Records XP awards, maintains streaks, and emits the related notifications.
#[derive(Clone)]
pub struct GamificationService {
    clock: Clock,
    gamification: Arc<dyn GamificationRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl GamificationService {
    #[must_use]
    pub fn new(
        clock: Clock,
        gamification: Arc<dyn GamificationRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            clock,
            gamification,
            notifications,
        }
    }

    /// Append one XP ledger event and fold it into level and streak state.
    ///
    /// Level-ups and 7-day streak milestones produce in-app notifications.
    ///
    /// # Errors
    ///
    /// Returns `GamificationError::Storage` if persistence fails.
    pub async fn award(
        &self,
        user_id: UserId,
        reason: XpReason,
    ) -> Result<AwardOutcome, GamificationError> {
        let now = self.clock.now();

        let total_before = self.gamification.total_xp(user_id).await?;
        let level_before = level_for_xp(total_before);

        self.gamification
            .append_xp_event(XpEventRecord::new(user_id, reason, now))
            .await?;

        let total_xp = total_before + reason.amount();
        let level = level_for_xp(total_xp);
        let leveled_up = level > level_before;

        let mut streak = self
            .gamification
            .get_streak(user_id)
            .await?
            .unwrap_or_default();
        let streak_update = streak.record_activity(self.clock.today());
        self.gamification.upsert_streak(user_id, &streak).await?;

        if leveled_up {
            self.notifications
                .append(&Notification::new(
                    user_id,
                    NotificationKind::LevelUp,
                    format!("Level {level} reached"),
                    now,
                ))
                .await?;
        }

        if streak_update == StreakUpdate::Extended
            && streak.current() % STREAK_MILESTONE_DAYS == 0
        {
            self.notifications
                .append(&Notification::new(
                    user_id,
                    NotificationKind::StreakMilestone,
                    format!("{} day streak", streak.current()),
                    now,
                ))
                .await?;
        }

        Ok(AwardOutcome {
            reason,
            amount: reason.amount(),
            total_xp,
            level,
            leveled_up,
            streak,
            streak_update,
        })
    }

    /// Current totals for a profile page.
    ///
    /// # Errors
    ///
    /// Returns `GamificationError::Storage` if repository access fails.
    pub async fn profile(&self, user_id: UserId) -> Result<GamificationProfile, GamificationError> {
        let total_xp = self.gamification.total_xp(user_id).await?;
        let streak = self
            .gamification
            .get_streak(user_id)
            .await?
            .unwrap_or_default();

        Ok(GamificationProfile {
            total_xp,
            level: level_for_xp(total_xp),
            xp_to_next_level: xp_for_next_level(total_xp),
            streak_current: streak.current(),
            streak_longest: streak.longest(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use baeum_core::time::{fixed_clock, fixed_now};
    use chrono::Duration;
    use storage::InMemoryRepository;

    fn build_service(clock: Clock) -> GamificationService {
        let repo = Arc::new(InMemoryRepository::new());
        GamificationService::new(clock, repo.clone(), repo)
    }

    #[tokio::test]
    async fn award_accumulates_xp_and_reports_level() {
        let service = build_service(fixed_clock());
        let user = UserId::new(1);

        let first = service.award(user, XpReason::LessonCompleted).await.unwrap();
        assert_eq!(first.total_xp, 50);
        assert_eq!(first.level, 1);
        assert!(!first.leveled_up);
        assert_eq!(first.streak.current(), 1);
        assert_eq!(first.streak_update, StreakUpdate::Reset);

        let second = service.award(user, XpReason::TryoutPassed).await.unwrap();
        assert_eq!(second.total_xp, 130);
        assert_eq!(second.level, 2);
        assert!(second.leveled_up);
        // second award on the same day leaves the streak alone
        assert_eq!(second.streak_update, StreakUpdate::Unchanged);
    }

    #[tokio::test]
    async fn level_up_emits_notification() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = GamificationService::new(fixed_clock(), repo.clone(), repo.clone());
        let user = UserId::new(1);

        service.award(user, XpReason::TryoutPassed).await.unwrap();
        let unread = repo.unread_for_user(user).await.unwrap();
        assert!(unread.is_empty());

        // 80 + 30 = 110 crosses the level-2 threshold at 100
        service
            .award(user, XpReason::AssessmentPassed)
            .await
            .unwrap();
        let unread = repo.unread_for_user(user).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::LevelUp);
    }

    #[tokio::test]
    async fn week_long_streak_emits_milestone() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::new(2);

        for day in 0..7 {
            let clock = Clock::fixed(fixed_now() + Duration::days(day));
            let service = GamificationService::new(clock, repo.clone(), repo.clone());
            service.award(user, XpReason::DrillFinished).await.unwrap();
        }

        let unread = repo.unread_for_user(user).await.unwrap();
        assert!(
            unread
                .iter()
                .any(|n| n.kind == NotificationKind::StreakMilestone)
        );
    }

    #[tokio::test]
    async fn profile_reports_missing_user_as_fresh() {
        let service = build_service(fixed_clock());
        let profile = service.profile(UserId::new(42)).await.unwrap();

        assert_eq!(profile.total_xp, 0);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.xp_to_next_level, 100);
        assert_eq!(profile.streak_current, 0);
    }
}
