//! XP, level, and streak rules.
//!
//! These are small rule engines over counters and calendar days: XP awards
//! are fixed per activity kind, levels follow a quadratic cumulative curve,
//! and streaks count consecutive UTC days with at least one activity. All of
//! it is pure; services own the clock and the persistence.

use chrono::NaiveDate;

//
// ─── XP AWARDS ─────────────────────────────────────────────────────────────────
//

/// Why XP was awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XpReason {
    LessonCompleted,
    AssessmentPassed,
    TryoutSubmitted,
    TryoutPassed,
    DrillFinished,
    PostCreated,
}

impl XpReason {
    /// Fixed XP amount for this activity.
    #[must_use]
    pub fn amount(self) -> u64 {
        match self {
            XpReason::LessonCompleted => 50,
            XpReason::AssessmentPassed => 30,
            XpReason::TryoutSubmitted => 20,
            XpReason::TryoutPassed => 80,
            XpReason::DrillFinished => 10,
            XpReason::PostCreated => 5,
        }
    }

    /// Stable storage tag for this reason.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            XpReason::LessonCompleted => "lesson_completed",
            XpReason::AssessmentPassed => "assessment_passed",
            XpReason::TryoutSubmitted => "tryout_submitted",
            XpReason::TryoutPassed => "tryout_passed",
            XpReason::DrillFinished => "drill_finished",
            XpReason::PostCreated => "post_created",
        }
    }

    /// Parse a storage tag back into a reason.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lesson_completed" => Some(XpReason::LessonCompleted),
            "assessment_passed" => Some(XpReason::AssessmentPassed),
            "tryout_submitted" => Some(XpReason::TryoutSubmitted),
            "tryout_passed" => Some(XpReason::TryoutPassed),
            "drill_finished" => Some(XpReason::DrillFinished),
            "post_created" => Some(XpReason::PostCreated),
            _ => None,
        }
    }
}

//
// ─── LEVELS ────────────────────────────────────────────────────────────────────
//

/// Level for a cumulative XP total.
///
/// Levels are 1-based. Reaching level `n + 1` requires `100 * n * (n + 1) / 2`
/// cumulative XP, so each level costs 100 XP more than the one before it:
/// level 2 at 100 XP, level 3 at 300 XP, level 4 at 600 XP, and so on.
#[must_use]
pub fn level_for_xp(total_xp: u64) -> u32 {
    let mut level = 1_u64;
    while 100 * level * (level + 1) / 2 <= total_xp {
        level += 1;
    }
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// XP still missing to reach the next level.
#[must_use]
pub fn xp_for_next_level(total_xp: u64) -> u64 {
    let level = u64::from(level_for_xp(total_xp));
    let next_threshold = 100 * level * (level + 1) / 2;
    next_threshold - total_xp
}

//
// ─── STREAKS ───────────────────────────────────────────────────────────────────
//

/// How a recorded activity changed a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Another activity on the same day.
    Unchanged,
    /// Activity on the day after the previous one.
    Extended,
    /// First activity ever, or activity after a gap.
    Reset,
}

/// Consecutive-day activity streak.
///
/// Days are whole UTC dates; the caller derives `today` from its clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    current: u32,
    longest: u32,
    last_activity_date: Option<NaiveDate>,
}

impl Streak {
    /// A streak with no recorded activity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: 0,
            longest: 0,
            last_activity_date: None,
        }
    }

    /// Rehydrates a streak from persisted storage.
    #[must_use]
    pub fn from_persisted(current: u32, longest: u32, last_activity_date: Option<NaiveDate>) -> Self {
        Self {
            current,
            longest,
            last_activity_date,
        }
    }

    /// Records an activity on `today` and reports how the streak moved.
    ///
    /// Same day: unchanged. Day after the last activity: extended. Anything
    /// else (first activity, a gap, or a backwards clock): reset to 1.
    pub fn record_activity(&mut self, today: NaiveDate) -> StreakUpdate {
        let update = match self.last_activity_date {
            Some(last) if last == today => StreakUpdate::Unchanged,
            Some(last) if last.succ_opt() == Some(today) => StreakUpdate::Extended,
            _ => StreakUpdate::Reset,
        };

        match update {
            StreakUpdate::Unchanged => {}
            StreakUpdate::Extended => self.current += 1,
            StreakUpdate::Reset => self.current = 1,
        }
        self.longest = self.longest.max(self.current);
        self.last_activity_date = Some(today);
        update
    }

    #[must_use]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub fn longest(&self) -> u32 {
        self.longest
    }

    #[must_use]
    pub fn last_activity_date(&self) -> Option<NaiveDate> {
        self.last_activity_date
    }
}

impl Default for Streak {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(n)
    }

    #[test]
    fn xp_reason_tags_roundtrip() {
        for reason in [
            XpReason::LessonCompleted,
            XpReason::AssessmentPassed,
            XpReason::TryoutSubmitted,
            XpReason::TryoutPassed,
            XpReason::DrillFinished,
            XpReason::PostCreated,
        ] {
            assert_eq!(XpReason::parse(reason.as_str()), Some(reason));
            assert!(reason.amount() > 0);
        }
        assert_eq!(XpReason::parse("login"), None);
    }

    #[test]
    fn level_curve_thresholds() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(299), 2);
        assert_eq!(level_for_xp(300), 3);
        assert_eq!(level_for_xp(600), 4);
        assert_eq!(level_for_xp(1000), 5);
    }

    #[test]
    fn level_is_monotone_in_xp() {
        let mut previous = 0;
        for total in (0..3000).step_by(37) {
            let level = level_for_xp(total);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn xp_for_next_level_counts_down() {
        assert_eq!(xp_for_next_level(0), 100);
        assert_eq!(xp_for_next_level(40), 60);
        assert_eq!(xp_for_next_level(100), 200);
        assert_eq!(xp_for_next_level(250), 50);
    }

    #[test]
    fn first_activity_resets_to_one() {
        let mut streak = Streak::new();
        assert_eq!(streak.record_activity(day(0)), StreakUpdate::Reset);
        assert_eq!(streak.current(), 1);
        assert_eq!(streak.longest(), 1);
    }

    #[test]
    fn same_day_activity_leaves_streak_unchanged() {
        let mut streak = Streak::new();
        streak.record_activity(day(0));
        assert_eq!(streak.record_activity(day(0)), StreakUpdate::Unchanged);
        assert_eq!(streak.current(), 1);
    }

    #[test]
    fn consecutive_days_extend_and_gaps_reset() {
        let mut streak = Streak::new();
        streak.record_activity(day(0));
        assert_eq!(streak.record_activity(day(1)), StreakUpdate::Extended);
        assert_eq!(streak.record_activity(day(2)), StreakUpdate::Extended);
        assert_eq!(streak.current(), 3);

        assert_eq!(streak.record_activity(day(5)), StreakUpdate::Reset);
        assert_eq!(streak.current(), 1);
        assert_eq!(streak.longest(), 3);
    }

    #[test]
    fn longest_tracks_maximum_across_resets() {
        let mut streak = Streak::new();
        for n in 0..4 {
            streak.record_activity(day(n));
        }
        streak.record_activity(day(10));
        streak.record_activity(day(11));
        assert_eq!(streak.current(), 2);
        assert_eq!(streak.longest(), 4);
    }
}
