use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use baeum_core::Clock;
use baeum_core::gamification::XpReason;
use baeum_core::model::{
    ClassId, UserId, VocabEntry, VocabEntryId, VocabSet, VocabSetId,
};
use storage::repository::{NewVocabEntryRecord, NewVocabSetRecord, VocabRepository};

use crate::error::VocabServiceError;
use crate::gamification_service::{AwardOutcome, GamificationService};

/// Distractor meanings shown next to the correct one in a drill question.
const DRILL_DISTRACTORS: usize = 3;

//
// ─── DRILLS ────────────────────────────────────────────────────────────────────
//

/// One multiple-choice drill item: pick the meaning of a hangul prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrillQuestion {
    pub entry_id: VocabEntryId,
    pub hangul: String,
    pub romanization: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Manages vocabulary sets and turns them into shuffled recognition drills.
#[derive(Clone)]
pub struct VocabService {
    clock: Clock,
    vocab: Arc<dyn VocabRepository>,
    gamification: GamificationService,
}

impl VocabService {
    #[must_use]
    pub fn new(
        clock: Clock,
        vocab: Arc<dyn VocabRepository>,
        gamification: GamificationService,
    ) -> Self {
        Self {
            clock,
            vocab,
            gamification,
        }
    }

    /// Create a vocabulary set, optionally attached to a class.
    ///
    /// # Errors
    ///
    /// Returns `VocabServiceError::Vocab` for validation failures.
    pub async fn create_set(
        &self,
        name: String,
        class_id: Option<ClassId>,
    ) -> Result<VocabSetId, VocabServiceError> {
        let now = self.clock.now();
        let set = VocabSet::new(VocabSetId::new(1), class_id, name, now)?;
        let set_id = self
            .vocab
            .insert_set(NewVocabSetRecord::from_set(&set))
            .await?;
        Ok(set_id)
    }

    /// Add one entry to a set.
    ///
    /// # Errors
    ///
    /// Returns `VocabServiceError::Vocab` for validation failures and
    /// `VocabServiceError::UnknownSet` for a dangling set ID.
    pub async fn add_entry(
        &self,
        set_id: VocabSetId,
        hangul: String,
        romanization: String,
        meaning: String,
        example: Option<String>,
    ) -> Result<VocabEntryId, VocabServiceError> {
        let now = self.clock.now();
        let entry = VocabEntry::new(
            VocabEntryId::new(1),
            set_id,
            hangul,
            romanization,
            meaning,
            example,
            now,
        )?;
        let entry_id = self
            .vocab
            .insert_entry(NewVocabEntryRecord::from_entry(&entry))
            .await
            .map_err(|e| match e {
                storage::repository::StorageError::NotFound => VocabServiceError::UnknownSet,
                other => other.into(),
            })?;
        Ok(entry_id)
    }

    /// List sets ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `VocabServiceError::Storage` if repository access fails.
    pub async fn list_sets(&self, limit: u32) -> Result<Vec<VocabSet>, VocabServiceError> {
        let sets = self.vocab.list_sets(limit).await?;
        Ok(sets)
    }

    /// Entries of a set ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `VocabServiceError::Storage` if repository access fails.
    pub async fn entries(&self, set_id: VocabSetId) -> Result<Vec<VocabEntry>, VocabServiceError> {
        let entries = self.vocab.entries_for_set(set_id).await?;
        Ok(entries)
    }

    /// Build a shuffled recognition drill from a set.
    ///
    /// Each drilled entry becomes one question: its meaning plus up to
    /// [`DRILL_DISTRACTORS`] other meanings from the same set, shuffled.
    /// The caller owns the RNG so tests can drill deterministically.
    ///
    /// # Errors
    ///
    /// Returns `VocabServiceError::UnknownSet` for a dangling set ID and
    /// `VocabServiceError::NotEnoughEntries` when the set cannot fill a
    /// two-choice question.
    pub async fn build_drill(
        &self,
        set_id: VocabSetId,
        size: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<DrillQuestion>, VocabServiceError> {
        if self.vocab.get_set(set_id).await?.is_none() {
            return Err(VocabServiceError::UnknownSet);
        }

        let entries = self.vocab.entries_for_set(set_id).await?;
        if entries.len() < 2 {
            return Err(VocabServiceError::NotEnoughEntries {
                needed: 2,
                available: entries.len(),
            });
        }

        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.shuffle(rng);
        order.truncate(size);

        let mut drill = Vec::with_capacity(order.len());
        for &index in &order {
            let entry = &entries[index];

            let mut distractor_pool: Vec<&str> = entries
                .iter()
                .enumerate()
                .filter(|(i, other)| *i != index && other.meaning() != entry.meaning())
                .map(|(_, other)| other.meaning())
                .collect();
            distractor_pool.shuffle(rng);
            distractor_pool.truncate(DRILL_DISTRACTORS);

            let mut choices: Vec<String> = distractor_pool
                .into_iter()
                .map(str::to_owned)
                .collect();
            choices.push(entry.meaning().to_owned());
            choices.shuffle(rng);

            let correct_choice = choices
                .iter()
                .position(|c| c == entry.meaning())
                .unwrap_or(0);

            drill.push(DrillQuestion {
                entry_id: entry.id(),
                hangul: entry.hangul().to_owned(),
                romanization: entry.romanization().to_owned(),
                choices,
                correct_choice,
            });
        }

        Ok(drill)
    }

    /// Record that the user finished a drill, awarding drill XP.
    ///
    /// # Errors
    ///
    /// Returns `VocabServiceError::Gamification` if the award fails.
    pub async fn finish_drill(&self, user_id: UserId) -> Result<AwardOutcome, VocabServiceError> {
        let outcome = self
            .gamification
            .award(user_id, XpReason::DrillFinished)
            .await?;
        Ok(outcome)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use baeum_core::time::fixed_clock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::InMemoryRepository;

    async fn build_service() -> VocabService {
        let repo = Arc::new(InMemoryRepository::new());
        let gamification = GamificationService::new(fixed_clock(), repo.clone(), repo.clone());
        VocabService::new(fixed_clock(), repo, gamification)
    }

    async fn seed_set(service: &VocabService, entries: usize) -> VocabSetId {
        let set_id = service
            .create_set("Survival Korean".into(), None)
            .await
            .unwrap();
        for i in 0..entries {
            service
                .add_entry(
                    set_id,
                    format!("단어{i}"),
                    format!("daneo{i}"),
                    format!("word {i}"),
                    None,
                )
                .await
                .unwrap();
        }
        set_id
    }

    #[tokio::test]
    async fn add_entry_rejects_unknown_set() {
        let service = build_service().await;
        let err = service
            .add_entry(
                VocabSetId::new(404),
                "안녕".into(),
                "annyeong".into(),
                "hello".into(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VocabServiceError::UnknownSet));
    }

    #[tokio::test]
    async fn drill_questions_embed_the_correct_meaning() {
        let service = build_service().await;
        let set_id = seed_set(&service, 6).await;

        let mut rng = StdRng::seed_from_u64(7);
        let drill = service.build_drill(set_id, 4, &mut rng).await.unwrap();

        assert_eq!(drill.len(), 4);
        let entries = service.entries(set_id).await.unwrap();
        for question in &drill {
            let entry = entries
                .iter()
                .find(|e| e.id() == question.entry_id)
                .unwrap();
            assert_eq!(question.choices[question.correct_choice], entry.meaning());
            assert!(question.choices.len() >= 2);
            assert!(question.choices.len() <= 1 + DRILL_DISTRACTORS);
        }
    }

    #[tokio::test]
    async fn drill_size_is_capped_by_set_size() {
        let service = build_service().await;
        let set_id = seed_set(&service, 3).await;

        let mut rng = StdRng::seed_from_u64(1);
        let drill = service.build_drill(set_id, 10, &mut rng).await.unwrap();
        assert_eq!(drill.len(), 3);
    }

    #[tokio::test]
    async fn drill_needs_at_least_two_entries() {
        let service = build_service().await;
        let set_id = seed_set(&service, 1).await;

        let mut rng = StdRng::seed_from_u64(1);
        let err = service
            .build_drill(set_id, 5, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VocabServiceError::NotEnoughEntries {
                needed: 2,
                available: 1
            }
        ));
    }

    #[tokio::test]
    async fn finish_drill_awards_xp() {
        let service = build_service().await;
        let outcome = service.finish_drill(UserId::new(3)).await.unwrap();
        assert_eq!(outcome.reason, XpReason::DrillFinished);
        assert_eq!(outcome.total_xp, 10);
    }
}
