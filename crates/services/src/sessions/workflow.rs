use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use quiz_core::model::{MissedSet, ResultSummary, SessionConfig};
use storage::MissedSetStore;

use super::plan::SessionBuilder;
use super::service::{AdvanceResult, AnswerOutcome, QuizSession};
use crate::Clock;
use crate::error::SessionError;
use crate::question_bank::QuestionBank;

/// Orchestrates session start and persisted answering.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    missed: MissedSetStore,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, bank: Arc<QuestionBank>, missed: MissedSetStore) -> Self {
        Self {
            clock,
            bank,
            missed,
            seed: None,
        }
    }

    /// Use a fixed seed for question and answer shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    fn session_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Draw questions and start a new session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no questions are available.
    pub async fn start_session(&self, config: &SessionConfig) -> Result<QuizSession, SessionError> {
        let missed = if config.only_missed() {
            self.missed.get_all().await
        } else {
            MissedSet::new()
        };

        let mut rng = self.session_rng();
        let plan = SessionBuilder::new(config).build(self.bank.questions(), &missed, &mut rng);
        if plan.fell_back_to_full_pool {
            info!("no missed questions in pool, using all questions");
        }

        let session = QuizSession::new(config.clone(), plan.questions, rng, self.clock.now())?;
        info!(
            questions = session.total_questions(),
            pool = plan.pool_size,
            mode = %config.mode(),
            "session started"
        );
        Ok(session)
    }

    /// Answer the current question by original choice index and persist the missed-set change.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for rejected selections or storage failures.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        original_index: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        let outcome = session.select_current(original_index)?;
        self.persist(&outcome).await?;
        Ok(outcome)
    }

    /// Answer the current question by displayed position and persist the missed-set change.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for rejected selections or storage failures.
    pub async fn answer_display(
        &self,
        session: &mut QuizSession,
        display_position: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        let outcome = session.select_display(display_position)?;
        self.persist(&outcome).await?;
        Ok(outcome)
    }

    async fn persist(&self, outcome: &AnswerOutcome) -> Result<(), SessionError> {
        self.missed.apply(&outcome.missed_change).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already ended.
    pub fn advance(&self, session: &mut QuizSession) -> Result<AdvanceResult, SessionError> {
        let result = session.advance(self.clock.now())?;
        if result == AdvanceResult::Finished {
            info!(
                answered = session.answered_count(),
                elapsed_secs = self.clock.elapsed_since(session.started_at()).num_seconds(),
                "session completed"
            );
        }
        Ok(result)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already ended.
    pub fn retreat(&self, session: &mut QuizSession) -> Result<bool, SessionError> {
        session.retreat()
    }

    /// End the session now and summarize it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already ended.
    pub fn end_early(&self, session: &mut QuizSession) -> Result<ResultSummary, SessionError> {
        session.terminate_early(self.clock.now())?;
        info!(
            answered = session.answered_count(),
            elapsed_secs = self.clock.elapsed_since(session.started_at()).num_seconds(),
            "session ended early"
        );
        Ok(session.summarize())
    }

    pub async fn missed_set(&self) -> MissedSet {
        self.missed.get_all().await
    }

    /// Clear the persisted missed set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the write fails.
    pub async fn reset_missed(&self) -> Result<(), SessionError> {
        self.missed.clear().await?;
        info!("missed set cleared");
        Ok(())
    }

    /// Config for a "retry missed" run: same options, restricted to missed questions.
    #[must_use]
    pub fn retry_missed_config(config: &SessionConfig) -> SessionConfig {
        config.clone().with_only_missed(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionId, QuizMode};
    use async_trait::async_trait;
    use quiz_core::time::fixed_clock;
    use storage::{InMemoryRepository, KeyValueStore, StorageError};

    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    fn bank() -> Arc<QuestionBank> {
        let questions = (1..=5)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    vec!["A".into(), "B".into(), "C".into()],
                    1,
                    None,
                    None,
                )
                .unwrap()
            })
            .collect();
        Arc::new(QuestionBank::from_questions(questions))
    }

    fn service() -> (QuizLoopService, MissedSetStore) {
        let store = MissedSetStore::new(Arc::new(InMemoryRepository::new()));
        let svc = QuizLoopService::new(fixed_clock(), bank(), store.clone()).with_seed(Some(4));
        (svc, store)
    }

    #[tokio::test]
    async fn answers_update_missed_set() {
        let (svc, store) = service();
        let mut session = svc
            .start_session(&SessionConfig::new(3, QuizMode::Instant))
            .await
            .unwrap();
        let id = session.current_question().id().clone();

        svc.answer_current(&mut session, 2).await.unwrap();
        assert!(store.get_all().await.contains(&id));

        svc.answer_current(&mut session, 1).await.unwrap();
        assert!(!store.get_all().await.contains(&id));
    }

    #[tokio::test]
    async fn only_missed_draws_from_missed_set() {
        let (svc, store) = service();
        store.add(&QuestionId::new("q3")).await.unwrap();

        let config = SessionConfig::new(5, QuizMode::Exam).with_only_missed(true);
        let session = svc.start_session(&config).await.unwrap();
        assert_eq!(session.total_questions(), 1);
        assert_eq!(session.current_question().id().as_str(), "q3");
    }

    #[tokio::test]
    async fn empty_bank_is_reported() {
        let store = MissedSetStore::new(Arc::new(InMemoryRepository::new()));
        let svc = QuizLoopService::new(fixed_clock(), Arc::new(QuestionBank::default()), store);
        let err = svc.start_session(&SessionConfig::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[tokio::test]
    async fn same_seed_draws_same_order() {
        let (svc, _store) = service();
        let config = SessionConfig::new(5, QuizMode::Instant);
        let a = svc.start_session(&config).await.unwrap();
        let b = svc.start_session(&config).await.unwrap();
        let ids = |s: &QuizSession| s.questions().iter().map(|q| q.id().clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }

    #[tokio::test]
    async fn end_early_and_reset() {
        let (svc, store) = service();
        let mut session = svc.start_session(&SessionConfig::new(2, QuizMode::Exam)).await.unwrap();
        svc.answer_current(&mut session, 0).await.unwrap();

        let summary = svc.end_early(&mut session).unwrap();
        assert_eq!(summary.answered_count(), 1);
        assert_eq!(summary.correct_count(), 0);
        assert!(summary.has_missed());
        assert!(matches!(svc.advance(&mut session), Err(SessionError::Completed)));

        svc.reset_missed().await.unwrap();
        assert!(store.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn storage_write_failure_surfaces_but_answer_is_recorded() {
        let store = MissedSetStore::new(Arc::new(ReadOnlyStore));
        let svc = QuizLoopService::new(fixed_clock(), bank(), store).with_seed(Some(4));
        let mut session = svc.start_session(&SessionConfig::default()).await.unwrap();

        let err = svc.answer_current(&mut session, 0).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn retry_config_sets_only_missed() {
        let config = SessionConfig::new(7, QuizMode::Exam);
        let retry = QuizLoopService::retry_missed_config(&config);
        assert!(retry.only_missed());
        assert_eq!(retry.count(), 7);
        assert_eq!(retry.mode(), QuizMode::Exam);
    }
}
