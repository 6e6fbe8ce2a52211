use std::path::Path;
use std::sync::Arc;

use quiz_core::model::SessionConfig;
use storage::{MissedSetStore, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::question_bank::QuestionBank;
use crate::sessions::{QuizController, QuizLoopService};

/// Assembles the question bank, missed-set storage and session loop.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    missed: MissedSetStore,
    quiz_loop: QuizLoopService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and a question file.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or question loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        questions_path: impl AsRef<Path>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let bank = QuestionBank::load_from_path(questions_path).await?;
        Ok(Self::from_parts(storage, bank, clock))
    }

    /// Build services with in-memory storage.
    #[must_use]
    pub fn in_memory(bank: QuestionBank, clock: Clock) -> Self {
        Self::from_parts(Storage::in_memory(), bank, clock)
    }

    fn from_parts(storage: Storage, bank: QuestionBank, clock: Clock) -> Self {
        let bank = Arc::new(bank);
        let missed = MissedSetStore::new(Arc::clone(&storage.kv));
        let quiz_loop = QuizLoopService::new(clock, Arc::clone(&bank), missed.clone());
        Self {
            bank,
            missed,
            quiz_loop,
        }
    }

    /// Fix the shuffling seed for every session started from these services.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.quiz_loop = self.quiz_loop.with_seed(seed);
        self
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn missed(&self) -> &MissedSetStore {
        &self.missed
    }

    #[must_use]
    pub fn quiz_loop(&self) -> &QuizLoopService {
        &self.quiz_loop
    }

    /// A fresh controller on the home screen.
    #[must_use]
    pub fn controller(&self, config: SessionConfig) -> QuizController {
        QuizController::new(self.quiz_loop.clone(), config)
    }
}
