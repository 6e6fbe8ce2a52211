use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{MissedSet, Question, SessionConfig};

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    /// Size of the eligible pool the questions were drawn from.
    pub pool_size: usize,
    /// True when `only_missed` matched nothing and the full pool was used.
    pub fell_back_to_full_pool: bool,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Draws the questions for a new session from the full pool.
pub struct SessionBuilder<'a> {
    config: &'a SessionConfig,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config }
    }

    /// Build a session plan.
    ///
    /// - With `only_missed`, the pool is narrowed to ids in `missed`; if that
    ///   leaves nothing, the full pool is used instead.
    /// - The pool is shuffled uniformly, then the first `count` questions are taken.
    pub fn build<R: Rng + ?Sized>(
        self,
        all_questions: &[Question],
        missed: &MissedSet,
        rng: &mut R,
    ) -> SessionPlan {
        let mut fell_back_to_full_pool = false;
        let mut pool: Vec<Question> = if self.config.only_missed() {
            let filtered: Vec<Question> = all_questions
                .iter()
                .filter(|q| missed.contains(q.id()))
                .cloned()
                .collect();
            if filtered.is_empty() {
                fell_back_to_full_pool = true;
                all_questions.to_vec()
            } else {
                filtered
            }
        } else {
            all_questions.to_vec()
        };

        let pool_size = pool.len();
        pool.shuffle(rng);
        let take = usize::try_from(self.config.count()).unwrap_or(usize::MAX);
        pool.truncate(take.min(pool_size));

        SessionPlan {
            questions: pool,
            pool_size,
            fell_back_to_full_pool,
        }
    }
}
