use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use quiz_core::model::{
    AnswerState, ChoiceMapping, MappingError, MissedSetChange, Question, QuestionId, QuizMode,
    ResultSummary, SessionConfig,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Lifecycle of a session once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    /// Terminal: only a fresh build starts a new session.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceResult {
    Continue,
    Finished,
}

/// Captures the outcome of selecting a choice.
///
/// `missed_change` is the persistence side effect for the caller to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub selected_original_index: usize,
    pub is_correct: bool,
    pub missed_change: MissedSetChange,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session.
///
/// Owns the drawn questions, the cursor, and per-question answer state. Performs
/// no I/O: persistence of the missed set is driven by the returned `AnswerOutcome`.
pub struct QuizSession {
    config: SessionConfig,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<QuestionId, AnswerState>,
    state: SessionState,
    rng: StdRng,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session over already-drawn questions.
    ///
    /// `rng` drives answer shuffling for the lifetime of the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        config: SessionConfig,
        questions: Vec<Question>,
        rng: StdRng,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            config,
            questions,
            current: 0,
            answers: HashMap::new(),
            state: SessionState::InProgress,
            rng,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.config.mode()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Completed
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question under the cursor. Sessions are never empty.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&AnswerState> {
        self.answers.get(id)
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, AnswerState> {
        &self.answers
    }

    /// Number of questions with a selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_answered()).count()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::new(
            self.current + 1,
            self.total_questions(),
            self.answered_count(),
            self.is_complete(),
        )
    }

    /// Return the stored choice mapping for a question, creating it on first display.
    ///
    /// Never regenerates an existing mapping.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` if the question is not in this session.
    pub fn ensure_mapping(&mut self, id: &QuestionId) -> Result<&ChoiceMapping, SessionError> {
        Ok(self.ensure_state(id)?.mapping())
    }

    /// `ensure_mapping` for the current question.
    ///
    /// # Errors
    ///
    /// Propagates mapping generation failures.
    pub fn ensure_current_mapping(&mut self) -> Result<&ChoiceMapping, SessionError> {
        let id = self.current_question().id().clone();
        self.ensure_mapping(&id)
    }

    fn ensure_state(&mut self, id: &QuestionId) -> Result<&mut AnswerState, SessionError> {
        if !self.answers.contains_key(id) {
            let question = self
                .questions
                .iter()
                .find(|q| q.id() == id)
                .ok_or_else(|| SessionError::UnknownQuestion(id.clone()))?;
            let mapping = choice_mapping(
                question.choice_count(),
                self.config.shuffle_answers(),
                &mut self.rng,
            )?;
            self.answers.insert(id.clone(), AnswerState::new(mapping));
        }
        self.answers
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownQuestion(id.clone()))
    }

    /// Record a selection for `id`, by original choice index.
    ///
    /// Selections can be changed until the session ends unless the config locks
    /// the first answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after the session ended,
    /// `SessionError::UnknownQuestion` for a foreign id,
    /// `SessionError::ChoiceOutOfRange` for an invalid index, and
    /// `SessionError::AnswerLocked` when re-answering a locked question.
    /// State is left untouched on error.
    pub fn select_answer(
        &mut self,
        id: &QuestionId,
        original_index: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        self.ensure_in_progress()?;

        let question = self
            .questions
            .iter()
            .find(|q| q.id() == id)
            .ok_or_else(|| SessionError::UnknownQuestion(id.clone()))?;
        let len = question.choice_count();
        if original_index >= len {
            return Err(SessionError::ChoiceOutOfRange {
                index: original_index,
                len,
            });
        }
        let is_correct = question.is_correct(original_index);

        let lock = self.config.lock_on_first_answer();
        let state = self.ensure_state(id)?;
        if lock && state.is_answered() {
            return Err(SessionError::AnswerLocked(id.clone()));
        }
        state.record(original_index, is_correct);

        debug!(question = %id, original_index, is_correct, "answer recorded");

        let missed_change = if is_correct {
            MissedSetChange::Remove(id.clone())
        } else {
            MissedSetChange::Add(id.clone())
        };
        Ok(AnswerOutcome {
            question_id: id.clone(),
            selected_original_index: original_index,
            is_correct,
            missed_change,
        })
    }

    /// `select_answer` for the current question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::select_answer`].
    pub fn select_current(&mut self, original_index: usize) -> Result<AnswerOutcome, SessionError> {
        let id = self.current_question().id().clone();
        self.select_answer(&id, original_index)
    }

    /// Select the choice shown at `display_position` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChoiceOutOfRange` if no choice is displayed there,
    /// otherwise see [`QuizSession::select_answer`].
    pub fn select_display(
        &mut self,
        display_position: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        self.ensure_in_progress()?;
        let mapping = self.ensure_current_mapping()?;
        let original = mapping
            .original_index(display_position)
            .ok_or(SessionError::ChoiceOutOfRange {
                index: display_position,
                len: mapping.len(),
            })?;
        self.select_current(original)
    }

    /// Move to the next question, or complete the session at the last one.
    ///
    /// Answering is not required to move on.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already ended.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<AdvanceResult, SessionError> {
        self.ensure_in_progress()?;
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            debug!(index = self.current, "advanced");
            Ok(AdvanceResult::Continue)
        } else {
            self.complete(now);
            Ok(AdvanceResult::Finished)
        }
    }

    /// Move back one question. Returns false at the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already ended.
    pub fn retreat(&mut self) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        if self.current == 0 {
            return Ok(false);
        }
        self.current -= 1;
        debug!(index = self.current, "retreated");
        Ok(true)
    }

    /// Freeze the session where it stands, answered or not.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already ended.
    pub fn terminate_early(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        debug!(index = self.current, "terminated early");
        self.complete(now);
        Ok(())
    }

    /// Score and review for the session as it currently stands.
    #[must_use]
    pub fn summarize(&self) -> ResultSummary {
        ResultSummary::summarize(&self.questions, &self.answers)
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Completed;
        self.completed_at = Some(now);
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::InProgress => Ok(()),
            SessionState::Completed => Err(SessionError::Completed),
        }
    }
}

/// Identity order, or a uniformly shuffled one when `shuffle` is set.
fn choice_mapping<R: Rng + ?Sized>(
    len: usize,
    shuffle: bool,
    rng: &mut R,
) -> Result<ChoiceMapping, MappingError> {
    if !shuffle {
        return Ok(ChoiceMapping::identity(len));
    }
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    ChoiceMapping::from_order(order)
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.config.mode())
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("state", &self.state)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
