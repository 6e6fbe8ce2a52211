use quiz_core::model::{QuestionId, QuizMode};

use super::service::QuizSession;
use crate::error::SessionError;

/// How a choice should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceMarker {
    None,
    /// The user's pick, correctness withheld (exam mode).
    Selected,
    /// The right answer, revealed (instant mode).
    Correct,
    /// The user's wrong pick, revealed (instant mode).
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub display_position: usize,
    pub original_index: usize,
    pub text: String,
    pub marker: ChoiceMarker,
}

/// Immediate feedback shown in instant mode once a question is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Presentation-agnostic model of the current question.
///
/// Choices are in display order. No strings are pre-formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 1-based position within the session.
    pub position: usize,
    pub total: usize,
    pub percent: u32,
    pub question_id: QuestionId,
    pub text: String,
    pub topic: Option<String>,
    pub mode: QuizMode,
    pub choices: Vec<ChoiceView>,
    pub answered: bool,
    pub locked: bool,
    pub feedback: Option<Feedback>,
    pub can_retreat: bool,
    pub is_last: bool,
}

impl QuestionView {
    /// Build the view for the current question, creating its choice mapping on first display.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from mapping creation.
    pub fn for_current(session: &mut QuizSession) -> Result<Self, SessionError> {
        session.ensure_current_mapping()?;

        let question = session.current_question();
        let state = session
            .answer(question.id())
            .ok_or_else(|| SessionError::UnknownQuestion(question.id().clone()))?;
        let mode = session.mode();
        let answered = state.is_answered();
        let reveal = answered && mode == QuizMode::Instant;
        let selected = state.selected_original_index();

        let choices = state
            .mapping()
            .iter()
            .map(|slot| {
                let is_selected = selected == Some(slot.original_index);
                let marker = if reveal && question.is_correct(slot.original_index) {
                    ChoiceMarker::Correct
                } else if reveal && is_selected {
                    ChoiceMarker::Wrong
                } else if is_selected {
                    ChoiceMarker::Selected
                } else {
                    ChoiceMarker::None
                };
                ChoiceView {
                    display_position: slot.display_position,
                    original_index: slot.original_index,
                    text: question
                        .choice(slot.original_index)
                        .unwrap_or_default()
                        .to_owned(),
                    marker,
                }
            })
            .collect();

        let feedback = reveal.then(|| Feedback {
            is_correct: state.is_correct() == Some(true),
            explanation: question.explanation().map(str::to_owned),
        });

        let progress = session.progress();
        Ok(Self {
            position: progress.position,
            total: progress.total,
            percent: progress.percent,
            question_id: question.id().clone(),
            text: question.text().to_owned(),
            topic: question.topic().map(str::to_owned),
            mode,
            choices,
            answered,
            locked: answered && session.config().lock_on_first_answer(),
            feedback,
            can_retreat: session.current_index() > 0,
            is_last: session.current_index() + 1 == session.total_questions(),
        })
    }
}
