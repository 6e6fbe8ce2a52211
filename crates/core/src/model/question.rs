use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least 2 choices, got {len}")]
    TooFewChoices { len: usize },

    #[error("answer index {index} is out of range for {len} choices")]
    AnswerIndexOutOfRange { index: i64, len: usize },
}

/// Fatal errors raised while loading a question set.
///
/// No partial pool is ever produced: the first offending record aborts the load.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionLoadError {
    #[error("question data is not valid JSON: {0}")]
    Json(String),

    #[error("question data must be a JSON array")]
    NotAnArray,

    #[error("invalid question at index {index}: {reason} (check question, choices, answerIndex)")]
    InvalidRecord { index: usize, reason: String },

    #[error("duplicate question id {id:?} at index {index}")]
    DuplicateId { index: usize, id: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    choices: Vec<String>,
    answer_index: usize,
    topic: Option<String>,
    explanation: Option<String>,
}

impl Question {
    /// Build a question, enforcing `0 <= answer_index < choices.len()` and at least two choices.
    ///
    /// Blank `topic` and `explanation` values are stored as `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id or text is empty, fewer than two
    /// choices are given, or the answer index does not point at a choice.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        choices: Vec<String>,
        answer_index: i64,
        topic: Option<String>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        if id.as_str().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if choices.len() < 2 {
            return Err(QuestionError::TooFewChoices { len: choices.len() });
        }
        let answer_index = usize::try_from(answer_index)
            .ok()
            .filter(|idx| *idx < choices.len())
            .ok_or(QuestionError::AnswerIndexOutOfRange {
                index: answer_index,
                len: choices.len(),
            })?;

        Ok(Self {
            id,
            text,
            choices,
            answer_index,
            topic: non_blank(topic),
            explanation: non_blank(explanation),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Returns the choice text at `original_index`, if any.
    #[must_use]
    pub fn choice(&self, original_index: usize) -> Option<&str> {
        self.choices.get(original_index).map(String::as_str)
    }

    #[must_use]
    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn correct_choice(&self) -> &str {
        &self.choices[self.answer_index]
    }

    #[must_use]
    pub fn is_correct(&self, original_index: usize) -> bool {
        original_index == self.answer_index
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//
// ─── LOADING ───────────────────────────────────────────────────────────────────
//

/// Wire shape of a single record in a question set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    #[serde(default)]
    id: Option<Value>,
    question: String,
    choices: Vec<String>,
    answer_index: i64,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

impl QuestionRecord {
    fn resolve_id(&self, index: usize) -> Result<QuestionId, String> {
        match &self.id {
            None | Some(Value::Null) => Ok(QuestionId::synthetic(index)),
            Some(Value::String(s)) if s.is_empty() => Ok(QuestionId::synthetic(index)),
            Some(Value::String(s)) => Ok(QuestionId::new(s.clone())),
            Some(Value::Number(n)) => Ok(QuestionId::new(n.to_string())),
            Some(other) => Err(format!("id must be a string, got {other}")),
        }
    }

    fn into_question(self, index: usize) -> Result<Question, QuestionLoadError> {
        let invalid = |reason: String| QuestionLoadError::InvalidRecord { index, reason };
        let id = self.resolve_id(index).map_err(invalid)?;
        Question::new(
            id,
            self.question,
            self.choices,
            self.answer_index,
            self.topic,
            self.explanation,
        )
        .map_err(|err| invalid(err.to_string()))
    }
}

/// Parse and validate a question set from its JSON text.
///
/// Records missing an `id` are assigned `q_<position>` (1-based).
///
/// # Errors
///
/// Returns `QuestionLoadError` if the payload is not a JSON array, if any record
/// is malformed (the error names its zero-based index), or if two records share an id.
pub fn parse_question_set(json: &str) -> Result<Vec<Question>, QuestionLoadError> {
    let payload: Value =
        serde_json::from_str(json).map_err(|err| QuestionLoadError::Json(err.to_string()))?;
    let Value::Array(records) = payload else {
        return Err(QuestionLoadError::NotAnArray);
    };

    let mut seen = HashSet::with_capacity(records.len());
    let mut questions = Vec::with_capacity(records.len());
    for (index, raw) in records.into_iter().enumerate() {
        let record: QuestionRecord =
            serde_json::from_value(raw).map_err(|err| QuestionLoadError::InvalidRecord {
                index,
                reason: err.to_string(),
            })?;
        let question = record.into_question(index)?;
        if !seen.insert(question.id().clone()) {
            return Err(QuestionLoadError::DuplicateId {
                index,
                id: question.id().to_string(),
            });
        }
        questions.push(question);
    }

    Ok(questions)
}
