use std::path::Path;

use quiz_core::model::{Question, parse_question_set};
use tracing::info;

use crate::error::QuestionBankError;

/// The full, validated question pool loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    #[must_use]
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parse a bank from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Parse` if any record is invalid.
    pub fn from_json(json: &str) -> Result<Self, QuestionBankError> {
        Ok(Self::from_questions(parse_question_set(json)?))
    }

    /// Read and parse a question file. Not retried.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Io` if the file cannot be read and
    /// `QuestionBankError::Parse` if its content is invalid.
    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| QuestionBankError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let bank = Self::from_json(&raw)?;
        info!(path = %path.display(), questions = bank.len(), "question bank loaded");
        Ok(bank)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
