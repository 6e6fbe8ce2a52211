//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::{MappingError, QuestionId, QuestionLoadError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the session engine and its orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),
    #[error("choice {index} is out of range for {len} choices")]
    ChoiceOutOfRange { index: usize, len: usize },
    #[error("answer for question {0} is locked")]
    AnswerLocked(QuestionId),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading the question bank. Always fatal at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("cannot read question file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] QuestionLoadError),
}

/// Errors emitted by `QuizController` when a command cannot be applied.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("`{command}` is not available on the {screen} screen")]
    InvalidCommand {
        command: &'static str,
        screen: &'static str,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    QuestionBank(#[from] QuestionBankError),
}
