use thiserror::Error;

use crate::model::{MappingError, QuestionError, QuestionLoadError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuestionLoad(#[from] QuestionLoadError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}
