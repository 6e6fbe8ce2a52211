mod answer;
mod config;
mod ids;
mod mapping;
mod missed;
mod question;
mod summary;

pub use ids::QuestionId;

pub use answer::AnswerState;
pub use config::{MAX_COUNT, MIN_COUNT, QuizMode, QuizModeParseError, SessionConfig};
pub use mapping::{ChoiceMapping, ChoiceSlot, MappingError};
pub use missed::{MissedSet, MissedSetChange};
pub use question::{Question, QuestionError, QuestionLoadError, parse_question_set};
pub use summary::{DASH, ResultSummary, ReviewItem, ReviewStatus};
