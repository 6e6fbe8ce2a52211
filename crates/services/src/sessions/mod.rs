mod controller;
mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{ControllerError, SessionError};
pub use controller::{HomeNotice, QuizCommand, QuizController, QuizScreen};
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use service::{AdvanceResult, AnswerOutcome, QuizSession, SessionState};
pub use view::{ChoiceMarker, ChoiceView, Feedback, QuestionView};
pub use workflow::QuizLoopService;
