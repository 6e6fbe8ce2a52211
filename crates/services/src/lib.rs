#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod question_bank;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ControllerError, QuestionBankError, SessionError};
pub use question_bank::QuestionBank;

pub use sessions::{
    AdvanceResult, AnswerOutcome, HomeNotice, QuestionView, QuizCommand, QuizController,
    QuizLoopService, QuizScreen, QuizSession, SessionBuilder, SessionPlan, SessionState,
};
