use tracing::debug;

use quiz_core::model::{ResultSummary, SessionConfig};

use super::service::{AdvanceResult, QuizSession};
use super::view::QuestionView;
use super::workflow::QuizLoopService;
use crate::error::{ControllerError, SessionError};

/// User-facing commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizCommand {
    Start(SessionConfig),
    /// Pick the choice at a 0-based display position.
    Select(usize),
    Next,
    Previous,
    EndEarly,
    /// Discard the session, keep the missed set.
    Restart,
    /// Clear the missed set and discard the session.
    Reset,
    /// From the results screen, prepare a run over missed questions.
    RetryMissed,
}

impl QuizCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Select(_) => "select",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::EndEarly => "end",
            Self::Restart => "restart",
            Self::Reset => "reset",
            Self::RetryMissed => "retry missed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeNotice {
    /// The last start attempt produced no questions.
    NoQuestions,
    /// The missed set was cleared.
    MissedReset,
    /// The pending config now targets missed questions.
    RetryMissedReady,
}

/// What the presentation layer should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizScreen {
    Home { notice: Option<HomeNotice> },
    Question(QuestionView),
    Results(ResultSummary),
}

enum Phase {
    Home,
    InProgress(QuizSession),
    Results(ResultSummary),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::InProgress(_) => "quiz",
            Self::Results(_) => "results",
        }
    }
}

/// Single owner of the active session; maps commands to engine calls.
pub struct QuizController {
    service: QuizLoopService,
    phase: Phase,
    pending_config: SessionConfig,
}

impl QuizController {
    #[must_use]
    pub fn new(service: QuizLoopService, config: SessionConfig) -> Self {
        Self {
            service,
            phase: Phase::Home,
            pending_config: config,
        }
    }

    /// Config the next `Start` would typically use (updated by `Start` and `RetryMissed`).
    #[must_use]
    pub fn pending_config(&self) -> &SessionConfig {
        &self.pending_config
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match &self.phase {
            Phase::InProgress(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn service(&self) -> &QuizLoopService {
        &self.service
    }

    /// Render the current screen without changing state.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from view construction.
    pub fn screen(&mut self) -> Result<QuizScreen, ControllerError> {
        Ok(match &mut self.phase {
            Phase::Home => QuizScreen::Home { notice: None },
            Phase::InProgress(session) => QuizScreen::Question(QuestionView::for_current(session)?),
            Phase::Results(summary) => QuizScreen::Results(summary.clone()),
        })
    }

    /// Apply a command.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::InvalidCommand` when the command does not
    /// apply to the current screen, and `ControllerError::Session` when the
    /// engine or storage rejects it. Rejected commands leave state unchanged;
    /// an answer whose missed-set write failed stays recorded in the session.
    pub async fn handle(&mut self, command: QuizCommand) -> Result<QuizScreen, ControllerError> {
        debug!(command = command.name(), screen = self.phase.name(), "handling command");
        match (command, &mut self.phase) {
            (QuizCommand::Start(config), Phase::Home | Phase::Results(_)) => {
                self.pending_config = config;
                match self.service.start_session(&self.pending_config).await {
                    Ok(session) => {
                        self.phase = Phase::InProgress(session);
                        self.screen()
                    }
                    Err(SessionError::Empty) => {
                        self.phase = Phase::Home;
                        Ok(QuizScreen::Home {
                            notice: Some(HomeNotice::NoQuestions),
                        })
                    }
                    Err(err) => Err(err.into()),
                }
            }
            (QuizCommand::Select(display), Phase::InProgress(session)) => {
                self.service.answer_display(session, display).await?;
                self.screen()
            }
            (QuizCommand::Next, Phase::InProgress(session)) => {
                match self.service.advance(session)? {
                    AdvanceResult::Continue => self.screen(),
                    AdvanceResult::Finished => Ok(self.finish()),
                }
            }
            (QuizCommand::Previous, Phase::InProgress(session)) => {
                self.service.retreat(session)?;
                self.screen()
            }
            (QuizCommand::EndEarly, Phase::InProgress(session)) => {
                self.service.end_early(session)?;
                Ok(self.finish())
            }
            (QuizCommand::Restart, _) => {
                self.phase = Phase::Home;
                Ok(QuizScreen::Home { notice: None })
            }
            (QuizCommand::Reset, _) => {
                self.service.reset_missed().await?;
                self.phase = Phase::Home;
                Ok(QuizScreen::Home {
                    notice: Some(HomeNotice::MissedReset),
                })
            }
            (QuizCommand::RetryMissed, Phase::Results(summary)) if summary.has_missed() => {
                self.pending_config = QuizLoopService::retry_missed_config(&self.pending_config);
                self.phase = Phase::Home;
                Ok(QuizScreen::Home {
                    notice: Some(HomeNotice::RetryMissedReady),
                })
            }
            (command, phase) => Err(ControllerError::InvalidCommand {
                command: command.name(),
                screen: phase.name(),
            }),
        }
    }

    /// Move a completed session to the results screen.
    fn finish(&mut self) -> QuizScreen {
        let summary = match &self.phase {
            Phase::InProgress(session) => session.summarize(),
            Phase::Results(summary) => summary.clone(),
            Phase::Home => return QuizScreen::Home { notice: None },
        };
        self.phase = Phase::Results(summary.clone());
        QuizScreen::Results(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_bank::QuestionBank;
    use quiz_core::model::{Question, QuestionId, QuizMode};
    use quiz_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::{InMemoryRepository, MissedSetStore};

    fn controller(n: usize) -> QuizController {
        let questions = (1..=n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    vec!["A".into(), "B".into()],
                    0,
                    None,
                    None,
                )
                .unwrap()
            })
            .collect();
        let store = MissedSetStore::new(Arc::new(InMemoryRepository::new()));
        let service = QuizLoopService::new(
            fixed_clock(),
            Arc::new(QuestionBank::from_questions(questions)),
            store,
        )
        .with_seed(Some(2));
        QuizController::new(service, SessionConfig::default())
    }

    #[tokio::test]
    async fn full_run_reaches_results() {
        let mut ctl = controller(2);
        let screen = ctl
            .handle(QuizCommand::Start(SessionConfig::new(2, QuizMode::Instant)))
            .await
            .unwrap();
        assert!(matches!(screen, QuizScreen::Question(ref v) if v.position == 1));

        ctl.handle(QuizCommand::Select(0)).await.unwrap();
        ctl.handle(QuizCommand::Next).await.unwrap();
        ctl.handle(QuizCommand::Select(1)).await.unwrap();
        let screen = ctl.handle(QuizCommand::Next).await.unwrap();

        let QuizScreen::Results(summary) = screen else {
            panic!("expected results");
        };
        assert_eq!(summary.correct_count(), 1);
        assert_eq!(summary.answered_count(), 2);
        assert_eq!(summary.percentage(), 50);
        assert!(ctl.session().is_none());
    }

    #[tokio::test]
    async fn retry_missed_targets_wrong_answers() {
        let mut ctl = controller(3);
        ctl.handle(QuizCommand::Start(SessionConfig::new(3, QuizMode::Exam)))
            .await
            .unwrap();
        let missed_id = ctl.session().unwrap().current_question().id().clone();
        ctl.handle(QuizCommand::Select(1)).await.unwrap();
        ctl.handle(QuizCommand::EndEarly).await.unwrap();

        let screen = ctl.handle(QuizCommand::RetryMissed).await.unwrap();
        assert_eq!(
            screen,
            QuizScreen::Home {
                notice: Some(HomeNotice::RetryMissedReady)
            }
        );
        assert!(ctl.pending_config().only_missed());

        let config = ctl.pending_config().clone();
        ctl.handle(QuizCommand::Start(config)).await.unwrap();
        let session = ctl.session().unwrap();
        assert_eq!(session.total_questions(), 1);
        assert_eq!(session.current_question().id(), &missed_id);
    }

    #[tokio::test]
    async fn empty_bank_returns_home_with_notice() {
        let mut ctl = controller(0);
        let screen = ctl
            .handle(QuizCommand::Start(SessionConfig::default()))
            .await
            .unwrap();
        assert_eq!(
            screen,
            QuizScreen::Home {
                notice: Some(HomeNotice::NoQuestions)
            }
        );
    }

    #[tokio::test]
    async fn commands_are_checked_against_screen() {
        let mut ctl = controller(1);
        let err = ctl.handle(QuizCommand::Next).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::InvalidCommand {
                command: "next",
                screen: "home"
            }
        ));

        ctl.handle(QuizCommand::Start(SessionConfig::default()))
            .await
            .unwrap();
        let err = ctl
            .handle(QuizCommand::Start(SessionConfig::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::InvalidCommand { .. }));

        let err = ctl.handle(QuizCommand::Select(5)).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Session(SessionError::ChoiceOutOfRange { .. })
        ));

        // Everything correct: nothing to retry.
        ctl.handle(QuizCommand::Select(0)).await.unwrap();
        ctl.handle(QuizCommand::Next).await.unwrap();
        let err = ctl.handle(QuizCommand::RetryMissed).await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidCommand { .. }));
    }

    #[tokio::test]
    async fn restart_keeps_missed_and_reset_clears_it() {
        let mut ctl = controller(1);
        ctl.handle(QuizCommand::Start(SessionConfig::default()))
            .await
            .unwrap();
        ctl.handle(QuizCommand::Select(1)).await.unwrap();

        ctl.handle(QuizCommand::Restart).await.unwrap();
        assert!(ctl.session().is_none());
        assert_eq!(ctl.service().missed_set().await.len(), 1);

        let screen = ctl.handle(QuizCommand::Reset).await.unwrap();
        assert_eq!(
            screen,
            QuizScreen::Home {
                notice: Some(HomeNotice::MissedReset)
            }
        );
        assert!(ctl.service().missed_set().await.is_empty());
    }
}
