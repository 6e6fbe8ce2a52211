use std::io::Write;

use anyhow::Context;
use quiz_core::model::{DASH, ResultSummary, ReviewStatus};
use services::{
    ControllerError, HomeNotice, QuestionView, QuizCommand, QuizController, QuizScreen,
    SessionError,
};
use services::sessions::ChoiceMarker;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Command(QuizCommand),
    Start,
    Quit,
    Help,
    Blank,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    if let Ok(number) = line.parse::<usize>() {
        return match number.checked_sub(1) {
            Some(display) => Input::Command(QuizCommand::Select(display)),
            None => Input::Unknown(line.to_string()),
        };
    }
    match line.to_ascii_lowercase().as_str() {
        "n" | "next" => Input::Command(QuizCommand::Next),
        "p" | "prev" => Input::Command(QuizCommand::Previous),
        "e" | "end" => Input::Command(QuizCommand::EndEarly),
        "r" | "restart" => Input::Command(QuizCommand::Restart),
        "m" | "retry" => Input::Command(QuizCommand::RetryMissed),
        "x" | "reset" => Input::Command(QuizCommand::Reset),
        "s" | "start" => Input::Start,
        "q" | "quit" => Input::Quit,
        "h" | "help" | "?" => Input::Help,
        _ => Input::Unknown(line.to_string()),
    }
}

/// Drive the controller from line-based input until `quit` or end of input.
///
/// A session is started right away with the controller's pending config.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails. Rejected
/// commands are reported inline and do not end the loop.
pub async fn run_loop<R, W>(
    controller: &mut QuizController,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let start = QuizCommand::Start(controller.pending_config().clone());
    dispatch(controller, start, out).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("reading input")? {
        let command = match parse_input(&line) {
            Input::Command(command) => command,
            Input::Start => QuizCommand::Start(controller.pending_config().clone()),
            Input::Quit => break,
            Input::Help => {
                write_help(out)?;
                continue;
            }
            Input::Blank => continue,
            Input::Unknown(raw) => {
                writeln!(out, "unknown input: {raw} (h for help)")?;
                continue;
            }
        };
        dispatch(controller, command, out).await?;
    }
    out.flush()?;
    Ok(())
}

async fn dispatch<W: Write>(
    controller: &mut QuizController,
    command: QuizCommand,
    out: &mut W,
) -> anyhow::Result<()> {
    match controller.handle(command).await {
        Ok(screen) => render(&screen, out)?,
        Err(ControllerError::InvalidCommand { command, screen }) => {
            debug!(command, screen, "command rejected");
            writeln!(out, "'{command}' is not available here (h for help)")?;
        }
        Err(ControllerError::Session(SessionError::ChoiceOutOfRange { len, .. })) => {
            writeln!(out, "! pick an answer from 1 to {len}")?;
        }
        Err(err) => writeln!(out, "! {err}")?,
    }
    out.flush()?;
    Ok(())
}

fn render<W: Write>(screen: &QuizScreen, out: &mut W) -> std::io::Result<()> {
    match screen {
        QuizScreen::Home { notice } => render_home(*notice, out),
        QuizScreen::Question(view) => render_question(view, out),
        QuizScreen::Results(summary) => render_results(summary, out),
    }
}

fn render_home<W: Write>(notice: Option<HomeNotice>, out: &mut W) -> std::io::Result<()> {
    match notice {
        Some(HomeNotice::NoQuestions) => writeln!(out, "No questions available for this selection.")?,
        Some(HomeNotice::MissedReset) => writeln!(out, "Missed questions cleared.")?,
        Some(HomeNotice::RetryMissedReady) => {
            writeln!(out, "Next run will use missed questions only.")?;
        }
        None => {}
    }
    writeln!(out, "s to start, q to quit")
}

fn render_question<W: Write>(view: &QuestionView, out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Question {}/{} ({}%) [{}]",
        view.position,
        view.total,
        view.percent,
        view.topic.as_deref().unwrap_or(DASH)
    )?;
    writeln!(out, "{}", view.text)?;
    for choice in &view.choices {
        let marker = match choice.marker {
            ChoiceMarker::None => "",
            ChoiceMarker::Selected => "  <- selected",
            ChoiceMarker::Correct => "  <- correct",
            ChoiceMarker::Wrong => "  <- your answer",
        };
        writeln!(out, "  {}) {}{marker}", choice.display_position + 1, choice.text)?;
    }
    if let Some(feedback) = &view.feedback {
        writeln!(out, "{}", if feedback.is_correct { "Correct!" } else { "Incorrect." })?;
        match &feedback.explanation {
            Some(explanation) => writeln!(out, "{explanation}")?,
            None => writeln!(out, "No explanation available.")?,
        }
    }

    let mut keys = vec![format!("1-{} answer", view.choices.len())];
    if view.can_retreat {
        keys.push("p prev".into());
    }
    keys.push(if view.is_last { "n finish" } else { "n next" }.into());
    keys.push("e end".into());
    keys.push("q quit".into());
    writeln!(out, "[{}]", keys.join(", "))
}

fn render_results<W: Write>(summary: &ResultSummary, out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Score: {}/{} answered correct ({}%)",
        summary.correct_count(),
        summary.answered_count(),
        summary.percentage()
    )?;
    writeln!(
        out,
        "Unanswered: {} of {}",
        summary.unanswered_count(),
        summary.total()
    )?;
    for item in summary.review() {
        let status = match item.status {
            ReviewStatus::Correct => "ok",
            ReviewStatus::Incorrect => "wrong",
            ReviewStatus::Unanswered => "skipped",
        };
        writeln!(
            out,
            "{:>3}. [{status}] {} ({})",
            item.position,
            item.question,
            item.topic_or_dash()
        )?;
        writeln!(
            out,
            "     your answer: {} | correct: {}",
            item.your_answer_or_dash(),
            item.correct_answer
        )?;
        if let Some(explanation) = &item.explanation {
            writeln!(out, "     {explanation}")?;
        }
    }
    if summary.has_missed() {
        writeln!(out, "m to retry missed, r to restart, x to reset missed, q to quit")
    } else {
        writeln!(out, "r to restart, x to reset missed, q to quit")
    }
}

fn write_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "  <number>    pick that answer")?;
    writeln!(out, "  n, next     next question (finishes on the last one)")?;
    writeln!(out, "  p, prev     previous question")?;
    writeln!(out, "  e, end      end the session now")?;
    writeln!(out, "  r, restart  back to start, missed set kept")?;
    writeln!(out, "  m, retry    prepare a run over missed questions")?;
    writeln!(out, "  x, reset    clear missed questions")?;
    writeln!(out, "  s, start    start a session")?;
    writeln!(out, "  q, quit     exit")
}
