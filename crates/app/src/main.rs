use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use quiz_core::model::{QuizMode, SessionConfig};
use services::{AppServices, Clock, QuestionBank};
use storage::{MissedSetStore, Storage};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Parser)]
#[command(name = "quiz", version, about = "Multiple-choice quiz runner")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct CommonArgs {
    /// Question file (JSON array)
    #[arg(long, env = "QUIZ_QUESTIONS", default_value = "questions.json", global = true)]
    questions: PathBuf,

    /// SQLite database holding the missed set
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db_url: String,
}

#[derive(Args)]
struct SessionArgs {
    /// Number of questions; out-of-range values are clamped
    #[arg(long, env = "QUIZ_COUNT", default_value = "10", global = true)]
    count: String,

    /// instant or exam
    #[arg(long, env = "QUIZ_MODE", default_value = "instant", global = true)]
    mode: QuizMode,

    /// Shuffle answer order per question
    #[arg(long, env = "QUIZ_SHUFFLE_ANSWERS", global = true)]
    shuffle_answers: bool,

    /// Draw only previously missed questions
    #[arg(long, env = "QUIZ_ONLY_MISSED", global = true)]
    only_missed: bool,

    /// Reject changing an answer once given
    #[arg(long, env = "QUIZ_LOCK_ANSWERS", global = true)]
    lock_answers: bool,

    /// Seed for question and answer shuffling
    #[arg(long, env = "QUIZ_SEED", global = true)]
    seed: Option<u64>,
}

impl SessionArgs {
    fn to_config(&self) -> SessionConfig {
        SessionConfig::new(SessionConfig::clamp_count(&self.count), self.mode)
            .with_shuffle_answers(self.shuffle_answers)
            .with_only_missed(self.only_missed)
            .with_lock_on_first_answer(self.lock_answers)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive quiz in the terminal (default)
    Run,

    /// Load the question file and report how many questions it holds
    Validate,

    /// List ids of missed questions
    Missed,

    /// Clear the missed set
    Reset,
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

async fn open_missed_store(db_url: &str) -> anyhow::Result<MissedSetStore> {
    prepare_sqlite_file(db_url)?;
    let storage = Storage::sqlite(db_url)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    Ok(MissedSetStore::new(Arc::clone(&storage.kv)))
}

async fn run_quiz(common: &CommonArgs, session: &SessionArgs) -> anyhow::Result<()> {
    let db_url = normalize_sqlite_url(&common.db_url);
    prepare_sqlite_file(&db_url)?;
    let services = AppServices::new_sqlite(&db_url, &common.questions, Clock::default_clock())
        .await
        .context("starting quiz")?
        .with_seed(session.seed);

    let mut controller = services.controller(session.to_config());
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout().lock();
    terminal::run_loop(&mut controller, input, &mut out).await
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    match cli.command {
        None | Some(Commands::Run) => run_quiz(common, &cli.session).await,
        Some(Commands::Validate) => {
            let bank = QuestionBank::load_from_path(&common.questions)
                .await
                .with_context(|| format!("validating {}", common.questions.display()))?;
            println!("{}: {} questions OK", common.questions.display(), bank.len());
            Ok(())
        }
        Some(Commands::Missed) => {
            let store = open_missed_store(&normalize_sqlite_url(&common.db_url)).await?;
            let missed = store.get_all().await;
            if missed.is_empty() {
                println!("no missed questions");
            }
            for id in missed.iter() {
                println!("{id}");
            }
            Ok(())
        }
        Some(Commands::Reset) => {
            let store = open_missed_store(&normalize_sqlite_url(&common.db_url)).await?;
            store.clear().await.context("clearing missed set")?;
            println!("missed set cleared");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
