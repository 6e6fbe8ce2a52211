use quiz_core::model::{QuizMode, SessionConfig};
use quiz_core::time::fixed_now;
use services::{AppServices, Clock, QuestionBank, QuizCommand, QuizScreen};

const QUESTIONS: &str = r#"[
    {"id": "q1", "question": "2 + 2?", "choices": ["3", "4"], "answerIndex": 1, "topic": "math"},
    {"id": "q2", "question": "Capital of France?", "choices": ["Paris", "Rome"], "answerIndex": 0},
    {"id": "q3", "question": "Largest planet?", "choices": ["Mars", "Jupiter"], "answerIndex": 1},
    {"id": "q4", "question": "H2O is?", "choices": ["Water", "Salt"], "answerIndex": 0},
    {"id": "q5", "question": "Sky colour?", "choices": ["Green", "Blue"], "answerIndex": 1,
     "explanation": "Rayleigh scattering."}
]"#;

fn services() -> AppServices {
    let bank = QuestionBank::from_json(QUESTIONS).unwrap();
    AppServices::in_memory(bank, Clock::fixed(fixed_now())).with_seed(Some(11))
}

#[tokio::test]
async fn count_limits_distinct_questions() {
    let services = services();
    let session = services
        .quiz_loop()
        .start_session(&SessionConfig::new(3, QuizMode::Instant))
        .await
        .unwrap();

    let mut ids: Vec<_> = session.questions().iter().map(|q| q.id().clone()).collect();
    assert_eq!(ids.len(), 3);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn only_missed_with_empty_set_uses_whole_pool() {
    let services = services();
    let config = SessionConfig::new(10, QuizMode::Exam).with_only_missed(true);
    let session = services.quiz_loop().start_session(&config).await.unwrap();
    assert_eq!(session.total_questions(), 5);
}

#[tokio::test]
async fn wrong_then_right_clears_missed_entry() {
    let services = services();
    let quiz_loop = services.quiz_loop();
    let mut session = quiz_loop
        .start_session(&SessionConfig::new(5, QuizMode::Instant))
        .await
        .unwrap();
    let question = session.current_question().clone();
    let wrong = (question.answer_index() + 1) % question.choice_count();

    quiz_loop.answer_current(&mut session, wrong).await.unwrap();
    assert!(quiz_loop.missed_set().await.contains(question.id()));

    quiz_loop
        .answer_current(&mut session, question.answer_index())
        .await
        .unwrap();
    assert!(!quiz_loop.missed_set().await.contains(question.id()));
}

#[tokio::test]
async fn right_then_wrong_in_later_session_adds_id_back() {
    let services = services();
    let quiz_loop = services.quiz_loop();
    let config = SessionConfig::new(1, QuizMode::Exam);

    let mut first = quiz_loop.start_session(&config).await.unwrap();
    let question = first.current_question().clone();
    quiz_loop
        .answer_current(&mut first, question.answer_index())
        .await
        .unwrap();
    quiz_loop.advance(&mut first).unwrap();
    assert!(first.is_complete());
    assert!(!quiz_loop.missed_set().await.contains(question.id()));

    // Fixed seed: the second session draws the same question.
    let mut second = quiz_loop.start_session(&config).await.unwrap();
    assert_eq!(second.current_question().id(), question.id());
    let wrong = (question.answer_index() + 1) % question.choice_count();
    quiz_loop.answer_current(&mut second, wrong).await.unwrap();

    let missed = quiz_loop.missed_set().await;
    assert!(missed.contains(question.id()));
    assert_eq!(missed.len(), 1);
}

#[tokio::test]
async fn controller_summary_counts_answered_only() {
    let services = services();
    let mut controller = services.controller(SessionConfig::default());
    controller
        .handle(QuizCommand::Start(SessionConfig::new(2, QuizMode::Exam)))
        .await
        .unwrap();

    let first = controller.session().unwrap().current_question().clone();
    controller
        .handle(QuizCommand::Select(first.answer_index()))
        .await
        .unwrap();
    let screen = controller.handle(QuizCommand::EndEarly).await.unwrap();

    let QuizScreen::Results(summary) = screen else {
        panic!("expected results screen");
    };
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.answered_count(), 1);
    assert_eq!(summary.unanswered_count(), 1);
    assert_eq!(summary.percentage(), 100);
    assert!(!summary.has_missed());
}

#[tokio::test]
async fn sqlite_services_persist_missed_set_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let questions_path = dir.path().join("questions.json");
    std::fs::write(&questions_path, QUESTIONS).unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("quiz.sqlite3").display());

    let clock = Clock::fixed(fixed_now());
    let first = AppServices::new_sqlite(&db_url, &questions_path, clock)
        .await
        .unwrap()
        .with_seed(Some(3));
    assert_eq!(first.bank().len(), 5);

    let mut session = first
        .quiz_loop()
        .start_session(&SessionConfig::new(1, QuizMode::Exam))
        .await
        .unwrap();
    let question = session.current_question().clone();
    let wrong = (question.answer_index() + 1) % question.choice_count();
    first
        .quiz_loop()
        .answer_current(&mut session, wrong)
        .await
        .unwrap();

    let second = AppServices::new_sqlite(&db_url, &questions_path, clock)
        .await
        .unwrap();
    let missed = second.quiz_loop().missed_set().await;
    assert_eq!(missed.len(), 1);
    assert!(missed.contains(question.id()));
}
