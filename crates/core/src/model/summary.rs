use std::collections::HashMap;

use crate::model::{AnswerState, Question, QuestionId};

/// Placeholder shown for a missing topic or answer.
pub const DASH: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Correct,
    Incorrect,
    Unanswered,
}

/// One row of the end-of-session review, in session order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    /// 1-based position within the session.
    pub position: usize,
    pub question_id: QuestionId,
    pub question: String,
    pub topic: Option<String>,
    pub status: ReviewStatus,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

impl ReviewItem {
    #[must_use]
    pub fn topic_or_dash(&self) -> &str {
        self.topic.as_deref().unwrap_or(DASH)
    }

    #[must_use]
    pub fn your_answer_or_dash(&self) -> &str {
        self.your_answer.as_deref().unwrap_or(DASH)
    }
}

/// Score and review derived from the final state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    total: usize,
    answered_count: usize,
    correct_count: usize,
    unanswered_count: usize,
    percentage: u32,
    missed_questions: Vec<QuestionId>,
    review: Vec<ReviewItem>,
}

impl ResultSummary {
    /// Summarize answers for the given questions.
    ///
    /// `percentage` is relative to answered questions, so skipped questions in
    /// exam mode do not lower the score; they are reported in `unanswered_count`.
    #[must_use]
    pub fn summarize(questions: &[Question], answers: &HashMap<QuestionId, AnswerState>) -> Self {
        let mut answered_count = 0_usize;
        let mut correct_count = 0_usize;
        let mut missed_questions = Vec::new();
        let mut review = Vec::with_capacity(questions.len());

        for (idx, question) in questions.iter().enumerate() {
            let state = answers.get(question.id());
            let selected = state.and_then(AnswerState::selected_original_index);
            let status = match state.and_then(AnswerState::is_correct) {
                Some(true) => ReviewStatus::Correct,
                Some(false) => ReviewStatus::Incorrect,
                None => ReviewStatus::Unanswered,
            };

            if selected.is_some() {
                answered_count += 1;
            }
            match status {
                ReviewStatus::Correct => correct_count += 1,
                ReviewStatus::Incorrect => missed_questions.push(question.id().clone()),
                ReviewStatus::Unanswered => {}
            }

            review.push(ReviewItem {
                position: idx + 1,
                question_id: question.id().clone(),
                question: question.text().to_owned(),
                topic: question.topic().map(str::to_owned),
                status,
                your_answer: selected.and_then(|i| question.choice(i)).map(str::to_owned),
                correct_answer: question.correct_choice().to_owned(),
                explanation: question.explanation().map(str::to_owned),
            });
        }

        Self {
            total: questions.len(),
            answered_count,
            correct_count,
            unanswered_count: questions.len() - answered_count,
            percentage: rounded_percentage(correct_count, answered_count),
            missed_questions,
            review,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answered_count
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.unanswered_count
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    /// Questions answered incorrectly, in session order.
    #[must_use]
    pub fn missed_questions(&self) -> &[QuestionId] {
        &self.missed_questions
    }

    /// True when a "retry missed" action should be offered.
    #[must_use]
    pub fn has_missed(&self) -> bool {
        !self.missed_questions.is_empty()
    }

    #[must_use]
    pub fn review(&self) -> &[ReviewItem] {
        &self.review
    }
}

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is 0.
fn rounded_percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let pct = (200 * part + whole) / (2 * whole);
    u32::try_from(pct).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceMapping;

    fn question(id: &str, answer: i64, topic: Option<&str>) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["A".into(), "B".into(), "C".into()],
            answer,
            topic.map(str::to_owned),
            None,
        )
        .unwrap()
    }

    fn answered(selected: usize, correct: bool) -> AnswerState {
        let mut state = AnswerState::new(ChoiceMapping::identity(3));
        state.record(selected, correct);
        state
    }

    #[test]
    fn half_correct_is_fifty_percent() {
        let questions = vec![question("q1", 0, None), question("q2", 1, None)];
        let mut answers = HashMap::new();
        answers.insert(QuestionId::new("q1"), answered(0, true));
        answers.insert(QuestionId::new("q2"), answered(2, false));

        let summary = ResultSummary::summarize(&questions, &answers);
        assert_eq!(summary.correct_count(), 1);
        assert_eq!(summary.answered_count(), 2);
        assert_eq!(summary.percentage(), 50);
        assert_eq!(summary.unanswered_count(), 0);
        assert_eq!(summary.missed_questions(), &[QuestionId::new("q2")]);
        assert!(summary.has_missed());
    }

    #[test]
    fn unanswered_questions_do_not_count_against_percentage() {
        let questions = vec![
            question("q1", 0, Some("Rust")),
            question("q2", 1, None),
            question("q3", 2, None),
        ];
        let mut answers = HashMap::new();
        answers.insert(QuestionId::new("q1"), answered(0, true));
        // Displayed but never answered.
        answers.insert(QuestionId::new("q2"), AnswerState::new(ChoiceMapping::identity(3)));

        let summary = ResultSummary::summarize(&questions, &answers);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.answered_count(), 1);
        assert_eq!(summary.unanswered_count(), 2);
        assert_eq!(summary.percentage(), 100);
        assert!(!summary.has_missed());

        let review = summary.review();
        assert_eq!(review[0].status, ReviewStatus::Correct);
        assert_eq!(review[0].topic_or_dash(), "Rust");
        assert_eq!(review[1].status, ReviewStatus::Unanswered);
        assert_eq!(review[1].topic_or_dash(), DASH);
        assert_eq!(review[1].your_answer_or_dash(), DASH);
        assert_eq!(review[2].correct_answer, "C");
        assert_eq!(review[2].position, 3);
    }

    #[test]
    fn nothing_answered_scores_zero() {
        let questions = vec![question("q1", 0, None)];
        let summary = ResultSummary::summarize(&questions, &HashMap::new());
        assert_eq!(summary.percentage(), 0);
        assert_eq!(summary.unanswered_count(), 1);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 8), 13);
    }
}
