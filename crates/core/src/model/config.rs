use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lower bound for the number of questions drawn into a session.
pub const MIN_COUNT: u32 = 1;
/// Upper bound for the number of questions drawn into a session.
pub const MAX_COUNT: u32 = 9999;

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// How feedback is delivered during a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Correctness and explanation are revealed right after each answer.
    #[default]
    Instant,
    /// Feedback is deferred until the session ends.
    Exam,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {raw} (expected `instant` or `exam`)")]
pub struct QuizModeParseError {
    pub raw: String,
}

impl FromStr for QuizMode {
    type Err = QuizModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instant" => Ok(Self::Instant),
            "exam" => Ok(Self::Exam),
            _ => Err(QuizModeParseError { raw: s.to_owned() }),
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant => write!(f, "instant"),
            Self::Exam => write!(f, "exam"),
        }
    }
}

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Options chosen on the start screen for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    count: u32,
    mode: QuizMode,
    shuffle_answers: bool,
    only_missed: bool,
    lock_on_first_answer: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            count: 10,
            mode: QuizMode::Instant,
            shuffle_answers: false,
            only_missed: false,
            lock_on_first_answer: false,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new(count: u32, mode: QuizMode) -> Self {
        Self::default().with_count(count).with_mode(mode)
    }

    /// Parse a user-typed count.
    ///
    /// The leading integer is used (trailing characters are ignored); anything
    /// non-numeric yields `MIN_COUNT`. The result is clamped to `[MIN_COUNT, MAX_COUNT]`.
    #[must_use]
    pub fn clamp_count(raw: &str) -> u32 {
        let trimmed = raw.trim();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let digits = &digits[..end];
        if digits.is_empty() || negative {
            return MIN_COUNT;
        }
        // Too many digits to fit in u64 is still "large".
        let value = digits.parse::<u64>().unwrap_or(u64::MAX);
        u32::try_from(value)
            .unwrap_or(u32::MAX)
            .clamp(MIN_COUNT, MAX_COUNT)
    }

    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.clamp(MIN_COUNT, MAX_COUNT);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: QuizMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_shuffle_answers(mut self, shuffle: bool) -> Self {
        self.shuffle_answers = shuffle;
        self
    }

    #[must_use]
    pub fn with_only_missed(mut self, only_missed: bool) -> Self {
        self.only_missed = only_missed;
        self
    }

    /// When enabled, the first selection for a question is final.
    #[must_use]
    pub fn with_lock_on_first_answer(mut self, lock: bool) -> Self {
        self.lock_on_first_answer = lock;
        self
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn shuffle_answers(&self) -> bool {
        self.shuffle_answers
    }

    #[must_use]
    pub fn only_missed(&self) -> bool {
        self.only_missed
    }

    #[must_use]
    pub fn lock_on_first_answer(&self) -> bool {
        self.lock_on_first_answer
    }
}
