/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// `round(position / total * 100)`, for a progress bar.
    pub percent: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn new(position: usize, total: usize, answered: usize, is_complete: bool) -> Self {
        let percent = if total == 0 {
            0
        } else {
            u32::try_from((200 * position + total) / (2 * total)).unwrap_or(100)
        };
        Self {
            position,
            total,
            answered,
            percent,
            is_complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_tracks_position() {
        assert_eq!(SessionProgress::new(1, 3, 0, false).percent, 33);
        assert_eq!(SessionProgress::new(3, 3, 1, false).percent, 100);
        assert_eq!(SessionProgress::new(0, 0, 0, true).percent, 0);
    }
}
