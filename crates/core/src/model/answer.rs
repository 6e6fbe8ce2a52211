use crate::model::mapping::ChoiceMapping;

/// Per-question answer state within one session.
///
/// Created lazily the first time a question is displayed. `selected_original_index`
/// and `is_correct` stay `None` until the user picks a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerState {
    selected_original_index: Option<usize>,
    is_correct: Option<bool>,
    mapping: ChoiceMapping,
}

impl AnswerState {
    #[must_use]
    pub fn new(mapping: ChoiceMapping) -> Self {
        Self {
            selected_original_index: None,
            is_correct: None,
            mapping,
        }
    }

    /// Overwrite the selection and its correctness.
    pub fn record(&mut self, original_index: usize, is_correct: bool) {
        self.selected_original_index = Some(original_index);
        self.is_correct = Some(is_correct);
    }

    #[must_use]
    pub fn selected_original_index(&self) -> Option<usize> {
        self.selected_original_index
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    #[must_use]
    pub fn mapping(&self) -> &ChoiceMapping {
        &self.mapping
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected_original_index.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_overwrites_previous_selection() {
        let mut state = AnswerState::new(ChoiceMapping::identity(3));
        assert!(!state.is_answered());
        assert_eq!(state.is_correct(), None);

        state.record(2, false);
        state.record(1, true);
        assert_eq!(state.selected_original_index(), Some(1));
        assert_eq!(state.is_correct(), Some(true));
    }
}
