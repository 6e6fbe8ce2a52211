use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MappingError {
    #[error("choice order is not a permutation of 0..{len}")]
    NotAPermutation { len: usize },
}

/// One displayed choice: where it is shown and which original choice it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChoiceSlot {
    pub display_position: usize,
    pub original_index: usize,
}

/// Fixed permutation from display order to original choice order.
///
/// A mapping is generated once per question per session, so revisiting a
/// question shows the same order and a stored selection maps back correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceMapping {
    slots: Vec<ChoiceSlot>,
}

impl ChoiceMapping {
    /// Display order equals original order.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            slots: (0..len)
                .map(|i| ChoiceSlot {
                    display_position: i,
                    original_index: i,
                })
                .collect(),
        }
    }

    /// Build a mapping where `order[display_position] == original_index`.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::NotAPermutation` unless `order` contains every
    /// index in `0..order.len()` exactly once.
    pub fn from_order(order: Vec<usize>) -> Result<Self, MappingError> {
        let len = order.len();
        let mut seen = vec![false; len];
        for &original in &order {
            match seen.get_mut(original) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(MappingError::NotAPermutation { len }),
            }
        }

        Ok(Self {
            slots: order
                .into_iter()
                .enumerate()
                .map(|(display_position, original_index)| ChoiceSlot {
                    display_position,
                    original_index,
                })
                .collect(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[ChoiceSlot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChoiceSlot> {
        self.slots.iter()
    }

    #[must_use]
    pub fn original_index(&self, display_position: usize) -> Option<usize> {
        self.slots.get(display_position).map(|s| s.original_index)
    }

    #[must_use]
    pub fn display_position(&self, original_index: usize) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.original_index == original_index)
            .map(|s| s.display_position)
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.display_position == s.original_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_maps_each_position_to_itself() {
        let mapping = ChoiceMapping::identity(3);
        assert!(mapping.is_identity());
        assert_eq!(mapping.original_index(2), Some(2));
        assert_eq!(mapping.original_index(3), None);
    }

    #[test]
    fn from_order_round_trips_positions() {
        let mapping = ChoiceMapping::from_order(vec![2, 0, 1]).unwrap();
        assert_eq!(mapping.original_index(0), Some(2));
        assert_eq!(mapping.display_position(2), Some(0));
        assert_eq!(mapping.display_position(1), Some(2));
        assert!(!mapping.is_identity());
    }

    #[test]
    fn from_order_rejects_duplicates_and_gaps() {
        assert_eq!(
            ChoiceMapping::from_order(vec![0, 0, 1]),
            Err(MappingError::NotAPermutation { len: 3 })
        );
        assert_eq!(
            ChoiceMapping::from_order(vec![0, 3, 1]),
            Err(MappingError::NotAPermutation { len: 3 })
        );
    }
}
