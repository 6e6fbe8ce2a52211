use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// Membership change the session engine requests after each answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissedSetChange {
    /// The question was answered incorrectly.
    Add(QuestionId),
    /// The question was answered correctly.
    Remove(QuestionId),
}

impl MissedSetChange {
    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        match self {
            Self::Add(id) | Self::Remove(id) => id,
        }
    }
}

/// Persistent set of questions most recently answered incorrectly.
///
/// Serialized as a plain JSON array of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissedSet {
    ids: BTreeSet<QuestionId>,
}

impl MissedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was not already present.
    pub fn insert(&mut self, id: QuestionId) -> bool {
        self.ids.insert(id)
    }

    /// Returns true if the id was present.
    pub fn remove(&mut self, id: &QuestionId) -> bool {
        self.ids.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionId> {
        self.ids.iter()
    }

    /// Apply an engine-produced change. Returns true if membership changed.
    pub fn apply(&mut self, change: &MissedSetChange) -> bool {
        match change {
            MissedSetChange::Add(id) => self.insert(id.clone()),
            MissedSetChange::Remove(id) => self.remove(id),
        }
    }
}

impl FromIterator<QuestionId> for MissedSet {
    fn from_iter<T: IntoIterator<Item = QuestionId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
