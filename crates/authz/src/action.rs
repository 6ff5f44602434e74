//! Actions and action sets.

use core::str::FromStr;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ridgeline_core::DomainError;

/// A capability requested against a resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Edit,
    Approve,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Edit, Action::Approve, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Approve => "approve",
            Action::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "edit" => Ok(Action::Edit),
            "approve" => Ok(Action::Approve),
            "delete" => Ok(Action::Delete),
            other => Err(DomainError::validation(format!("unknown action: {other}"))),
        }
    }
}

/// Ordered set of [`Action`] values.
///
/// Serializes transparently as a JSON array of action strings. Ordering is
/// the enum order (view, edit, approve, delete), which keeps listings and
/// audit output stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<Action>);

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor from a fixed list.
    pub fn of<I: IntoIterator<Item = Action>>(actions: I) -> Self {
        Self(actions.into_iter().collect())
    }

    /// The full set (every action).
    pub fn all() -> Self {
        Self::of(Action::ALL)
    }

    pub fn insert(&mut self, action: Action) {
        self.0.insert(action);
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// In-place union with another set. Grants are additive; effects union,
    /// never overwrite.
    pub fn union_with(&mut self, other: &ActionSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl core::fmt::Display for ActionSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for action in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(action.as_str())?;
            first = false;
        }
        Ok(())
    }
}
