//! Role attributes (used / created / shared) of a dataset mention.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three role axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleAxis {
    Used,
    Created,
    Shared,
}

impl RoleAxis {
    pub const ALL: [RoleAxis; 3] = [RoleAxis::Used, RoleAxis::Created, RoleAxis::Shared];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleAxis::Used => "used",
            RoleAxis::Created => "created",
            RoleAxis::Shared => "shared",
        }
    }
}

impl fmt::Display for RoleAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision and score on one axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoleDecision {
    /// Thresholded decision, unset until a classifier has spoken
    pub value: Option<bool>,
    /// Probability in [0, 1]
    pub score: f64,
}

impl RoleDecision {
    pub fn new(value: bool, score: f64) -> Self {
        Self {
            value: Some(value),
            score,
        }
    }
}

/// Role attributes of a mention, or of all mentions of a dataset in a document
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextAttributes {
    pub used: RoleDecision,
    pub created: RoleDecision,
    pub shared: RoleDecision,
}

impl ContextAttributes {
    pub fn get(&self, axis: RoleAxis) -> RoleDecision {
        match axis {
            RoleAxis::Used => self.used,
            RoleAxis::Created => self.created,
            RoleAxis::Shared => self.shared,
        }
    }

    pub fn set(&mut self, axis: RoleAxis, decision: RoleDecision) {
        match axis {
            RoleAxis::Used => self.used = decision,
            RoleAxis::Created => self.created = decision,
            RoleAxis::Shared => self.shared = decision,
        }
    }

    /// Fold `other` into these attributes.
    ///
    /// A decision already `true` is kept, otherwise the incoming decision is
    /// taken when it has one. Scores keep the maximum.
    pub fn merge(&mut self, other: &ContextAttributes) {
        for axis in RoleAxis::ALL {
            let mut current = self.get(axis);
            let incoming = other.get(axis);
            if current.value != Some(true) && incoming.value.is_some() {
                current.value = incoming.value;
            }
            if incoming.score > current.score {
                current.score = incoming.score;
            }
            self.set(axis, current);
        }
    }
}
