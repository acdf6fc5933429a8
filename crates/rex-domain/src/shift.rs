//! Vocabulary for classifying a proposed change to a record's start date.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expense::RecurringExpense;

/// Outcome of comparing a proposed start date against a record and its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartDateShiftKind {
    NoChange,
    WithinMonth,
    IncreaseSafeWithinLimit,
    IncreaseSafeOutsideLimit,
    IncreaseConflict,
    ReduceSafe,
    ReduceConflict,
}

impl StartDateShiftKind {
    pub fn is_conflict(self) -> bool {
        matches!(
            self,
            StartDateShiftKind::IncreaseConflict | StartDateShiftKind::ReduceConflict
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            StartDateShiftKind::NoChange => "NO_CHANGE",
            StartDateShiftKind::WithinMonth => "WITHIN_MONTH",
            StartDateShiftKind::IncreaseSafeWithinLimit => "INCREASE_SAFE_WITHIN_LIMIT",
            StartDateShiftKind::IncreaseSafeOutsideLimit => "INCREASE_SAFE_OUTSIDE_LIMIT",
            StartDateShiftKind::IncreaseConflict => "INCREASE_CONFLICT",
            StartDateShiftKind::ReduceSafe => "REDUCE_SAFE",
            StartDateShiftKind::ReduceConflict => "REDUCE_CONFLICT",
        }
    }
}

impl fmt::Display for StartDateShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification result together with the siblings that caused a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartDateShift {
    pub value: StartDateShiftKind,
    pub conflicts: Vec<RecurringExpense>,
}

impl StartDateShift {
    pub fn clean(value: StartDateShiftKind) -> Self {
        Self {
            value,
            conflicts: Vec::new(),
        }
    }
}

/// How sibling records are matched against a conflict window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDetection {
    /// A sibling conflicts when its start or its end falls inside the window.
    #[default]
    EndpointInWindow,
    /// A sibling conflicts when any of its months intersects the window.
    IntervalOverlap,
}
