//! Deletion modes for recurring expenses, including the month-splitting path.

use std::{fmt, str::FromStr};

use rex_domain::{RecurringExpense, RecurringExpensePatch, YearMonth};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, Mutation, MutationOutcome, RecurringExpenseStore};

/// How much of a record a deletion removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionMode {
    /// The whole record.
    All,
    /// The target month and every month after it.
    Future,
    /// Only the target month.
    Current,
}

impl FromStr for DeletionMode {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(DeletionMode::All),
            "FUTURE" => Ok(DeletionMode::Future),
            "CURRENT" => Ok(DeletionMode::Current),
            _ => Err(CoreError::UnsupportedDeletionMode(raw.to_string())),
        }
    }
}

impl fmt::Display for DeletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeletionMode::All => "ALL",
            DeletionMode::Future => "FUTURE",
            DeletionMode::Current => "CURRENT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRequest {
    pub mode: DeletionMode,
    pub year: i32,
    pub month: u32,
}

impl DeletionRequest {
    pub fn new(mode: DeletionMode, year: i32, month: u32) -> Self {
        Self { mode, year, month }
    }

    /// Builds a request from a textual mode such as `"CURRENT"`.
    pub fn parse(mode: &str, year: i32, month: u32) -> Result<Self, CoreError> {
        Ok(Self::new(mode.parse()?, year, month))
    }

    pub fn target(&self) -> Result<YearMonth, CoreError> {
        Ok(YearMonth::new(self.year, self.month)?)
    }
}

/// What a deletion did to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// The record was removed.
    Deleted { record: RecurringExpense },
    /// The record's end was pulled back.
    Truncated { record: RecurringExpense },
    /// The first month was removed: the original is gone and a successor
    /// starts one month later.
    Shifted {
        deleted: RecurringExpense,
        successor: Option<RecurringExpense>,
    },
    /// An interior month was removed: the original ends before it and a
    /// successor resumes after it.
    Split {
        truncated: RecurringExpense,
        successor: Option<RecurringExpense>,
    },
}

impl DeletionOutcome {
    pub fn successor(&self) -> Option<&RecurringExpense> {
        match self {
            DeletionOutcome::Shifted { successor, .. } | DeletionOutcome::Split { successor, .. } => {
                successor.as_ref()
            }
            _ => None,
        }
    }
}

/// Applies the three deletion modes against a store.
pub struct DeletionService;

impl DeletionService {
    pub fn delete_by_mode(
        store: &dyn RecurringExpenseStore,
        id: Uuid,
        request: DeletionRequest,
    ) -> Result<DeletionOutcome, CoreError> {
        let target = request.target()?;
        let original = store.find_one(id)?.ok_or(CoreError::RecordNotFound(id))?;

        match request.mode {
            DeletionMode::All => Self::delete_all(store, &original),
            DeletionMode::Future => Self::delete_future(store, &original, target),
            DeletionMode::Current => Self::delete_current(store, &original, target),
        }
    }

    fn delete_all(
        store: &dyn RecurringExpenseStore,
        original: &RecurringExpense,
    ) -> Result<DeletionOutcome, CoreError> {
        let record = store.delete(original.id)?;
        tracing::info!(id = %record.id, chain = %record.chain_id, "deleted recurring expense");
        Ok(DeletionOutcome::Deleted { record })
    }

    fn delete_future(
        store: &dyn RecurringExpenseStore,
        original: &RecurringExpense,
        target: YearMonth,
    ) -> Result<DeletionOutcome, CoreError> {
        ensure_reachable(original, target)?;
        if target == original.start_month_key() {
            return Self::delete_all(store, original);
        }
        let last_month = target.previous();
        let record = store.update(original.id, &RecurringExpensePatch::end_at(last_month))?;
        tracing::info!(
            id = %record.id,
            end = %last_month,
            "truncated recurring expense before {target}"
        );
        Ok(DeletionOutcome::Truncated { record })
    }

    fn delete_current(
        store: &dyn RecurringExpenseStore,
        original: &RecurringExpense,
        target: YearMonth,
    ) -> Result<DeletionOutcome, CoreError> {
        ensure_reachable(original, target)?;
        let start = original.start_month_key();
        let end = original.end_month_key();

        if target == start && end == Some(target) {
            return Self::delete_all(store, original);
        }

        let successor = successor_for(original, target);
        let head = if target == start {
            Mutation::Delete(original.id)
        } else {
            Mutation::Update {
                id: original.id,
                patch: RecurringExpensePatch::end_at(target.previous()),
            }
        };
        let mut batch = vec![head];
        if let Some(record) = successor {
            batch.push(Mutation::Create(record));
        }

        let mut outcomes = store.apply_batch(batch)?.into_iter();
        let first = outcomes.next().map(MutationOutcome::into_record).ok_or_else(|| {
            CoreError::InvalidOperation("store returned no outcome for a split".into())
        })?;
        let successor = outcomes.next().map(MutationOutcome::into_record);

        tracing::info!(
            id = %original.id,
            chain = %original.chain_id,
            month = %target,
            successor = ?successor.as_ref().map(|record| record.id),
            "removed single month from recurring expense"
        );

        if target == start {
            Ok(DeletionOutcome::Shifted {
                deleted: first,
                successor,
            })
        } else {
            Ok(DeletionOutcome::Split {
                truncated: first,
                successor,
            })
        }
    }
}

/// Accepts any month from the start through the month after the end. The month
/// after the end truncates to the existing end and leaves the record as it is.
fn ensure_reachable(original: &RecurringExpense, target: YearMonth) -> Result<(), CoreError> {
    let reachable = target >= original.start_month_key()
        && original
            .end_month_key()
            .map_or(true, |end| target <= end.next());
    if reachable {
        Ok(())
    } else {
        Err(CoreError::MonthOutsideRecord {
            id: original.id,
            month: target,
        })
    }
}

/// Successor resuming after `target`, or `None` when the original ends there.
fn successor_for(original: &RecurringExpense, target: YearMonth) -> Option<RecurringExpense> {
    let next_start = target.next().first_day();
    let continues = original.end_date.map_or(true, |end| next_start <= end);
    continues.then(|| {
        RecurringExpense::from_draft(Uuid::new_v4(), original.successor_draft(target.next()))
    })
}
