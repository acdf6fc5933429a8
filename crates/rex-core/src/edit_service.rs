//! History-preserving edits of recurring expenses.

use chrono::NaiveDate;
use rex_domain::{
    ConflictDetection, RecurringExpense, RecurringExpensePatch, StartDateShiftKind, YearMonth,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    validation::{check_value, normalize_category, normalize_currency},
    CoreError, Mutation, MutationOutcome, RecurringExpenseStore, StartDateShiftService,
};

/// Requested changes. `start_date` is the month the new values take effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEdit {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl ExpenseEdit {
    pub fn effective_from(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            value: None,
            category_name: None,
            currency: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    fn value_patch(&self) -> Result<RecurringExpensePatch, CoreError> {
        Ok(RecurringExpensePatch {
            value: self.value.map(check_value).transpose()?,
            category_name: self
                .category_name
                .as_deref()
                .map(normalize_category)
                .transpose()?,
            currency: self.currency.as_deref().map(normalize_currency).transpose()?,
            ..RecurringExpensePatch::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// The record kept its window and took the new values.
    Updated { record: RecurringExpense },
    /// Earlier months keep the old values in `truncated`; `successor` carries
    /// the new values from the requested month on.
    Split {
        truncated: RecurringExpense,
        successor: RecurringExpense,
    },
    /// The record now starts earlier.
    Extended { record: RecurringExpense },
}

pub struct EditService;

impl EditService {
    pub fn edit(
        store: &dyn RecurringExpenseStore,
        policy: ConflictDetection,
        id: Uuid,
        edit: ExpenseEdit,
    ) -> Result<EditOutcome, CoreError> {
        let patch = edit.value_patch()?;
        let record = store.find_one(id)?.ok_or(CoreError::RecordNotFound(id))?;
        let shift = StartDateShiftService::classify_record(store, policy, &record, edit.start_date)?;

        match shift.value {
            StartDateShiftKind::NoChange | StartDateShiftKind::WithinMonth => {
                let record = store.update(id, &patch)?;
                tracing::info!(id = %id, "updated recurring expense in place");
                Ok(EditOutcome::Updated { record })
            }
            StartDateShiftKind::IncreaseSafeWithinLimit => {
                Self::split_from(store, &record, YearMonth::from_date(edit.start_date), &patch)
            }
            StartDateShiftKind::ReduceSafe => {
                let patch = RecurringExpensePatch {
                    start_date: Some(YearMonth::from_date(edit.start_date).first_day()),
                    ..patch
                };
                let record = store.update(id, &patch)?;
                tracing::info!(id = %id, start = %record.start_date, "moved recurring expense start back");
                Ok(EditOutcome::Extended { record })
            }
            StartDateShiftKind::IncreaseSafeOutsideLimit => {
                tracing::warn!(id = %id, start = %edit.start_date, "edit starts after record end");
                Err(CoreError::InvalidOperation(format!(
                    "new start {} is after the end of recurring expense {id}",
                    edit.start_date
                )))
            }
            StartDateShiftKind::IncreaseConflict | StartDateShiftKind::ReduceConflict => {
                let conflicts: Vec<Uuid> = shift.conflicts.iter().map(|record| record.id).collect();
                tracing::warn!(id = %id, kind = %shift.value, ?conflicts, "edit refused");
                Err(CoreError::StartDateConflict {
                    kind: shift.value,
                    conflicts,
                })
            }
        }
    }

    /// Ends `record` the month before `from` and continues it with `patch`
    /// applied, as one batch.
    fn split_from(
        store: &dyn RecurringExpenseStore,
        record: &RecurringExpense,
        from: YearMonth,
        patch: &RecurringExpensePatch,
    ) -> Result<EditOutcome, CoreError> {
        let mut successor = RecurringExpense::from_draft(Uuid::new_v4(), record.successor_draft(from));
        patch.apply(&mut successor);

        let outcomes = store.apply_batch(vec![
            Mutation::Update {
                id: record.id,
                patch: RecurringExpensePatch::end_at(from.previous()),
            },
            Mutation::Create(successor),
        ])?;
        let mut records = outcomes.into_iter().map(MutationOutcome::into_record);
        match (records.next(), records.next()) {
            (Some(truncated), Some(successor)) => {
                tracing::info!(
                    id = %record.id,
                    successor = %successor.id,
                    from = %from,
                    "split recurring expense for edit"
                );
                Ok(EditOutcome::Split {
                    truncated,
                    successor,
                })
            }
            _ => Err(CoreError::InvalidOperation(
                "store returned an incomplete batch result".into(),
            )),
        }
    }
}
