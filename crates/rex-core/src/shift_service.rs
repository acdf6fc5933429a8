//! Classification of proposed start-date changes against the record's chain.

use chrono::NaiveDate;
use rex_domain::{
    ConflictDetection, DateWindow, RecurringExpense, StartDateShift, StartDateShiftKind, YearMonth,
};
use uuid::Uuid;

use crate::{CoreError, ExpenseQuery, RecurringExpenseStore};

/// Read-only classifier. Never mutates the store.
pub struct StartDateShiftService;

impl StartDateShiftService {
    pub fn classify(
        store: &dyn RecurringExpenseStore,
        policy: ConflictDetection,
        id: Uuid,
        new_start: NaiveDate,
    ) -> Result<StartDateShift, CoreError> {
        let record = store.find_one(id)?.ok_or(CoreError::RecordNotFound(id))?;
        Self::classify_record(store, policy, &record, new_start)
    }

    /// Classifies against an already loaded record.
    pub fn classify_record(
        store: &dyn RecurringExpenseStore,
        policy: ConflictDetection,
        record: &RecurringExpense,
        new_start: NaiveDate,
    ) -> Result<StartDateShift, CoreError> {
        let current = record.start_date;
        let current_month = record.start_month_key();
        let new_month = YearMonth::from_date(new_start);

        let shift = if new_start == current {
            StartDateShift::clean(StartDateShiftKind::NoChange)
        } else if new_month == current_month {
            StartDateShift::clean(StartDateShiftKind::WithinMonth)
        } else if new_start > current {
            let tentative = match record.end_date {
                Some(end) if new_start > end => StartDateShiftKind::IncreaseSafeOutsideLimit,
                _ => StartDateShiftKind::IncreaseSafeWithinLimit,
            };
            let window = DateWindow::new(current_month.first_day(), new_month.last_day())?;
            with_conflicts(
                store,
                policy,
                record,
                window,
                tentative,
                StartDateShiftKind::IncreaseConflict,
            )?
        } else {
            let window = DateWindow::new(new_start, current_month.last_day())?;
            with_conflicts(
                store,
                policy,
                record,
                window,
                StartDateShiftKind::ReduceSafe,
                StartDateShiftKind::ReduceConflict,
            )?
        };

        tracing::debug!(
            id = %record.id,
            from = %current,
            to = %new_start,
            kind = %shift.value,
            conflicts = shift.conflicts.len(),
            "classified start date shift"
        );
        Ok(shift)
    }

    /// Siblings of `record` colliding with `window` under `policy`.
    pub fn find_conflicts(
        store: &dyn RecurringExpenseStore,
        policy: ConflictDetection,
        record: &RecurringExpense,
        window: DateWindow,
    ) -> Result<Vec<RecurringExpense>, CoreError> {
        let query = ExpenseQuery::chain_conflicts(record.id, record.chain_id, window, policy);
        Ok(store.find_many(&query)?)
    }
}

fn with_conflicts(
    store: &dyn RecurringExpenseStore,
    policy: ConflictDetection,
    record: &RecurringExpense,
    window: DateWindow,
    safe: StartDateShiftKind,
    conflict: StartDateShiftKind,
) -> Result<StartDateShift, CoreError> {
    let conflicts = StartDateShiftService::find_conflicts(store, policy, record, window)?;
    if conflicts.is_empty() {
        Ok(StartDateShift::clean(safe))
    } else {
        Ok(StartDateShift {
            value: conflict,
            conflicts,
        })
    }
}
