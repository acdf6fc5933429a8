//! Month-by-month expansion of recurring expenses.

use std::collections::BTreeMap;

use rex_domain::{RecurringExpense, YearMonth};
use serde::Serialize;
use uuid::Uuid;

use crate::CoreError;

/// Sum of every record billed in `month` for one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub currency: String,
    pub total: f64,
    pub records: Vec<Uuid>,
}

/// Per-employee portion of an organization expense flagged for splitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitShare {
    pub id: Uuid,
    pub currency: String,
    pub value: f64,
    pub employees: u32,
    pub share: f64,
}

pub struct ProjectionService;

impl ProjectionService {
    /// Expands `records` into the months of `[from, to]` they cover, grouped by
    /// month then currency.
    pub fn monthly_totals(
        records: &[RecurringExpense],
        from: YearMonth,
        to: YearMonth,
    ) -> Vec<MonthlyTotal> {
        let mut buckets: BTreeMap<(YearMonth, String), MonthlyTotal> = BTreeMap::new();
        for record in records {
            let first = record.start_month_key().max(from);
            let last = record.end_month_key().map_or(to, |end| end.min(to));
            for month in first.iter_through(last) {
                let entry = buckets
                    .entry((month, record.currency.clone()))
                    .or_insert_with(|| MonthlyTotal {
                        month,
                        currency: record.currency.clone(),
                        total: 0.0,
                        records: Vec::new(),
                    });
                entry.total += record.value;
                entry.records.push(record.id);
            }
        }
        buckets
            .into_values()
            .map(|mut total| {
                total.total = round_cents(total.total);
                total
            })
            .collect()
    }

    /// Share of a split expense for each of `among` employees, in cents.
    pub fn split_share(amount: f64, among: u32) -> Result<f64, CoreError> {
        if among == 0 {
            return Err(CoreError::Validation(
                "cannot split an expense among zero employees".into(),
            ));
        }
        Ok(round_cents(amount / f64::from(among)))
    }

    /// Splits `record` among `employees`. Only records created with the split
    /// flag can be shared.
    pub fn share_of(record: &RecurringExpense, employees: u32) -> Result<SplitShare, CoreError> {
        if !record.split_expense {
            return Err(CoreError::InvalidOperation(format!(
                "recurring expense {} is not split among employees",
                record.id
            )));
        }
        Ok(SplitShare {
            id: record.id,
            currency: record.currency.clone(),
            value: record.value,
            employees,
            share: Self::split_share(record.value, employees)?,
        })
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
