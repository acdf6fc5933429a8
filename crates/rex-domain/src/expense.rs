//! Recurring expense records and the owner reference they belong to.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::month::YearMonth;

/// Identifies whose expense a record is. Exactly one side is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ExpenseOwner {
    Employee(Uuid),
    Organization(Uuid),
}

impl ExpenseOwner {
    pub fn employee_id(&self) -> Option<Uuid> {
        match self {
            ExpenseOwner::Employee(id) => Some(*id),
            ExpenseOwner::Organization(_) => None,
        }
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            ExpenseOwner::Organization(id) => Some(*id),
            ExpenseOwner::Employee(_) => None,
        }
    }

    pub fn is_organization(&self) -> bool {
        matches!(self, ExpenseOwner::Organization(_))
    }
}

/// One calendar-anchored slice of a logical recurring expense.
///
/// `start_date` is always the first day of the start month. `end_date`, when
/// present, is the first day of the last month the record covers; `None`
/// means the record continues indefinitely. Records sharing a `chain_id`
/// describe the same logical expense across time and must not overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub id: Uuid,
    pub chain_id: Uuid,
    pub owner: ExpenseOwner,
    pub category_name: String,
    pub value: f64,
    pub currency: String,
    #[serde(default)]
    pub split_expense: bool,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringExpense {
    /// Materializes a new chain root: the record is its own lineage.
    pub fn root(mut draft: NewRecurringExpense) -> Self {
        draft.chain_id = None;
        Self::from_draft(Uuid::new_v4(), draft)
    }

    /// Materializes a record under `id`. Drafts without a `chain_id` start a
    /// new chain rooted at `id`.
    pub fn from_draft(id: Uuid, draft: NewRecurringExpense) -> Self {
        let now = Utc::now();
        Self {
            id,
            chain_id: draft.chain_id.unwrap_or(id),
            owner: draft.owner,
            category_name: draft.category_name,
            value: draft.value,
            currency: draft.currency,
            split_expense: draft.split_expense,
            start_date: draft.start.first_day(),
            end_date: draft.end.map(YearMonth::first_day),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_chain_root(&self) -> bool {
        self.chain_id == self.id
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn start_month_key(&self) -> YearMonth {
        YearMonth::from_date(self.start_date)
    }

    pub fn end_month_key(&self) -> Option<YearMonth> {
        self.end_date.map(YearMonth::from_date)
    }

    pub fn start_year(&self) -> i32 {
        self.start_date.year()
    }

    pub fn start_month(&self) -> u32 {
        self.start_date.month()
    }

    pub fn start_day(&self) -> u32 {
        self.start_date.day()
    }

    pub fn end_year(&self) -> Option<i32> {
        self.end_date.map(|date| date.year())
    }

    pub fn end_month(&self) -> Option<u32> {
        self.end_date.map(|date| date.month())
    }

    pub fn end_day(&self) -> Option<u32> {
        self.end_date.map(|date| date.day())
    }

    /// True when the record is billed in `month`.
    pub fn covers(&self, month: YearMonth) -> bool {
        month >= self.start_month_key() && self.end_month_key().map_or(true, |end| month <= end)
    }

    /// Draft for a successor that continues this record from `start`, keeping
    /// the lineage, owner, amounts and original end.
    pub fn successor_draft(&self, start: YearMonth) -> NewRecurringExpense {
        NewRecurringExpense {
            owner: self.owner,
            category_name: self.category_name.clone(),
            value: self.value,
            currency: self.currency.clone(),
            split_expense: self.split_expense,
            start,
            end: self.end_month_key(),
            chain_id: Some(self.chain_id),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Input for creating a record. `chain_id` is left empty for new chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecurringExpense {
    pub owner: ExpenseOwner,
    pub category_name: String,
    pub value: f64,
    pub currency: String,
    #[serde(default)]
    pub split_expense: bool,
    pub start: YearMonth,
    #[serde(default)]
    pub end: Option<YearMonth>,
    #[serde(default)]
    pub chain_id: Option<Uuid>,
}

impl NewRecurringExpense {
    pub fn new(
        owner: ExpenseOwner,
        category_name: impl Into<String>,
        value: f64,
        currency: impl Into<String>,
        start: YearMonth,
    ) -> Self {
        Self {
            owner,
            category_name: category_name.into(),
            value,
            currency: currency.into(),
            split_expense: false,
            start,
            end: None,
            chain_id: None,
        }
    }

    pub fn ending(mut self, end: YearMonth) -> Self {
        self.end = Some(end);
        self
    }

    pub fn split(mut self) -> Self {
        self.split_expense = true;
        self
    }
}

/// Partial update applied by the store. `None` leaves a field untouched;
/// `end_date: Some(None)` clears the end and reopens the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpensePatch {
    pub category_name: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl RecurringExpensePatch {
    /// Patch capping the record at `last_month`.
    pub fn end_at(last_month: YearMonth) -> Self {
        Self {
            end_date: Some(Some(last_month.first_day())),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, record: &mut RecurringExpense) {
        if let Some(category) = &self.category_name {
            record.category_name = category.clone();
        }
        if let Some(value) = self.value {
            record.value = value;
        }
        if let Some(currency) = &self.currency {
            record.currency = currency.clone();
        }
        if let Some(start) = self.start_date {
            record.start_date = start;
        }
        if let Some(end) = self.end_date {
            record.end_date = end;
        }
        record.touch();
    }
}
