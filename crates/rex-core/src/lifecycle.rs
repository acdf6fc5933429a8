//! Entry point used by command handlers to create, edit and delete recurring
//! expenses over a single store.

use chrono::NaiveDate;
use rex_domain::{
    ConflictDetection, DateWindow, ExpenseOwner, NewRecurringExpense, RecurringExpense,
    StartDateShift, YearMonth,
};
use uuid::Uuid;

use crate::{
    diagnostics, validation::validate_draft, CoreError, DeletionOutcome, DeletionRequest,
    DeletionService, EditOutcome, EditService, ExpenseEdit, ExpenseFilter, ExpenseQuery,
    MonthlyTotal, ProjectionService, RecurringExpenseStore, SplitShare, StartDateShiftService,
};

pub struct ExpenseLifecycle {
    store: Box<dyn RecurringExpenseStore>,
    conflict_detection: ConflictDetection,
}

impl ExpenseLifecycle {
    pub fn new(store: Box<dyn RecurringExpenseStore>) -> Self {
        Self {
            store,
            conflict_detection: ConflictDetection::default(),
        }
    }

    pub fn with_conflict_detection(mut self, policy: ConflictDetection) -> Self {
        self.conflict_detection = policy;
        self
    }

    pub fn conflict_detection(&self) -> ConflictDetection {
        self.conflict_detection
    }

    pub fn store(&self) -> &dyn RecurringExpenseStore {
        self.store.as_ref()
    }

    /// Creates a new chain root.
    pub fn create(&self, draft: NewRecurringExpense) -> Result<RecurringExpense, CoreError> {
        let draft = validate_draft(draft)?;
        let record = self.store.create(RecurringExpense::root(draft))?;
        tracing::info!(
            id = %record.id,
            owner = ?record.owner,
            start = %record.start_month_key(),
            "created recurring expense"
        );
        Ok(record)
    }

    pub fn find(&self, id: Uuid) -> Result<RecurringExpense, CoreError> {
        self.store.find_one(id)?.ok_or(CoreError::RecordNotFound(id))
    }

    pub fn list(&self) -> Result<Vec<RecurringExpense>, CoreError> {
        Ok(self.store.find_many(&ExpenseQuery::all())?)
    }

    /// Every record of `chain_id`, ordered by start date.
    pub fn chain(&self, chain_id: Uuid) -> Result<Vec<RecurringExpense>, CoreError> {
        Ok(self.store.find_many(&ExpenseQuery::chain(chain_id))?)
    }

    pub fn delete_by_mode(
        &self,
        id: Uuid,
        request: DeletionRequest,
    ) -> Result<DeletionOutcome, CoreError> {
        DeletionService::delete_by_mode(self.store(), id, request)
    }

    pub fn classify_start_date_shift(
        &self,
        id: Uuid,
        new_start: NaiveDate,
    ) -> Result<StartDateShift, CoreError> {
        StartDateShiftService::classify(self.store(), self.conflict_detection, id, new_start)
    }

    pub fn edit(&self, id: Uuid, edit: ExpenseEdit) -> Result<EditOutcome, CoreError> {
        EditService::edit(self.store(), self.conflict_detection, id, edit)
    }

    /// Records billed on at least one day of `window`, optionally for one owner.
    pub fn active_between(
        &self,
        owner: Option<ExpenseOwner>,
        window: DateWindow,
    ) -> Result<Vec<RecurringExpense>, CoreError> {
        let query = ExpenseQuery::active_in(ExpenseFilter::default().owned_by(owner), window);
        let records = self.store.find_many(&query)?;
        tracing::debug!(count = records.len(), ?window, "loaded active recurring expenses");
        Ok(records)
    }

    pub fn monthly_totals(
        &self,
        owner: Option<ExpenseOwner>,
        from: YearMonth,
        to: YearMonth,
    ) -> Result<Vec<MonthlyTotal>, CoreError> {
        let window = DateWindow::for_months(from, to)?;
        let records = self.active_between(owner, window)?;
        Ok(ProjectionService::monthly_totals(&records, from, to))
    }

    /// Each employee's share of a split organization expense.
    pub fn split_share(&self, id: Uuid, employees: u32) -> Result<SplitShare, CoreError> {
        let record = self.find(id)?;
        let share = ProjectionService::share_of(&record, employees)?;
        tracing::debug!(id = %id, employees, share = share.share, "computed split share");
        Ok(share)
    }

    pub fn chain_warnings(&self, chain_id: Uuid) -> Result<Vec<String>, CoreError> {
        Ok(diagnostics::chain_warnings(&self.chain(chain_id)?))
    }
}
