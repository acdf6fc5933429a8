use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use rex_domain::{RecurringExpense, RecurringExpensePatch};
use uuid::Uuid;

use crate::{
    storage::{apply_to_map, select, stage_batch},
    ExpenseQuery, Mutation, MutationOutcome, RecurringExpenseStore, StoreError,
};

/// In-process store. Batches are staged on a copy and swapped in at once.
#[derive(Debug, Default)]
pub struct MemoryExpenseStore {
    records: Mutex<BTreeMap<Uuid, RecurringExpense>>,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = RecurringExpense>) -> Self {
        let map = records.into_iter().map(|record| (record.id, record)).collect();
        Self {
            records: Mutex::new(map),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<Uuid, RecurringExpense>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl RecurringExpenseStore for MemoryExpenseStore {
    fn find_one(&self, id: Uuid) -> Result<Option<RecurringExpense>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    fn find_many(&self, query: &ExpenseQuery) -> Result<Vec<RecurringExpense>, StoreError> {
        Ok(select(self.lock()?.values(), query))
    }

    fn create(&self, record: RecurringExpense) -> Result<RecurringExpense, StoreError> {
        let mut records = self.lock()?;
        apply_to_map(&mut records, Mutation::Create(record)).map(MutationOutcome::into_record)
    }

    fn update(
        &self,
        id: Uuid,
        patch: &RecurringExpensePatch,
    ) -> Result<RecurringExpense, StoreError> {
        let mutation = Mutation::Update {
            id,
            patch: patch.clone(),
        };
        let mut records = self.lock()?;
        apply_to_map(&mut records, mutation).map(MutationOutcome::into_record)
    }

    fn delete(&self, id: Uuid) -> Result<RecurringExpense, StoreError> {
        let mut records = self.lock()?;
        apply_to_map(&mut records, Mutation::Delete(id)).map(MutationOutcome::into_record)
    }

    fn apply_batch(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, StoreError> {
        let mut records = self.lock()?;
        let (staged, outcomes) = stage_batch(&records, mutations)?;
        *records = staged;
        Ok(outcomes)
    }
}
