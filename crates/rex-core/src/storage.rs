//! Persistence contract consumed by the engine.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rex_domain::{
    ConflictDetection, DateWindow, ExpenseOwner, RecurringExpense, RecurringExpensePatch,
};
use uuid::Uuid;

use crate::StoreError;

/// Conjunction of optional constraints. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub chain_id: Option<Uuid>,
    pub exclude_id: Option<Uuid>,
    pub owner: Option<ExpenseOwner>,
    pub start_within: Option<DateWindow>,
    pub end_within: Option<DateWindow>,
    pub start_on_or_before: Option<NaiveDate>,
    pub end_on_or_after: Option<NaiveDate>,
    pub open_ended: Option<bool>,
}

impl ExpenseFilter {
    /// Siblings of `exclude_id` in `chain_id`.
    pub fn siblings(chain_id: Uuid, exclude_id: Uuid) -> Self {
        Self {
            chain_id: Some(chain_id),
            exclude_id: Some(exclude_id),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owner: Option<ExpenseOwner>) -> Self {
        self.owner = owner;
        self
    }

    pub fn matches(&self, record: &RecurringExpense) -> bool {
        if self.chain_id.is_some_and(|chain| record.chain_id != chain) {
            return false;
        }
        if self.exclude_id.is_some_and(|id| record.id == id) {
            return false;
        }
        if self.owner.is_some_and(|owner| record.owner != owner) {
            return false;
        }
        if let Some(window) = self.start_within {
            if !window.contains(record.start_date) {
                return false;
            }
        }
        if let Some(window) = self.end_within {
            match record.end_date {
                Some(end) if window.contains(end) => {}
                _ => return false,
            }
        }
        if self.start_on_or_before.is_some_and(|limit| record.start_date > limit) {
            return false;
        }
        if let Some(limit) = self.end_on_or_after {
            match record.end_date {
                Some(end) if end >= limit => {}
                _ => return false,
            }
        }
        if self.open_ended.is_some_and(|open| record.is_open_ended() != open) {
            return false;
        }
        true
    }
}

/// Disjunction of [`ExpenseFilter`]s. A record matches when any filter does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseQuery {
    pub any_of: Vec<ExpenseFilter>,
}

impl ExpenseQuery {
    pub fn all() -> Self {
        Self::from(ExpenseFilter::default())
    }

    pub fn chain(chain_id: Uuid) -> Self {
        Self::from(ExpenseFilter {
            chain_id: Some(chain_id),
            ..ExpenseFilter::default()
        })
    }

    /// Records active on at least one day of `window`: started on or before
    /// its end, and either ending on or after its start or open-ended.
    pub fn active_in(base: ExpenseFilter, window: DateWindow) -> Self {
        let bounded = ExpenseFilter {
            start_on_or_before: Some(window.end),
            end_on_or_after: Some(window.start),
            ..base.clone()
        };
        let open = ExpenseFilter {
            start_on_or_before: Some(window.end),
            open_ended: Some(true),
            ..base
        };
        Self {
            any_of: vec![bounded, open],
        }
    }

    /// Siblings of `exclude_id` in `chain_id` that collide with `window`
    /// under `policy`.
    pub fn chain_conflicts(
        exclude_id: Uuid,
        chain_id: Uuid,
        window: DateWindow,
        policy: ConflictDetection,
    ) -> Self {
        let siblings = ExpenseFilter::siblings(chain_id, exclude_id);
        match policy {
            ConflictDetection::EndpointInWindow => Self {
                any_of: vec![
                    ExpenseFilter {
                        start_within: Some(window),
                        ..siblings.clone()
                    },
                    ExpenseFilter {
                        end_within: Some(window),
                        ..siblings
                    },
                ],
            },
            ConflictDetection::IntervalOverlap => Self::active_in(siblings, window),
        }
    }

    pub fn matches(&self, record: &RecurringExpense) -> bool {
        self.any_of.iter().any(|filter| filter.matches(record))
    }
}

impl From<ExpenseFilter> for ExpenseQuery {
    fn from(filter: ExpenseFilter) -> Self {
        Self {
            any_of: vec![filter],
        }
    }
}

/// One step of an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(RecurringExpense),
    Update {
        id: Uuid,
        patch: RecurringExpensePatch,
    },
    Delete(Uuid),
}

/// Result of a single applied [`Mutation`].
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created(RecurringExpense),
    Updated(RecurringExpense),
    Deleted(RecurringExpense),
}

impl MutationOutcome {
    pub fn record(&self) -> &RecurringExpense {
        match self {
            MutationOutcome::Created(record)
            | MutationOutcome::Updated(record)
            | MutationOutcome::Deleted(record) => record,
        }
    }

    pub fn into_record(self) -> RecurringExpense {
        match self {
            MutationOutcome::Created(record)
            | MutationOutcome::Updated(record)
            | MutationOutcome::Deleted(record) => record,
        }
    }
}

/// Abstraction over persistence backends holding recurring expense records.
///
/// Single mutations must be atomic. `apply_batch` is the multi-mutation
/// capability: backends that can commit several mutations at once override
/// it; the default applies them one after the other and may stop half-way.
pub trait RecurringExpenseStore: Send + Sync {
    fn find_one(&self, id: Uuid) -> Result<Option<RecurringExpense>, StoreError>;
    fn find_many(&self, query: &ExpenseQuery) -> Result<Vec<RecurringExpense>, StoreError>;
    fn create(&self, record: RecurringExpense) -> Result<RecurringExpense, StoreError>;
    fn update(
        &self,
        id: Uuid,
        patch: &RecurringExpensePatch,
    ) -> Result<RecurringExpense, StoreError>;
    fn delete(&self, id: Uuid) -> Result<RecurringExpense, StoreError>;

    fn apply_batch(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, StoreError> {
        let mut outcomes = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            let outcome = match mutation {
                Mutation::Create(record) => MutationOutcome::Created(self.create(record)?),
                Mutation::Update { id, patch } => MutationOutcome::Updated(self.update(id, &patch)?),
                Mutation::Delete(id) => MutationOutcome::Deleted(self.delete(id)?),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// Applies `mutation` to an in-memory record map. Shared by map-backed stores
/// so single mutations and staged batches follow the same rules.
pub fn apply_to_map(
    records: &mut BTreeMap<Uuid, RecurringExpense>,
    mutation: Mutation,
) -> Result<MutationOutcome, StoreError> {
    match mutation {
        Mutation::Create(record) => {
            if records.contains_key(&record.id) {
                return Err(StoreError::Duplicate(record.id));
            }
            records.insert(record.id, record.clone());
            Ok(MutationOutcome::Created(record))
        }
        Mutation::Update { id, patch } => {
            let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            patch.apply(record);
            Ok(MutationOutcome::Updated(record.clone()))
        }
        Mutation::Delete(id) => records
            .remove(&id)
            .map(MutationOutcome::Deleted)
            .ok_or(StoreError::NotFound(id)),
    }
}

/// Stages `mutations` on a copy of `records`, returning the new map only when
/// every mutation succeeded.
pub fn stage_batch(
    records: &BTreeMap<Uuid, RecurringExpense>,
    mutations: Vec<Mutation>,
) -> Result<(BTreeMap<Uuid, RecurringExpense>, Vec<MutationOutcome>), StoreError> {
    let mut staged = records.clone();
    let mut outcomes = Vec::with_capacity(mutations.len());
    for mutation in mutations {
        outcomes.push(apply_to_map(&mut staged, mutation)?);
    }
    Ok((staged, outcomes))
}

/// Filters `records` by `query`, ordered by start date then id.
pub fn select<'a>(
    records: impl IntoIterator<Item = &'a RecurringExpense>,
    query: &ExpenseQuery,
) -> Vec<RecurringExpense> {
    let mut found: Vec<RecurringExpense> = records
        .into_iter()
        .filter(|record| query.matches(record))
        .cloned()
        .collect();
    found.sort_by_key(|record| (record.start_date, record.id));
    found
}
