//! rex-core
//!
//! Temporal engine for recurring expenses: deletion modes, start-date shift
//! classification, history-preserving edits and monthly projections.
//! Depends on rex-domain. Persistence is reached only through
//! [`RecurringExpenseStore`].

pub mod deletion_service;
pub mod diagnostics;
pub mod edit_service;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod projection_service;
pub mod shift_service;
pub mod storage;
pub mod validation;

pub use deletion_service::*;
pub use diagnostics::chain_warnings;
pub use edit_service::*;
pub use error::{CoreError, StoreError};
pub use lifecycle::ExpenseLifecycle;
pub use memory::MemoryExpenseStore;
pub use projection_service::*;
pub use shift_service::*;
pub use storage::{ExpenseFilter, ExpenseQuery, Mutation, MutationOutcome, RecurringExpenseStore};

#[cfg(test)]
mod tests;
