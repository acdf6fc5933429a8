//! rex-domain
//!
//! Pure domain models for recurring expenses: records, owners, month math and
//! the classification vocabulary shared by the engine crates.
//! No I/O, no storage. Only data types and core enums.

pub mod expense;
pub mod month;
pub mod shift;

pub use expense::*;
pub use month::*;
pub use shift::*;
