//! Folio Domain Layer
//!
//! Entities and validated value objects for the single tracked portfolio.
//! No I/O, no storage concerns.

#![warn(clippy::all)]

pub mod holding;
pub mod value_objects;

pub use holding::Holding;
pub use value_objects::{DomainError, Price, Return, Ticker, Weight};
