//! Shared error, accounting and value types.

pub mod budget;
pub mod core;
pub mod error;
