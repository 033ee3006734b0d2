//! Trait definitions for SystemLink operations.
//!
//! Entity types implement the traits their endpoints support.

mod get;
mod list;

pub use get::Get;
pub use list::{List, ListSource};
