//! SystemLink API model types.

mod auth;
pub mod batch;
mod feed;
mod product;

pub use auth::*;
pub use batch::{BatchResponse, Correlate, DeleteResponse};
pub use feed::*;
pub use product::*;
