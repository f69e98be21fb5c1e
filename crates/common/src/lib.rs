//! Identifier newtypes shared by the store, messaging and domain crates.

mod types;

pub use types::{AggregateId, TenantId};
