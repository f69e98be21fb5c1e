pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{AggregateId, TenantId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use record::{Entity, EntityRecord};
pub use store::{Change, ChangeSet, EntityStore, EntityStoreExt};
