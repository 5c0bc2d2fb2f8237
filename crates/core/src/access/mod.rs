//! Access-control engine: rank resolution, grant mutation, and the store
//! contract both run against.

pub mod deadline;
pub mod error;
pub mod mutator;
pub mod resolver;
pub mod store;

pub use deadline::Deadline;
pub use error::{AccessError, CheckTarget, StoreError};
pub use mutator::RightsMutator;
pub use resolver::{prefer_direct, RightsResolver};
pub use store::{AccessStore, GrantStore, ResourceStore, UnitOfWork};
