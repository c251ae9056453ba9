//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems:
//! the durable client storage, the backend REST API and the identity SDK.

mod backend;
mod identity;
mod storage;

pub use backend::{BackendApi, BackendError};
pub use identity::{IdentityClient, IdentityClientFactory, RedirectResponse};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
