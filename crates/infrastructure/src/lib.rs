//! BeeTime Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the reqwest backend client and the
//! file-backed client storage.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::{API_PREFIX, ReqwestBackendClient};
pub use persistence::FileStorage;
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
