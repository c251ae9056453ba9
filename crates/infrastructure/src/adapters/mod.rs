//! Adapters for external services.

mod reqwest_backend;

pub use reqwest_backend::{API_PREFIX, ReqwestBackendClient};
