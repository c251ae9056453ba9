//! Outbound request types

mod header;

pub use header::{AUTHORIZATION, AUTH_PROVIDER, CONTENT_TYPE, Header, Headers};
