//! Deterministic JSON serialization for files this client writes.
//!
//! Output uses sorted keys (via `BTreeMap`), 2-space indentation and a
//! trailing newline, so the storage file diffs cleanly between writes.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable_bytes};
