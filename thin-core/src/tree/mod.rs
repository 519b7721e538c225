//! Nested value trees
//!
//! Both the configuration store and the request context keep their state as
//! `serde_json::Value` trees. This module holds the two operations every
//! tree consumer shares: the asymmetric deep merge and dot-path lookup.

mod lookup;
mod merge;

pub use lookup::{lookup, NoKey};
pub use merge::deep_merge;
