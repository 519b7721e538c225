//! Error types for application wiring
//!
//! The failure surface is deliberately small: every lookup operation
//! (configuration, request data, route matching) is total and reports
//! absence as `None`. The only errors are wiring mistakes made while
//! assembling an application, and both should abort initialization.

use thiserror::Error;

use crate::registry::Role;

/// Result type alias for wiring operations
pub type Result<T> = std::result::Result<T, ThinError>;

/// Errors raised while assembling an application
#[derive(Error, Debug)]
pub enum ThinError {
    /// A second component was constructed for a role that already has one
    #[error("Duplicate instance for role '{role}'. An application holds at most one component per role.")]
    DuplicateInstance { role: Role },

    /// A registered component was asked to hand out a second owner
    #[error("Can't clone the '{role}' component. Registered components are per-application singletons.")]
    CloneNotSupported { role: Role },
}
