//! Per-application component registry
//!
//! Each application owns exactly one component per logical role. The
//! registry is a typed map from [`Role`] to the constructed instance; it is
//! owned by the application value rather than living in process-global
//! state, and components receive their collaborators by parameter instead of
//! looking each other up through ambient context.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, ThinError};

/// Logical component identity within an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The layered configuration store
    Config,
    /// The request context
    Request,
    /// The path router
    Router,
    /// The matched-route value type
    Route,
}

impl Role {
    /// Stable string form, as used in configuration keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Config => "config",
            Role::Request => "request",
            Role::Router => "router",
            Role::Route => "route",
        }
    }

    /// The configuration key naming this role's implementation binding
    pub fn binding_key(&self) -> String {
        format!("class.{}", self.as_str())
    }

    /// All roles an application resolves at startup
    pub fn all() -> [Role; 4] {
        [Role::Config, Role::Request, Role::Router, Role::Route]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed map from role to the single component instance bound to it
#[derive(Default)]
pub struct Registry {
    instances: HashMap<Role, Rc<dyn Any>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
        }
    }

    /// Register a freshly constructed component for `role`.
    ///
    /// Fails with [`ThinError::DuplicateInstance`] when the role is already
    /// bound; a second live instance would break the one-per-role invariant.
    pub fn register<T: 'static>(&mut self, role: Role, instance: T) -> Result<Rc<T>> {
        if self.instances.contains_key(&role) {
            return Err(ThinError::DuplicateInstance { role });
        }
        let shared = Rc::new(instance);
        self.instances.insert(role, shared.clone());
        log::debug!("registered component for role '{}'", role);
        Ok(shared)
    }

    /// Get the instance bound to `role`.
    ///
    /// Returns `None` when the role is vacant or bound to a different
    /// concrete type.
    pub fn get<T: 'static>(&self, role: Role) -> Option<Rc<T>> {
        self.instances
            .get(&role)
            .cloned()
            .and_then(|shared| shared.downcast::<T>().ok())
    }

    /// Return the instance bound to `role`, constructing it on first access.
    ///
    /// Fails with [`ThinError::DuplicateInstance`] when the role is bound to
    /// an instance of a different concrete type.
    pub fn get_or_register<T, F>(&mut self, role: Role, init: F) -> Result<Rc<T>>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.instances.get(&role) {
            return existing
                .clone()
                .downcast::<T>()
                .map_err(|_| ThinError::DuplicateInstance { role });
        }
        self.register(role, init())
    }

    /// Whether `role` has a bound instance
    pub fn contains(&self, role: Role) -> bool {
        self.instances.contains_key(&role)
    }

    /// Number of bound roles
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no role is bound yet
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Refuse to hand out an extra owner for the component bound to `role`.
    ///
    /// Registered components are per-application singletons; duplicating one
    /// would leave two live instances behind the same role.
    pub fn duplicate(&self, role: Role) -> Result<Rc<dyn Any>> {
        Err(ThinError::CloneNotSupported { role })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("roles", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}
