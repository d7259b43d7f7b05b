//! Entity registry and deferred-binding handles
//!
//! Reference checkers and the entities they target are mutually
//! dependent: the checker needs the entity's capabilities, and the
//! entity's own schema may contain reference checkers. The registry
//! breaks the cycle - handles are created up front by name and resolve
//! lazily at call time, so both sides can be defined and registered in
//! any order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::checker::{CheckError, CheckResult};

use super::binding::EntityBinding;

/// In-memory registry of entity bindings, indexed by entity name.
///
/// Registration happens once per entity at schema-definition time;
/// lookups afterwards are read-only, so concurrent validation and decode
/// need no coordination.
#[derive(Default)]
pub struct EntityRegistry {
    bindings: RwLock<HashMap<String, Arc<dyn EntityBinding>>>,
}

impl EntityRegistry {
    /// Creates an empty registry, shared behind an `Arc` so handles can
    /// hold on to it.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers an entity binding under its own name.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::AlreadyRegistered` if a binding with the
    /// same name exists; registered bindings are immutable.
    pub fn register(&self, binding: Arc<dyn EntityBinding>) -> CheckResult<()> {
        let name = binding.name().to_string();
        // Recover from a poisoned lock: the map is never left in a
        // partially-updated state by any operation here.
        let mut bindings = self.bindings.write().unwrap_or_else(|e| e.into_inner());
        if bindings.contains_key(&name) {
            return Err(CheckError::AlreadyRegistered { name });
        }
        bindings.insert(name, binding);
        Ok(())
    }

    /// Looks up a binding by entity name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn EntityBinding>> {
        self.bindings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Whether an entity name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Creates a lazily-resolved handle to an entity by name.
    ///
    /// The named entity need not be registered yet; resolution happens
    /// at validation/decode time.
    pub fn handle(self: &Arc<Self>, name: impl Into<String>) -> EntityHandle {
        EntityHandle {
            name: name.into(),
            registry: Arc::clone(self),
        }
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .bindings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        f.debug_struct("EntityRegistry")
            .field("entities", &names)
            .finish()
    }
}

/// A deferred-binding reference to a registered entity.
///
/// Held by reference checkers; cloning is cheap (name plus a registry
/// handle).
#[derive(Clone)]
pub struct EntityHandle {
    name: String,
    registry: Arc<EntityRegistry>,
}

impl EntityHandle {
    /// The target entity's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the handle against the registry.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::UnknownEntity` if the name was never
    /// registered.
    pub fn resolve(&self) -> CheckResult<Arc<dyn EntityBinding>> {
        self.registry
            .get(&self.name)
            .ok_or_else(|| CheckError::unknown_entity(&self.name))
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityHandle").field(&self.name).finish()
    }
}
