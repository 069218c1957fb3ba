//! Session-scoped service registry
//!
//! Components are wired together through an explicit container built once
//! per game session and passed by handle, instead of ambient global state.
//! One registration per service per session; `clear` on session teardown.

use crate::error::{AiError, Result};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

/// Typed service container with one instance per type
///
/// Services are usually `Rc` handles so `get` can hand out cheap clones.
#[derive(Default)]
pub struct ServiceRegistry {
    services: FxHashMap<TypeId, Box<dyn Any>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry {
            services: FxHashMap::default(),
        }
    }

    /// Register a service. A second registration of the same type within
    /// one session is a configuration error.
    pub fn register<T: 'static>(&mut self, service: T) -> Result<()> {
        let key = TypeId::of::<T>();
        if self.services.contains_key(&key) {
            return Err(AiError::Configuration(format!(
                "service already registered: {}",
                std::any::type_name::<T>()
            )));
        }
        self.services.insert(key, Box::new(service));
        Ok(())
    }

    /// Resolve a service by type, cloning the stored handle.
    pub fn get<T: 'static + Clone>(&self) -> Result<T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
            .ok_or_else(|| {
                AiError::Configuration(format!(
                    "service not registered: {}",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Resolve an optional service; absence is not an error.
    pub fn try_get<T: 'static + Clone>(&self) -> Option<T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Drop every registration (scene/session teardown).
    pub fn clear(&mut self) {
        self.services.clear();
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
