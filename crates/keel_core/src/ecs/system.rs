// system.rs - Priority-ordered per-frame systems
//
// Lower priority runs first. Equal priorities run in registration order.

use crate::ecs::{ComponentError, EntityRegistry, SystemRegistrationError};
use keel_metrics::{time_phase, PhaseProfiler};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error("{0}")]
    Message(String),
}

/// A system failed during `update`.
#[derive(Debug, Error)]
#[error("system '{name}' failed: {source}")]
pub struct SystemRunError {
    pub name: String,
    #[source]
    pub source: SystemError,
}

/// A per-frame unit of game logic.
pub trait System {
    /// Scheduling priority; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Called once, at registration.
    fn init(&mut self, _registry: &mut EntityRegistry) -> Result<(), SystemError> {
        Ok(())
    }

    fn update(&mut self, registry: &mut EntityRegistry, ts: Duration) -> Result<(), SystemError>;
}

/// Registration-order id of a system. Breaks ties between equal priorities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemHandle(u32);

impl SystemHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

struct RegisteredSystem {
    handle: SystemHandle,
    name: String,
    priority: i32,
    system: Box<dyn System>,
}

/// Systems keyed by unique name, run in `(priority, handle)` order.
#[derive(Default)]
pub struct SystemRegistry {
    systems: Vec<RegisteredSystem>,
    name_lookup: HashMap<String, SystemHandle>,
    next_handle: u32,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and initialise a system. The priority is read once here.
    pub fn register(
        &mut self,
        name: &str,
        mut system: Box<dyn System>,
        registry: &mut EntityRegistry,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        if self.name_lookup.contains_key(name) {
            return Err(SystemRegistrationError::DuplicateName {
                name: name.to_string(),
            });
        }

        system
            .init(registry)
            .map_err(|source| SystemRegistrationError::Init {
                name: name.to_string(),
                source,
            })?;

        let handle = SystemHandle(self.next_handle);
        self.next_handle += 1;
        let priority = system.priority();

        let position = self
            .systems
            .partition_point(|existing| (existing.priority, existing.handle) <= (priority, handle));
        self.systems.insert(
            position,
            RegisteredSystem {
                handle,
                name: name.to_string(),
                priority,
                system,
            },
        );
        self.name_lookup.insert(name.to_string(), handle);
        tracing::debug!(system = name, priority, %handle, "system registered");
        Ok(handle)
    }

    /// Run every system once, in order. Stops at the first failure.
    pub fn update_all(
        &mut self,
        registry: &mut EntityRegistry,
        ts: Duration,
        profiler: &mut PhaseProfiler,
    ) -> Result<(), SystemRunError> {
        for entry in &mut self.systems {
            let system = &mut entry.system;
            time_phase!(profiler, &entry.name, { system.update(registry, ts) }).map_err(
                |source| SystemRunError {
                    name: entry.name.clone(),
                    source,
                },
            )?;
        }
        Ok(())
    }

    pub fn handle(&self, name: &str) -> Option<SystemHandle> {
        self.name_lookup.get(name).copied()
    }

    /// Names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        label: &'static str,
        priority: i32,
        log: Rc<RefCell<Vec<&'static str>>>,
        inits: u32,
    }

    impl System for Recorder {
        fn priority(&self) -> i32 {
            self.priority
        }

        fn init(&mut self, _registry: &mut EntityRegistry) -> Result<(), SystemError> {
            self.inits += 1;
            assert_eq!(self.inits, 1);
            Ok(())
        }

        fn update(&mut self, _registry: &mut EntityRegistry, _ts: Duration) -> Result<(), SystemError> {
            self.log.borrow_mut().push(self.label);
            Ok(())
        }
    }

    fn recorder(label: &'static str, priority: i32, log: &Rc<RefCell<Vec<&'static str>>>) -> Box<dyn System> {
        Box::new(Recorder {
            label,
            priority,
            log: Rc::clone(log),
            inits: 0,
        })
    }

    #[test]
    fn test_runs_in_priority_then_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EntityRegistry::new();
        let mut systems = SystemRegistry::new();
        systems.register("render", recorder("render", 100, &log), &mut registry).unwrap();
        systems.register("input", recorder("input", -10, &log), &mut registry).unwrap();
        systems.register("physics", recorder("physics", 0, &log), &mut registry).unwrap();
        systems.register("ai", recorder("ai", 0, &log), &mut registry).unwrap();

        let mut profiler = PhaseProfiler::new();
        systems
            .update_all(&mut registry, Duration::from_millis(16), &mut profiler)
            .unwrap();
        assert_eq!(*log.borrow(), vec!["input", "physics", "ai", "render"]);
        assert_eq!(systems.names(), vec!["input", "physics", "ai", "render"]);

        let ai = systems.handle("ai").unwrap();
        assert_eq!(ai.index(), 3);
        assert_eq!(ai.to_string(), "system#3");
        assert!(systems.handle("physics").unwrap() < ai);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EntityRegistry::new();
        let mut systems = SystemRegistry::new();
        systems.register("ai", recorder("ai", 0, &log), &mut registry).unwrap();
        let err = systems
            .register("ai", recorder("ai2", 1, &log), &mut registry)
            .unwrap_err();
        assert!(matches!(err, SystemRegistrationError::DuplicateName { .. }));
        assert_eq!(systems.len(), 1);
    }

    struct Failing;

    impl System for Failing {
        fn update(&mut self, _registry: &mut EntityRegistry, _ts: Duration) -> Result<(), SystemError> {
            Err(SystemError::Message("boom".into()))
        }
    }

    #[test]
    fn test_failure_names_the_system() {
        let mut registry = EntityRegistry::new();
        let mut systems = SystemRegistry::new();
        systems.register("failing", Box::new(Failing), &mut registry).unwrap();
        let err = systems
            .update_all(&mut registry, Duration::ZERO, &mut PhaseProfiler::new())
            .unwrap_err();
        assert_eq!(err.name, "failing");
    }
}
