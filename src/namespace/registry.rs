//! Process-wide named registry the namespace can be installed into.
//!
//! A registry has three slots, one per install mode: named globals, lazily
//! resolved definitions, and a single module-exports value. A registry built
//! without a capability rejects the matching operations.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::{HelperError, Result};

/// A value stored in the registry.
pub type Entry = Arc<dyn Any + Send + Sync>;

type Definition = Arc<dyn Fn() -> Entry + Send + Sync>;

enum DefinitionSlot {
    Pending(Definition),
    Resolved(Entry),
}

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Named registry of shared values.
pub struct Registry {
    globals: RwLock<HashMap<String, Entry>>,
    definitions: RwLock<HashMap<String, DefinitionSlot>>,
    exports: RwLock<Option<Entry>>,
    module_exports: bool,
    accepts_definitions: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with every capability enabled.
    pub fn new() -> Self {
        Self {
            globals: RwLock::new(HashMap::new()),
            definitions: RwLock::new(HashMap::new()),
            exports: RwLock::new(None),
            module_exports: true,
            accepts_definitions: true,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        GLOBAL_REGISTRY.get_or_init(Registry::new)
    }

    /// Disable the module-exports slot.
    pub fn without_module_exports(mut self) -> Self {
        self.module_exports = false;
        self
    }

    /// Disable lazily resolved definitions.
    pub fn without_definitions(mut self) -> Self {
        self.accepts_definitions = false;
        self
    }

    pub fn has_module_exports(&self) -> bool {
        self.module_exports
    }

    pub fn accepts_definitions(&self) -> bool {
        self.accepts_definitions
    }

    /// Store `value` under `name`, returning whatever was there before.
    pub fn set<T>(&self, name: &str, value: T) -> Option<Entry>
    where
        T: Any + Send + Sync,
    {
        self.replace(name, Some(Arc::new(value)))
    }

    /// Put `entry` under `name`, or clear the name when `entry` is `None`.
    /// Returns the value it replaced.
    pub fn replace(&self, name: &str, entry: Option<Entry>) -> Option<Entry> {
        let mut globals = self.globals.write().unwrap_or_else(PoisonError::into_inner);
        match entry {
            Some(entry) => globals.insert(name.to_string(), entry),
            None => globals.remove(name),
        }
    }

    /// Typed lookup of a global.
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self
            .globals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| HelperError::NotInstalled(name.to_string()))?;
        downcast(name, entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Entry> {
        self.replace(name, None)
    }

    /// Register a factory under `name`; it runs on the first [`require`](Self::require).
    ///
    /// Redefining a name discards any value already resolved for it.
    pub fn define<T, F>(&self, name: &str, factory: F) -> Result<()>
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        if !self.accepts_definitions {
            return Err(HelperError::Configuration(
                "registry does not accept definitions".to_string(),
            ));
        }
        let definition: Definition = Arc::new(move || Arc::new(factory()) as Entry);
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), DefinitionSlot::Pending(definition));
        Ok(())
    }

    /// Resolve a definition, running its factory at most once.
    pub fn require<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let definition = {
            let definitions = self
                .definitions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match definitions.get(name) {
                Some(DefinitionSlot::Resolved(entry)) => return downcast(name, entry.clone()),
                Some(DefinitionSlot::Pending(definition)) => Arc::clone(definition),
                None => return Err(HelperError::NotInstalled(name.to_string())),
            }
        };

        let resolved = definition();
        let entry = {
            let mut definitions = self
                .definitions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match definitions.get(name) {
                Some(DefinitionSlot::Resolved(existing)) => existing.clone(),
                _ => {
                    definitions.insert(
                        name.to_string(),
                        DefinitionSlot::Resolved(resolved.clone()),
                    );
                    resolved
                }
            }
        };
        tracing::debug!(name, "Resolved registry definition");
        downcast(name, entry)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Publish `value` as the module exports, returning the previous exports.
    pub fn set_exports<T>(&self, value: T) -> Result<Option<Entry>>
    where
        T: Any + Send + Sync,
    {
        self.replace_exports(Some(Arc::new(value)))
    }

    pub(crate) fn replace_exports(&self, entry: Option<Entry>) -> Result<Option<Entry>> {
        if !self.module_exports {
            return Err(HelperError::Configuration(
                "registry has no module exports".to_string(),
            ));
        }
        let mut exports = self.exports.write().unwrap_or_else(PoisonError::into_inner);
        Ok(std::mem::replace(&mut *exports, entry))
    }

    /// Typed view of the module exports.
    pub fn exports<T>(&self) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self
            .exports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| HelperError::NotInstalled("exports".to_string()))?;
        downcast("exports", entry)
    }
}

fn downcast<T>(name: &str, entry: Entry) -> Result<Arc<T>>
where
    T: Any + Send + Sync,
{
    entry.downcast::<T>().map_err(|_| HelperError::TypeMismatch {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let globals: Vec<String> = self
            .globals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Registry")
            .field("globals", &globals)
            .field("module_exports", &self.module_exports)
            .field("accepts_definitions", &self.accepts_definitions)
            .finish()
    }
}
