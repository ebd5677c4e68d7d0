//! Global registry of command sets, keyed by platform name.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use log::debug;

use super::DeviceCommandSet;
use super::vendors;
use crate::error::{PlatformError, Result};
use crate::host::IosType;

static REGISTRY: LazyLock<RwLock<CommandSetRegistry>> = LazyLock::new(|| {
    let mut registry = CommandSetRegistry::new();
    registry.register_builtin();
    RwLock::new(registry)
});

/// Lookup table from platform name to command set.
#[derive(Default)]
pub struct CommandSetRegistry {
    sets: HashMap<String, Arc<dyn DeviceCommandSet>>,
}

impl CommandSetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    /// The process-wide registry, seeded with the Cisco families.
    pub fn global() -> &'static RwLock<CommandSetRegistry> {
        &REGISTRY
    }

    fn register_builtin(&mut self) {
        let builtin: [Arc<dyn DeviceCommandSet>; 4] = [
            Arc::new(vendors::cisco_ios::CiscoIos),
            Arc::new(vendors::cisco_xe::CiscoXe),
            Arc::new(vendors::cisco_nxos::CiscoNxos),
            Arc::new(vendors::cisco_asa::CiscoAsa),
        ];
        for set in builtin {
            self.sets.insert(set.name().to_string(), set);
        }
    }

    /// Register a command set. Names must be unique.
    pub fn register(&mut self, set: Arc<dyn DeviceCommandSet>) -> Result<()> {
        let name = set.name().to_string();
        if self.sets.contains_key(&name) {
            return Err(PlatformError::AlreadyRegistered { name }.into());
        }
        debug!("registered command set {}", name);
        self.sets.insert(name, set);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DeviceCommandSet>> {
        self.sets.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandSetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSetRegistry")
            .field("sets", &self.names())
            .finish()
    }
}

/// Command set for an OS family from the global registry.
pub fn command_set_for(ios_type: IosType) -> Result<Arc<dyn DeviceCommandSet>> {
    let registry = CommandSetRegistry::global()
        .read()
        .map_err(|_| PlatformError::RegistryPoisoned)?;
    registry.get(ios_type.as_str()).ok_or_else(|| {
        PlatformError::UnknownPlatform {
            name: ios_type.as_str().to_string(),
        }
        .into()
    })
}
