//! Keyspace catalog.
//!
//! The catalog is the schema view bootstrap walks: keyspace names, whether
//! they are system keyspaces, and the replication strategy each one uses.
//! Schema changes (create/drop) may run concurrently with a bootstrap, so
//! keyspaces are handed out as `Arc`s and strategies as
//! `Arc<dyn ReplicationStrategy>`. Dropping a keyspace only removes the
//! catalog's reference.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::ReplicationError;
use crate::strategy::ReplicationStrategy;

/// A keyspace and its replication settings.
pub struct Keyspace {
    name: String,
    strategy: Arc<dyn ReplicationStrategy>,
    system: bool,
}

impl Keyspace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    /// Shared handle to the keyspace's strategy.
    ///
    /// The handle stays valid after the keyspace is dropped from the catalog.
    pub fn replication_strategy(&self) -> Arc<dyn ReplicationStrategy> {
        Arc::clone(&self.strategy)
    }
}

impl fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyspace")
            .field("name", &self.name)
            .field("strategy", &self.strategy.name())
            .field("system", &self.system)
            .finish()
    }
}

/// Catalog of keyspaces, ordered by name.
#[derive(Debug, Default)]
pub struct Catalog {
    keyspaces: RwLock<BTreeMap<String, Arc<Keyspace>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user keyspace.
    pub fn create_keyspace(
        &self,
        name: impl Into<String>,
        strategy: Arc<dyn ReplicationStrategy>,
    ) -> Result<Arc<Keyspace>, ReplicationError> {
        self.insert(name.into(), strategy, false)
    }

    /// Registers a system keyspace. System keyspaces are never streamed
    /// during bootstrap.
    pub fn create_system_keyspace(
        &self,
        name: impl Into<String>,
        strategy: Arc<dyn ReplicationStrategy>,
    ) -> Result<Arc<Keyspace>, ReplicationError> {
        self.insert(name.into(), strategy, true)
    }

    fn insert(
        &self,
        name: String,
        strategy: Arc<dyn ReplicationStrategy>,
        system: bool,
    ) -> Result<Arc<Keyspace>, ReplicationError> {
        let mut keyspaces = self.keyspaces.write();
        if keyspaces.contains_key(&name) {
            return Err(ReplicationError::KeyspaceExists(name));
        }
        let keyspace = Arc::new(Keyspace {
            name: name.clone(),
            strategy,
            system,
        });
        info!(keyspace = %name, strategy = keyspace.strategy.name(), system, "created keyspace");
        keyspaces.insert(name, Arc::clone(&keyspace));
        Ok(keyspace)
    }

    /// Removes a keyspace, returning the catalog's handle to it.
    pub fn drop_keyspace(&self, name: &str) -> Result<Arc<Keyspace>, ReplicationError> {
        let dropped = self
            .keyspaces
            .write()
            .remove(name)
            .ok_or_else(|| ReplicationError::NoSuchKeyspace(name.to_string()))?;
        info!(keyspace = %name, "dropped keyspace");
        Ok(dropped)
    }

    /// Names of all non-system keyspaces at this moment, in name order.
    pub fn non_system_keyspaces(&self) -> Vec<String> {
        self.keyspaces
            .read()
            .values()
            .filter(|ks| !ks.system)
            .map(|ks| ks.name.clone())
            .collect()
    }

    pub fn has_keyspace(&self, name: &str) -> bool {
        self.keyspaces.read().contains_key(name)
    }

    /// Looks up a keyspace, returning `None` if it does not exist.
    pub fn get_keyspace(&self, name: &str) -> Option<Arc<Keyspace>> {
        self.keyspaces.read().get(name).cloned()
    }

    /// Looks up a keyspace that is expected to exist.
    pub fn find_keyspace(&self, name: &str) -> Result<Arc<Keyspace>, ReplicationError> {
        self.get_keyspace(name)
            .ok_or_else(|| ReplicationError::NoSuchKeyspace(name.to_string()))
    }
}
