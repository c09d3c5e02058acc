//! Command execution context

use crate::config::StoreConfig;
use crate::store::Keyspace;
use std::sync::Arc;

/// Context provided to commands during execution
///
/// Gives commands access to the keyspace. The keyspace is shared: several
/// dispatchers (or threads using one dispatcher) may hold the same `Arc`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The keyspace
    pub keyspace: Arc<Keyspace>,
}

impl CommandContext {
    /// Create a new command context with default settings
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a context owning a fresh keyspace built from `config`
    pub fn with_config(config: StoreConfig) -> Self {
        CommandContext {
            keyspace: Arc::new(Keyspace::new(config)),
        }
    }

    /// Create a context over an existing keyspace
    pub fn with_keyspace(keyspace: Arc<Keyspace>) -> Self {
        CommandContext { keyspace }
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}
