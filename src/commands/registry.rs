//! Command registry
//!
//! Centralized registry for all available commands.
//! This allows loose coupling between command implementations and the dispatcher.

use super::{admin, counter, hash, hyperloglog, key, list, search, set, stream, string, zset, Command};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new command registry and register all commands
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        // Register string commands
        registry.register(Arc::new(string::SetCommand));
        registry.register(Arc::new(string::GetCommand));
        registry.register(Arc::new(string::SetNxCommand));
        registry.register(Arc::new(string::SetXxCommand));
        registry.register(Arc::new(string::MSetCommand));
        registry.register(Arc::new(string::MGetCommand));

        // Register counter commands
        registry.register(Arc::new(counter::IncrCommand));
        registry.register(Arc::new(counter::IncrByCommand));
        registry.register(Arc::new(counter::DecrCommand));
        registry.register(Arc::new(counter::DecrByCommand));
        registry.register(Arc::new(counter::IncrByFloatCommand));

        // Register key commands
        registry.register(Arc::new(key::DelCommand));
        registry.register(Arc::new(key::ExistsCommand));
        registry.register(Arc::new(key::TypeCommand));

        // Register hash commands
        registry.register(Arc::new(hash::HSetCommand));
        registry.register(Arc::new(hash::HGetCommand));
        registry.register(Arc::new(hash::HSetNxCommand));
        registry.register(Arc::new(hash::HMGetCommand));
        registry.register(Arc::new(hash::HIncrByCommand));
        registry.register(Arc::new(hash::HGetAllCommand));
        registry.register(Arc::new(hash::HScanCommand));
        registry.register(Arc::new(hash::HDelCommand));
        registry.register(Arc::new(hash::HKeysCommand));
        registry.register(Arc::new(hash::HLenCommand));
        registry.register(Arc::new(hash::HExistsCommand));

        // Register set commands
        registry.register(Arc::new(set::SAddCommand));
        registry.register(Arc::new(set::SRemCommand));
        registry.register(Arc::new(set::SCardCommand));
        registry.register(Arc::new(set::SIsMemberCommand));
        registry.register(Arc::new(set::SMembersCommand));
        registry.register(Arc::new(set::SInterCommand));
        registry.register(Arc::new(set::SPopCommand));
        registry.register(Arc::new(set::SScanCommand));

        // Register sorted set commands
        registry.register(Arc::new(zset::ZAddCommand));
        registry.register(Arc::new(zset::ZRangeCommand));
        registry.register(Arc::new(zset::ZRankCommand));
        registry.register(Arc::new(zset::ZRevRankCommand));
        registry.register(Arc::new(zset::ZScoreCommand));
        registry.register(Arc::new(zset::ZCardCommand));
        registry.register(Arc::new(zset::ZRemCommand));
        registry.register(Arc::new(zset::ZRemRangeByRankCommand));

        // Register list commands
        registry.register(Arc::new(list::LPushCommand));
        registry.register(Arc::new(list::RPushCommand));
        registry.register(Arc::new(list::LPopCommand));
        registry.register(Arc::new(list::RPopCommand));
        registry.register(Arc::new(list::LRangeCommand));
        registry.register(Arc::new(list::LTrimCommand));
        registry.register(Arc::new(list::LLenCommand));
        registry.register(Arc::new(list::BLPopCommand));
        registry.register(Arc::new(list::BRPopCommand));

        // Register sketch commands
        registry.register(Arc::new(hyperloglog::PfAddCommand));
        registry.register(Arc::new(hyperloglog::PfCountCommand));
        registry.register(Arc::new(hyperloglog::PfMergeCommand));

        // Register stream commands
        registry.register(Arc::new(stream::XAddCommand));
        registry.register(Arc::new(stream::XLenCommand));
        registry.register(Arc::new(stream::XRangeCommand));

        // Register admin commands
        registry.register(Arc::new(admin::PingCommand));
        registry.register(Arc::new(admin::InfoCommand));
        registry.register(Arc::new(admin::DbSizeCommand));
        registry.register(Arc::new(admin::FlushDbCommand));
        registry.register(Arc::new(admin::FlushAllCommand));
        registry.register(Arc::new(admin::MemoryCommand));

        // Register search commands
        registry.register(Arc::new(search::KeysCommand));
        registry.register(Arc::new(search::ScanCommand));

        registry
    }

    /// Register a command
    fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_uppercase();
        self.commands.insert(name, command);
    }

    /// Get a command by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_uppercase()).cloned()
    }

    /// Check if a command exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_uppercase())
    }

    /// Get all command names
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
