//! Command dispatcher
//!
//! Routes incoming commands to the appropriate handler.
//! This module provides loose coupling between callers and command implementations.

use crate::commands::{CommandContext, CommandRegistry};
use crate::config::StoreConfig;
use crate::protocol::RespValue;
use crate::store::Keyspace;
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use tracing::{debug, warn};

/// Command dispatcher
///
/// Receives commands, validates them, and routes to appropriate handlers.
/// Dispatching only needs `&self`, so one dispatcher can be shared between
/// threads; commands on unrelated keys never wait on each other.
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new() -> Self {
        Self::with_context(CommandContext::new())
    }

    /// Create a dispatcher over a fresh keyspace built from `config`
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_context(CommandContext::with_config(config))
    }

    /// Create a dispatcher over an existing keyspace
    pub fn with_keyspace(keyspace: Arc<Keyspace>) -> Self {
        Self::with_context(CommandContext::with_keyspace(keyspace))
    }

    fn with_context(context: CommandContext) -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context,
        }
    }

    /// Dispatch a command
    ///
    /// Takes a RESP value (expected to be an array), extracts the command name
    /// and arguments, then routes to the appropriate handler.
    pub fn dispatch(&self, value: RespValue) -> RespValue {
        // Commands should be arrays
        let args = match value {
            RespValue::Array(ref parts) if !parts.is_empty() => parts,
            ref invalid => {
                let b64 = general_purpose::STANDARD.encode(format!("{:?}", invalid).as_bytes());
                warn!("Invalid command format - not an array or empty. Command (B64): {}", b64);
                return RespValue::error("ERR invalid command format");
            }
        };

        // First element is the command name
        let cmd_name = match args[0].as_bulk_string().map(|name| std::str::from_utf8(name)) {
            Some(Ok(s)) => s,
            Some(Err(_)) => {
                return RespValue::error("ERR invalid command name encoding");
            }
            None => {
                return RespValue::error("ERR command name must be a bulk string");
            }
        };

        debug!("Dispatching command: {}", cmd_name);

        // Look up the command
        let command = match self.registry.get(cmd_name) {
            Some(cmd) => cmd,
            None => {
                warn!("Unknown command: {}", cmd_name);
                return RespValue::error(format!("ERR unknown command '{}'", cmd_name));
            }
        };

        // Extract arguments (everything after the command name)
        let cmd_args = &args[1..];

        // Validate argument count
        let too_few = cmd_args.len() < command.min_args();
        let too_many = command.max_args().map_or(false, |max| cmd_args.len() > max);
        if too_few || too_many {
            debug!("Wrong arity for {}: {} argument(s)", cmd_name, cmd_args.len());
            return RespValue::error(format!(
                "ERR wrong number of arguments for '{}' command",
                cmd_name.to_lowercase()
            ));
        }

        // Execute the command
        command.execute(&self.context, cmd_args)
    }

    /// Dispatch a command given as plain parts, e.g. `["SET", "k", "v"]`
    pub fn call<I, T>(&self, parts: I) -> RespValue
    where
        I: IntoIterator<Item = T>,
        T: Into<bytes::Bytes>,
    {
        self.dispatch(RespValue::bulk_array(parts))
    }

    /// Get reference to the context (for testing/inspection)
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// The keyspace commands run against
    pub fn keyspace(&self) -> &Arc<Keyspace> {
        &self.context.keyspace
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
