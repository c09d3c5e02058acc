//! Key commands (DEL, EXISTS, TYPE)
//!
//! These work on any key, whatever its value type.

use super::{bulk_arg, bulk_args, Command, CommandContext};
use crate::protocol::RespValue;

/// DEL command - Delete one or more keys
///
/// Syntax: DEL key [key ...]
pub struct DelCommand;

impl Command for DelCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        match bulk_args(args, 0) {
            Ok(keys) => RespValue::integer(ctx.keyspace.delete_many(&keys) as i64),
            Err(e) => e,
        }
    }

    fn name(&self) -> &'static str {
        "DEL"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// EXISTS command - Check if one or more keys exist
///
/// Syntax: EXISTS key [key ...]
///
/// A key named several times is counted each time.
pub struct ExistsCommand;

impl Command for ExistsCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        match bulk_args(args, 0) {
            Ok(keys) => RespValue::integer(ctx.keyspace.exists_many(&keys) as i64),
            Err(e) => e,
        }
    }

    fn name(&self) -> &'static str {
        "EXISTS"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// TYPE command - Get the type tag of a key
///
/// Syntax: TYPE key
///
/// Replies one of string, list, set, zset, hash, stream, or none.
pub struct TypeCommand;

impl Command for TypeCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        let name = ctx
            .keyspace
            .type_of(&key)
            .map_or("none", |kind| kind.type_name());
        RespValue::simple_string(name)
    }

    fn name(&self) -> &'static str {
        "TYPE"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
