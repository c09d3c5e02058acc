//! Counter commands (INCR, INCRBY, DECR, DECRBY, INCRBYFLOAT)

use super::{bulk_arg, float_arg, int_arg, Command, CommandContext};
use crate::protocol::RespValue;
use bytes::Bytes;

/// Shared body of the integer counters
fn apply_delta(ctx: &CommandContext, key: Bytes, delta: i64) -> RespValue {
    match ctx.keyspace.incr_by(&key, delta) {
        Ok(value) => RespValue::integer(value),
        Err(e) => e.into(),
    }
}

/// INCR command - Increment the integer value of a key by 1
///
/// Syntax: INCR key
pub struct IncrCommand;

impl Command for IncrCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        match bulk_arg(args, 0) {
            Ok(key) => apply_delta(ctx, key, 1),
            Err(e) => e,
        }
    }

    fn name(&self) -> &'static str {
        "INCR"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// INCRBY command - Increment the integer value of a key by a given amount
///
/// Syntax: INCRBY key increment
pub struct IncrByCommand;

impl Command for IncrByCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let delta = match int_arg(args, 1) {
            Ok(d) => d,
            Err(e) => return e,
        };
        apply_delta(ctx, key, delta)
    }

    fn name(&self) -> &'static str {
        "INCRBY"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// DECR command - Decrement the integer value of a key by 1
///
/// Syntax: DECR key
pub struct DecrCommand;

impl Command for DecrCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        match bulk_arg(args, 0) {
            Ok(key) => apply_delta(ctx, key, -1),
            Err(e) => e,
        }
    }

    fn name(&self) -> &'static str {
        "DECR"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// DECRBY command - Decrement the integer value of a key by a given amount
///
/// Syntax: DECRBY key decrement
pub struct DecrByCommand;

impl Command for DecrByCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let delta = match int_arg(args, 1) {
            Ok(d) => d,
            Err(e) => return e,
        };

        match ctx.keyspace.decr_by(&key, delta) {
            Ok(value) => RespValue::integer(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "DECRBY"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// INCRBYFLOAT command - Increment the numeric value of a key by a float
///
/// Syntax: INCRBYFLOAT key increment
///
/// Replies with the new value as a bulk string (`80` + `0.5` -> `"80.5"`).
pub struct IncrByFloatCommand;

impl Command for IncrByFloatCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let delta = match float_arg(args, 1) {
            Ok(d) => d,
            Err(e) => return e,
        };

        match ctx.keyspace.incr_by_float(&key, delta) {
            Ok(value) => RespValue::bulk_string(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "INCRBYFLOAT"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}
