//! List commands (LPUSH, RPUSH, LPOP, RPOP, LRANGE, LTRIM, LLEN, BLPOP, BRPOP)

use super::{bulk_arg, bulk_args, float_arg, range_args, wrong_arity, Command, CommandContext};
use crate::error::StoreError;
use crate::protocol::RespValue;
use bytes::Bytes;
use std::time::Duration;

/// LPUSH command - Prepend one or more values to a list
///
/// Syntax: LPUSH key value [value ...]
pub struct LPushCommand;

impl Command for LPushCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let values = match bulk_args(args, 1) {
            Ok(v) => v,
            Err(e) => return e,
        };

        match ctx.keyspace.lpush(key, values) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "LPUSH"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// RPUSH command - Append one or more values to a list
///
/// Syntax: RPUSH key value [value ...]
pub struct RPushCommand;

impl Command for RPushCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let values = match bulk_args(args, 1) {
            Ok(v) => v,
            Err(e) => return e,
        };

        match ctx.keyspace.rpush(key, values) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "RPUSH"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// LPOP command - Remove and get the first element of a list
///
/// Syntax: LPOP key
pub struct LPopCommand;

impl Command for LPopCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.lpop(&key) {
            Ok(value) => RespValue::bulk_or_null(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "LPOP"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// RPOP command - Remove and get the last element of a list
///
/// Syntax: RPOP key
pub struct RPopCommand;

impl Command for RPopCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.rpop(&key) {
            Ok(value) => RespValue::bulk_or_null(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "RPOP"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// LRANGE command - Get a range of elements from a list
///
/// Syntax: LRANGE key start stop
pub struct LRangeCommand;

impl Command for LRangeCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let (start, stop) = match range_args(args, 1) {
            Ok(r) => r,
            Err(e) => return e,
        };

        match ctx.keyspace.lrange(&key, start, stop) {
            Ok(values) => RespValue::bulk_array(values),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "LRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// LTRIM command - Trim a list to a range of elements
///
/// Syntax: LTRIM key start stop
pub struct LTrimCommand;

impl Command for LTrimCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let (start, stop) = match range_args(args, 1) {
            Ok(r) => r,
            Err(e) => return e,
        };

        match ctx.keyspace.ltrim(&key, start, stop) {
            Ok(()) => RespValue::simple_string("OK"),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "LTRIM"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// LLEN command - Get the length of a list
///
/// Syntax: LLEN key
pub struct LLenCommand;

impl Command for LLenCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.llen(&key) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "LLEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// Keys and timeout of a blocking pop: `key [key ...] timeout`
fn blocking_args(name: &str, args: &[RespValue]) -> Result<(Vec<Bytes>, Duration), RespValue> {
    if args.len() < 2 {
        return Err(wrong_arity(name));
    }
    let last = args.len() - 1;
    let seconds = float_arg(args, last)
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| RespValue::error("ERR timeout is not a float or out of range"))?;
    if seconds < 0.0 {
        return Err(RespValue::error("ERR timeout is negative"));
    }
    let timeout = Duration::try_from_secs_f64(seconds)
        .map_err(|_| RespValue::from(StoreError::OutOfRange("timeout".into())))?;
    let keys = bulk_args(&args[..last], 0)?;
    Ok((keys, timeout))
}

fn pop_reply(popped: Option<(Bytes, Bytes)>) -> RespValue {
    match popped {
        Some((key, value)) => RespValue::bulk_array([key, value]),
        None => RespValue::null(),
    }
}

/// BLPOP command - Remove and get the first element of the first non-empty list, or block
///
/// Syntax: BLPOP key [key ...] timeout
///
/// The timeout is in seconds; 0 blocks indefinitely.
pub struct BLPopCommand;

impl Command for BLPopCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let (keys, timeout) = match blocking_args(self.name(), args) {
            Ok(parsed) => parsed,
            Err(e) => return e,
        };

        match ctx.keyspace.blpop(&keys, timeout) {
            Ok(popped) => pop_reply(popped),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "BLPOP"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// BRPOP command - Remove and get the last element of the first non-empty list, or block
///
/// Syntax: BRPOP key [key ...] timeout
///
/// Replies `[key, value]`, or null when the timeout elapses first.
pub struct BRPopCommand;

impl Command for BRPopCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let (keys, timeout) = match blocking_args(self.name(), args) {
            Ok(parsed) => parsed,
            Err(e) => return e,
        };

        match ctx.keyspace.brpop(&keys, timeout) {
            Ok(popped) => pop_reply(popped),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "BRPOP"
    }

    fn min_args(&self) -> usize {
        2
    }
}
