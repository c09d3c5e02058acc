//! Hash commands (HSET, HGET, HSETNX, HMGET, HINCRBY, HGETALL, HSCAN, HDEL, HKEYS, HLEN, HEXISTS)

use super::{bulk_arg, bulk_args, int_arg, pair_args, scan_args, scan_reply, Command, CommandContext};
use crate::protocol::RespValue;

/// HSET command - Set one or more fields in a hash
///
/// Syntax: HSET key field value [field value ...]
///
/// Replies with the number of fields that were newly added.
pub struct HSetCommand;

impl Command for HSetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let pairs = match pair_args(self.name(), args, 1) {
            Ok(p) => p,
            Err(e) => return e,
        };

        match ctx.keyspace.hset_many(key, pairs) {
            Ok(added) => RespValue::integer(added as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HSET"
    }

    fn min_args(&self) -> usize {
        3
    }
}

/// HGET command - Get the value of a hash field
///
/// Syntax: HGET key field
pub struct HGetCommand;

impl Command for HGetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let field = match bulk_arg(args, 1) {
            Ok(f) => f,
            Err(e) => return e,
        };

        match ctx.keyspace.hget(&key, &field) {
            Ok(value) => RespValue::bulk_or_null(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HGET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// HSETNX command - Set a hash field only if it does not exist
///
/// Syntax: HSETNX key field value
pub struct HSetNxCommand;

impl Command for HSetNxCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let field = match bulk_arg(args, 1) {
            Ok(f) => f,
            Err(e) => return e,
        };
        let value = match bulk_arg(args, 2) {
            Ok(v) => v,
            Err(e) => return e,
        };

        match ctx.keyspace.hsetnx(key, field, value) {
            Ok(written) => RespValue::integer(written as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HSETNX"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// HMGET command - Get the values of several hash fields
///
/// Syntax: HMGET key field [field ...]
pub struct HMGetCommand;

impl Command for HMGetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let fields = match bulk_args(args, 1) {
            Ok(f) => f,
            Err(e) => return e,
        };

        match ctx.keyspace.hmget(&key, &fields) {
            Ok(values) => {
                RespValue::array(values.into_iter().map(RespValue::bulk_or_null).collect())
            }
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HMGET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// HINCRBY command - Increment the integer value of a hash field
///
/// Syntax: HINCRBY key field increment
pub struct HIncrByCommand;

impl Command for HIncrByCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let field = match bulk_arg(args, 1) {
            Ok(f) => f,
            Err(e) => return e,
        };
        let delta = match int_arg(args, 2) {
            Ok(d) => d,
            Err(e) => return e,
        };

        match ctx.keyspace.hincr_by(&key, field, delta) {
            Ok(value) => RespValue::integer(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HINCRBY"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// HGETALL command - Get all fields and values of a hash
///
/// Syntax: HGETALL key
///
/// Replies a flat `[field, value, field, value, ...]` array.
pub struct HGetAllCommand;

impl Command for HGetAllCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.hgetall(&key) {
            Ok(pairs) => RespValue::bulk_array(pairs.into_iter().flat_map(|(f, v)| [f, v])),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HGETALL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HSCAN command - Incrementally iterate the fields of a hash
///
/// Syntax: HSCAN key cursor [MATCH pattern] [COUNT count]
pub struct HScanCommand;

impl Command for HScanCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let parsed = match scan_args(args, 1) {
            Ok(p) => p,
            Err(e) => return e,
        };

        match ctx
            .keyspace
            .hscan(&key, parsed.cursor, parsed.pattern.as_deref(), parsed.count)
        {
            Ok(page) => scan_reply(
                page.cursor,
                page.items
                    .into_iter()
                    .flat_map(|(f, v)| [RespValue::bulk_string(f), RespValue::bulk_string(v)])
                    .collect(),
            ),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HSCAN"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(6)
    }
}

/// HDEL command - Delete one or more hash fields
///
/// Syntax: HDEL key field [field ...]
pub struct HDelCommand;

impl Command for HDelCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let fields = match bulk_args(args, 1) {
            Ok(f) => f,
            Err(e) => return e,
        };

        match ctx.keyspace.hdel(&key, &fields) {
            Ok(removed) => RespValue::integer(removed as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HDEL"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// HKEYS command - Get all field names in a hash
///
/// Syntax: HKEYS key
pub struct HKeysCommand;

impl Command for HKeysCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.hkeys(&key) {
            Ok(fields) => RespValue::bulk_array(fields),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HKEYS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HLEN command - Get the number of fields in a hash
///
/// Syntax: HLEN key
pub struct HLenCommand;

impl Command for HLenCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.hlen(&key) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HLEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HEXISTS command - Determine if a hash field exists
///
/// Syntax: HEXISTS key field
pub struct HExistsCommand;

impl Command for HExistsCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let field = match bulk_arg(args, 1) {
            Ok(f) => f,
            Err(e) => return e,
        };

        match ctx.keyspace.hexists(&key, &field) {
            Ok(found) => RespValue::integer(found as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "HEXISTS"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;

    fn args(parts: &[&str]) -> Vec<RespValue> {
        parts.iter().map(|p| RespValue::bulk_string(p.to_string())).collect()
    }

    #[test]
    fn test_hset_hget() {
        let ctx = CommandContext::new();

        let result = HSetCommand.execute(&ctx, &args(&["user:1", "name", "Alice", "age", "30"]));
        assert_eq!(result, RespValue::integer(2));
        let result = HSetCommand.execute(&ctx, &args(&["user:1", "name", "Bob"]));
        assert_eq!(result, RespValue::integer(0));

        assert_eq!(
            HGetCommand.execute(&ctx, &args(&["user:1", "name"])),
            RespValue::bulk_string("Bob")
        );
        assert_eq!(HGetCommand.execute(&ctx, &args(&["user:1", "nope"])), RespValue::null());
        assert!(HSetCommand.execute(&ctx, &args(&["user:1", "name"])).is_error());
    }

    #[test]
    fn test_hsetnx_hmget() {
        let ctx = CommandContext::new();
        assert_eq!(HSetNxCommand.execute(&ctx, &args(&["h", "f", "1"])), RespValue::integer(1));
        assert_eq!(HSetNxCommand.execute(&ctx, &args(&["h", "f", "2"])), RespValue::integer(0));
        assert_eq!(
            HMGetCommand.execute(&ctx, &args(&["h", "f", "g"])),
            RespValue::array(vec![RespValue::bulk_string("1"), RespValue::null()])
        );
    }

    #[test]
    fn test_hincrby() {
        let ctx = CommandContext::new();
        assert_eq!(HIncrByCommand.execute(&ctx, &args(&["h", "n", "5"])), RespValue::integer(5));
        assert_eq!(HIncrByCommand.execute(&ctx, &args(&["h", "n", "-2"])), RespValue::integer(3));

        HSetCommand.execute(&ctx, &args(&["h", "s", "text"]));
        assert!(HIncrByCommand.execute(&ctx, &args(&["h", "s", "1"])).is_error());
    }

    #[test]
    fn test_hgetall_flat_pairs() {
        let ctx = CommandContext::new();
        HSetCommand.execute(&ctx, &args(&["h", "a", "1", "b", "2"]));

        let reply = HGetAllCommand.execute(&ctx, &args(&["h"]));
        let flat = reply.as_array().unwrap();
        assert_eq!(flat.len(), 4);
        let map: HashMap<_, _> = flat
            .chunks(2)
            .map(|pair| {
                (
                    pair[0].as_bulk_string().unwrap().clone(),
                    pair[1].as_bulk_string().unwrap().clone(),
                )
            })
            .collect();
        assert_eq!(map[&Bytes::from("a")], Bytes::from("1"));
        assert_eq!(map[&Bytes::from("b")], Bytes::from("2"));
    }

    #[test]
    fn test_hscan_full_walk() {
        let ctx = CommandContext::new();
        for i in 0..50 {
            ctx.keyspace
                .hset(Bytes::from("h"), Bytes::from(format!("f{}", i)), Bytes::from("v"))
                .unwrap();
        }

        let mut fields = 0;
        let mut cursor = "0".to_string();
        loop {
            let reply = HScanCommand.execute(&ctx, &args(&["h", &cursor, "COUNT", "7"]));
            let parts = reply.as_array().unwrap();
            cursor = String::from_utf8(parts[0].as_bulk_string().unwrap().to_vec()).unwrap();
            fields += parts[1].as_array().unwrap().len() / 2;
            if cursor == "0" {
                break;
            }
        }
        assert_eq!(fields, 50);
    }

    #[test]
    fn test_hdel_keeps_hash() {
        let ctx = CommandContext::new();
        HSetCommand.execute(&ctx, &args(&["h", "f", "v"]));
        assert_eq!(HDelCommand.execute(&ctx, &args(&["h", "f", "g"])), RespValue::integer(1));
        assert_eq!(HLenCommand.execute(&ctx, &args(&["h"])), RespValue::integer(0));
        assert!(ctx.keyspace.exists(&Bytes::from("h")));
    }

    #[test]
    fn test_hkeys_hexists() {
        let ctx = CommandContext::new();
        HSetCommand.execute(&ctx, &args(&["h", "only", "v"]));
        assert_eq!(
            HKeysCommand.execute(&ctx, &args(&["h"])),
            RespValue::array(vec![RespValue::bulk_string("only")])
        );
        assert_eq!(HExistsCommand.execute(&ctx, &args(&["h", "only"])), RespValue::integer(1));
        assert_eq!(HExistsCommand.execute(&ctx, &args(&["h", "other"])), RespValue::integer(0));
    }

    #[test]
    fn test_hash_on_string_key() {
        let ctx = CommandContext::new();
        ctx.keyspace.set(Bytes::from("s"), Bytes::from("v")).unwrap();
        assert_eq!(
            HSetCommand.execute(&ctx, &args(&["s", "f", "v"])),
            RespValue::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
