//! String commands (SET, GET, SETNX, SETXX, MSET, MGET)

use super::{bulk_arg, bulk_args, is_option, pair_args, Command, CommandContext};
use crate::error::StoreError;
use crate::protocol::RespValue;
use crate::store::SetCondition;

/// SET command - Set a key to a value
///
/// Syntax: SET key value [NX | XX]
///
/// Replies OK, or null when an NX/XX condition does not hold.
pub struct SetCommand;

impl Command for SetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let value = match bulk_arg(args, 1) {
            Ok(v) => v,
            Err(e) => return e,
        };

        let mut condition = SetCondition::Always;
        for option in &args[2..] {
            condition = match condition {
                SetCondition::Always if is_option(option, "NX") => SetCondition::IfNotExists,
                SetCondition::Always if is_option(option, "XX") => SetCondition::IfExists,
                _ => return StoreError::Syntax.into(),
            };
        }

        match ctx.keyspace.set_with(key, value, condition) {
            Ok(true) => RespValue::simple_string("OK"),
            Ok(false) => RespValue::null(),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// GET command - Get the value of a key
///
/// Syntax: GET key
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.get_string(&key) {
            Ok(value) => RespValue::bulk_or_null(value),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "GET"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// Conditional set replying 1 when written, 0 otherwise
fn conditional_set(ctx: &CommandContext, args: &[RespValue], condition: SetCondition) -> RespValue {
    let key = match bulk_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let value = match bulk_arg(args, 1) {
        Ok(v) => v,
        Err(e) => return e,
    };

    match ctx.keyspace.set_with(key, value, condition) {
        Ok(written) => RespValue::integer(written as i64),
        Err(e) => e.into(),
    }
}

/// SETNX command - Set a key only if it does not exist
///
/// Syntax: SETNX key value
pub struct SetNxCommand;

impl Command for SetNxCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        conditional_set(ctx, args, SetCondition::IfNotExists)
    }

    fn name(&self) -> &'static str {
        "SETNX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SETXX command - Set a key only if it already exists
///
/// Syntax: SETXX key value
pub struct SetXxCommand;

impl Command for SetXxCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        conditional_set(ctx, args, SetCondition::IfExists)
    }

    fn name(&self) -> &'static str {
        "SETXX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// MSET command - Set several keys
///
/// Syntax: MSET key value [key value ...]
///
/// A key named twice rejects the whole call.
pub struct MSetCommand;

impl Command for MSetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let pairs = match pair_args(self.name(), args, 0) {
            Ok(p) => p,
            Err(e) => return e,
        };

        match ctx.keyspace.mset(pairs) {
            Ok(()) => RespValue::simple_string("OK"),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "MSET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// MGET command - Get several keys
///
/// Syntax: MGET key [key ...]
///
/// Missing keys and keys of other types come back as null.
pub struct MGetCommand;

impl Command for MGetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let keys = match bulk_args(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        RespValue::array(
            ctx.keyspace
                .mget(&keys)
                .into_iter()
                .map(RespValue::bulk_or_null)
                .collect(),
        )
    }

    fn name(&self) -> &'static str {
        "MGET"
    }

    fn min_args(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn args(parts: &[&str]) -> Vec<RespValue> {
        parts.iter().map(|p| RespValue::bulk_string(p.to_string())).collect()
    }

    #[test]
    fn test_set_get() {
        let ctx = CommandContext::new();

        let result = SetCommand.execute(&ctx, &args(&["mykey", "myvalue"]));
        assert_eq!(result, RespValue::simple_string("OK"));

        let result = GetCommand.execute(&ctx, &args(&["mykey"]));
        assert_eq!(result, RespValue::bulk_string(Bytes::from("myvalue")));
    }

    #[test]
    fn test_get_nonexistent() {
        let ctx = CommandContext::new();
        let result = GetCommand.execute(&ctx, &args(&["nonexistent"]));
        assert_eq!(result, RespValue::null());
    }

    #[test]
    fn test_set_nx_xx() {
        let ctx = CommandContext::new();

        assert_eq!(SetCommand.execute(&ctx, &args(&["k", "v", "XX"])), RespValue::null());
        assert_eq!(GetCommand.execute(&ctx, &args(&["k"])), RespValue::null());

        assert_eq!(
            SetCommand.execute(&ctx, &args(&["k", "v1", "nx"])),
            RespValue::simple_string("OK")
        );
        assert_eq!(SetCommand.execute(&ctx, &args(&["k", "v2", "NX"])), RespValue::null());
        assert_eq!(GetCommand.execute(&ctx, &args(&["k"])), RespValue::bulk_string("v1"));

        assert!(SetCommand.execute(&ctx, &args(&["k", "v", "EX"])).is_error());
    }

    #[test]
    fn test_setnx_setxx() {
        let ctx = CommandContext::new();
        assert_eq!(SetXxCommand.execute(&ctx, &args(&["k", "v"])), RespValue::integer(0));
        assert_eq!(SetNxCommand.execute(&ctx, &args(&["k", "v"])), RespValue::integer(1));
        assert_eq!(SetNxCommand.execute(&ctx, &args(&["k", "w"])), RespValue::integer(0));
        assert_eq!(SetXxCommand.execute(&ctx, &args(&["k", "x"])), RespValue::integer(1));
        assert_eq!(GetCommand.execute(&ctx, &args(&["k"])), RespValue::bulk_string("x"));
    }

    #[test]
    fn test_mset_mget() {
        let ctx = CommandContext::new();
        assert_eq!(
            MSetCommand.execute(&ctx, &args(&["a", "1", "b", "2"])),
            RespValue::simple_string("OK")
        );
        assert_eq!(
            MGetCommand.execute(&ctx, &args(&["a", "nope", "b"])),
            RespValue::array(vec![
                RespValue::bulk_string("1"),
                RespValue::null(),
                RespValue::bulk_string("2"),
            ])
        );
    }

    #[test]
    fn test_mset_duplicate_key() {
        let ctx = CommandContext::new();
        let result = MSetCommand.execute(&ctx, &args(&["a", "1", "a", "2"]));
        assert_eq!(result, RespValue::error("ERR duplicate key in batch set"));
        assert_eq!(GetCommand.execute(&ctx, &args(&["a"])), RespValue::null());

        assert!(MSetCommand.execute(&ctx, &args(&["a", "1", "b"])).is_error());
    }

    #[test]
    fn test_get_wrong_type() {
        let ctx = CommandContext::new();
        ctx.keyspace
            .hset(Bytes::from("h"), Bytes::from("f"), Bytes::from("v"))
            .unwrap();
        assert_eq!(
            GetCommand.execute(&ctx, &args(&["h"])),
            RespValue::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
