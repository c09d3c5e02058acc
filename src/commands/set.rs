//! Set commands (SADD, SREM, SCARD, SISMEMBER, SMEMBERS, SINTER, SPOP, SSCAN)

use super::{bulk_arg, bulk_args, int_arg, scan_args, scan_reply, Command, CommandContext};
use crate::error::StoreError;
use crate::protocol::RespValue;

/// SADD command - Add one or more members to a set
///
/// Syntax: SADD key member [member ...]
pub struct SAddCommand;

impl Command for SAddCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let members = match bulk_args(args, 1) {
            Ok(m) => m,
            Err(e) => return e,
        };

        match ctx.keyspace.sadd(key, members) {
            Ok(added) => RespValue::integer(added as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SADD"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// SREM command - Remove one or more members from a set
///
/// Syntax: SREM key member [member ...]
pub struct SRemCommand;

impl Command for SRemCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let members = match bulk_args(args, 1) {
            Ok(m) => m,
            Err(e) => return e,
        };

        match ctx.keyspace.srem(&key, &members) {
            Ok(removed) => RespValue::integer(removed as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SREM"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// SCARD command - Get the number of members in a set
///
/// Syntax: SCARD key
pub struct SCardCommand;

impl Command for SCardCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.scard(&key) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SCARD"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// SISMEMBER command - Determine if a value is a member of a set
///
/// Syntax: SISMEMBER key member
pub struct SIsMemberCommand;

impl Command for SIsMemberCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let member = match bulk_arg(args, 1) {
            Ok(m) => m,
            Err(e) => return e,
        };

        match ctx.keyspace.sismember(&key, &member) {
            Ok(found) => RespValue::integer(found as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SISMEMBER"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SMEMBERS command - Get all members of a set
///
/// Syntax: SMEMBERS key
pub struct SMembersCommand;

impl Command for SMembersCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.smembers(&key) {
            Ok(members) => RespValue::bulk_array(members),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SMEMBERS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// SINTER command - Intersect several sets
///
/// Syntax: SINTER key [key ...]
///
/// A missing key counts as an empty set.
pub struct SInterCommand;

impl Command for SInterCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let keys = match bulk_args(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.sinter(&keys) {
            Ok(members) => RespValue::bulk_array(members),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SINTER"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// SPOP command - Remove and return random members of a set
///
/// Syntax: SPOP key [count]
///
/// Without a count the reply is a single member (or null); with one it is
/// an array of up to `count` members.
pub struct SPopCommand;

impl Command for SPopCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        if args.len() == 1 {
            return match ctx.keyspace.spop(&key, 1) {
                Ok(popped) => RespValue::bulk_or_null(popped.into_iter().next()),
                Err(e) => e.into(),
            };
        }

        let count = match int_arg(args, 1) {
            Ok(c) if c < 0 => return StoreError::OutOfRange("must be positive".into()).into(),
            Ok(c) => c as usize,
            Err(e) => return e,
        };
        match ctx.keyspace.spop(&key, count) {
            Ok(popped) => RespValue::bulk_array(popped),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SPOP"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SSCAN command - Incrementally iterate the members of a set
///
/// Syntax: SSCAN key cursor [MATCH pattern] [COUNT count]
pub struct SScanCommand;

impl Command for SScanCommand {
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
            .sscan(&key, parsed.cursor, parsed.pattern.as_deref(), parsed.count)
        {
            Ok(page) => scan_reply(
                page.cursor,
                page.items.into_iter().map(RespValue::bulk_string).collect(),
            ),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "SSCAN"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn args(parts: &[&str]) -> Vec<RespValue> {
        parts.iter().map(|p| RespValue::bulk_string(p.to_string())).collect()
    }

    fn sorted(reply: RespValue) -> Vec<Bytes> {
        let mut members: Vec<Bytes> = reply
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m.as_bulk_string().unwrap().clone())
            .collect();
        members.sort();
        members
    }

    #[test]
    fn test_sadd_scard_srem() {
        let ctx = CommandContext::new();
        assert_eq!(SAddCommand.execute(&ctx, &args(&["s", "a", "b", "a"])), RespValue::integer(2));
        assert_eq!(SCardCommand.execute(&ctx, &args(&["s"])), RespValue::integer(2));
        assert_eq!(SRemCommand.execute(&ctx, &args(&["s", "a", "z"])), RespValue::integer(1));
        assert_eq!(SIsMemberCommand.execute(&ctx, &args(&["s", "b"])), RespValue::integer(1));
        assert_eq!(SRemCommand.execute(&ctx, &args(&["s", "b"])), RespValue::integer(1));
        assert!(!ctx.keyspace.exists(&Bytes::from("s")));
    }

    #[test]
    fn test_sinter() {
        let ctx = CommandContext::new();
        SAddCommand.execute(&ctx, &args(&["s1", "a", "b", "c"]));
        SAddCommand.execute(&ctx, &args(&["s2", "b", "c", "d"]));

        let result = SInterCommand.execute(&ctx, &args(&["s1", "s2"]));
        assert_eq!(sorted(result), vec![Bytes::from("b"), Bytes::from("c")]);

        let result = SInterCommand.execute(&ctx, &args(&["s1", "missing"]));
        assert_eq!(result, RespValue::array(vec![]));
    }

    #[test]
    fn test_spop() {
        let ctx = CommandContext::new();
        SAddCommand.execute(&ctx, &args(&["s", "a", "b", "c"]));

        let single = SPopCommand.execute(&ctx, &args(&["s"]));
        assert!(single.as_bulk_string().is_some());

        let rest = SPopCommand.execute(&ctx, &args(&["s", "5"]));
        assert_eq!(rest.as_array().unwrap().len(), 2);
        assert_eq!(SPopCommand.execute(&ctx, &args(&["s"])), RespValue::null());

        assert_eq!(
            SPopCommand.execute(&ctx, &args(&["s", "-1"])),
            RespValue::error("ERR value is out of range, must be positive")
        );
    }

    #[test]
    fn test_sscan_match() {
        let ctx = CommandContext::new();
        for i in 0..30 {
            ctx.keyspace
                .sadd(Bytes::from("s"), vec![Bytes::from(format!("m{}", i))])
                .unwrap();
        }

        let mut members = Vec::new();
        let mut cursor = "0".to_string();
        loop {
            let reply = SScanCommand.execute(&ctx, &args(&["s", &cursor, "MATCH", "m1*"]));
            let parts = reply.as_array().unwrap();
            cursor = String::from_utf8(parts[0].as_bulk_string().unwrap().to_vec()).unwrap();
            members.extend(parts[1].as_array().unwrap().iter().cloned());
            if cursor == "0" {
                break;
            }
        }
        // m1, m10..m19
        assert_eq!(members.len(), 11);
    }

    #[test]
    fn test_smembers_wrong_type() {
        let ctx = CommandContext::new();
        ctx.keyspace.set(Bytes::from("k"), Bytes::from("v")).unwrap();
        assert!(SMembersCommand.execute(&ctx, &args(&["k"])).is_error());
        assert!(SAddCommand.execute(&ctx, &args(&["k", "m"])).is_error());
    }
}
