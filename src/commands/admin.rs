//! Admin commands (PING, INFO, DBSIZE, FLUSHDB, FLUSHALL, MEMORY)

use super::{bulk_arg, is_option, Command, CommandContext};
use crate::error::StoreError;
use crate::protocol::RespValue;

/// PING command - Check the store is responsive
///
/// Syntax: PING [message]
pub struct PingCommand;

impl Command for PingCommand {
    fn execute(&self, _ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        if args.is_empty() {
            return RespValue::simple_string("PONG");
        }
        match bulk_arg(args, 0) {
            Ok(message) => RespValue::bulk_string(message),
            Err(e) => e,
        }
    }

    fn name(&self) -> &'static str {
        "PING"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// INFO command - Get information and statistics about the keyspace
///
/// Syntax: INFO [section]
pub struct InfoCommand;

impl Command for InfoCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[RespValue]) -> RespValue {
        let stats = ctx.keyspace.stats();

        let info = format!(
            "# Server\r\n\
            ferrumkv_version:{}\r\n\
            os:{}\r\n\
            arch:{}\r\n\
            \r\n\
            # Clients\r\n\
            connected_clients:1\r\n\
            blocked_clients:{}\r\n\
            \r\n\
            # Memory\r\n\
            used_memory:{}\r\n\
            \r\n\
            # Keyspace\r\n\
            shards:{}\r\n\
            db0:keys={}\r\n",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH,
            stats.blocked_waiters,
            stats.used_memory_bytes,
            stats.shards,
            stats.keys
        );

        RespValue::bulk_string(info)
    }

    fn name(&self) -> &'static str {
        "INFO"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// DBSIZE command - Get the number of keys
///
/// Syntax: DBSIZE
pub struct DbSizeCommand;

impl Command for DbSizeCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[RespValue]) -> RespValue {
        RespValue::integer(ctx.keyspace.len() as i64)
    }

    fn name(&self) -> &'static str {
        "DBSIZE"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// FLUSHDB command - Remove all keys
///
/// Syntax: FLUSHDB
pub struct FlushDbCommand;

impl Command for FlushDbCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[RespValue]) -> RespValue {
        ctx.keyspace.flush();
        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "FLUSHDB"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// FLUSHALL command - Remove all keys
///
/// Syntax: FLUSHALL
///
/// There is a single database, so this is FLUSHDB under another name.
pub struct FlushAllCommand;

impl Command for FlushAllCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[RespValue]) -> RespValue {
        ctx.keyspace.flush();
        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "FLUSHALL"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// MEMORY command - Memory introspection
///
/// Syntax: MEMORY USAGE key
///
/// Replies the approximate bytes held by the key, or null when absent.
pub struct MemoryCommand;

impl Command for MemoryCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        if !args.first().map_or(false, |sub| is_option(sub, "USAGE")) {
            return RespValue::error("ERR unknown subcommand for 'memory'. Try MEMORY USAGE key");
        }
        let key = match bulk_arg(args, 1) {
            Ok(k) => k,
            Err(_) => return StoreError::Syntax.into(),
        };

        match ctx.keyspace.memory_usage(&key) {
            Some(bytes) => RespValue::integer(bytes as i64),
            None => RespValue::null(),
        }
    }

    fn name(&self) -> &'static str {
        "MEMORY"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
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
    fn test_ping() {
        let ctx = CommandContext::new();
        assert_eq!(PingCommand.execute(&ctx, &[]), RespValue::simple_string("PONG"));
        assert_eq!(PingCommand.execute(&ctx, &args(&["hi"])), RespValue::bulk_string("hi"));
    }

    #[test]
    fn test_info_sections() {
        let ctx = CommandContext::new();
        ctx.keyspace.set(Bytes::from("k"), Bytes::from("v")).unwrap();

        let reply = InfoCommand.execute(&ctx, &[]);
        let text = String::from_utf8(reply.as_bulk_string().unwrap().to_vec()).unwrap();
        assert!(text.contains("connected_clients:1"));
        assert!(text.contains("db0:keys=1"));
        assert!(text.contains("used_memory:"));
    }

    #[test]
    fn test_dbsize_and_flush() {
        let ctx = CommandContext::new();
        ctx.keyspace.set(Bytes::from("a"), Bytes::from("1")).unwrap();
        ctx.keyspace.sadd(Bytes::from("b"), vec![Bytes::from("m")]).unwrap();
        assert_eq!(DbSizeCommand.execute(&ctx, &[]), RespValue::integer(2));

        assert_eq!(FlushAllCommand.execute(&ctx, &[]), RespValue::simple_string("OK"));
        assert_eq!(DbSizeCommand.execute(&ctx, &[]), RespValue::integer(0));

        ctx.keyspace.set(Bytes::from("a"), Bytes::from("1")).unwrap();
        FlushDbCommand.execute(&ctx, &[]);
        assert!(ctx.keyspace.is_empty());
    }

    #[test]
    fn test_memory_usage_sketch_vs_set() {
        let ctx = CommandContext::new();
        let members: Vec<Bytes> = (0..20_000).map(|i| Bytes::from(format!("member:{}", i))).collect();
        ctx.keyspace.sadd(Bytes::from("exact"), members.clone()).unwrap();
        ctx.keyspace.pfadd(Bytes::from("approx"), &members).unwrap();

        let exact = MemoryCommand
            .execute(&ctx, &args(&["USAGE", "exact"]))
            .as_integer()
            .unwrap();
        let approx = MemoryCommand
            .execute(&ctx, &args(&["usage", "approx"]))
            .as_integer()
            .unwrap();
        assert!(approx < exact);

        assert_eq!(MemoryCommand.execute(&ctx, &args(&["USAGE", "nope"])), RespValue::null());
        assert!(MemoryCommand.execute(&ctx, &args(&["DOCTOR"])).is_error());
    }
}
