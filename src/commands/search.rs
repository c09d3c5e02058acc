//! Search commands (KEYS, SCAN)

use super::{bulk_arg, scan_args, scan_reply, Command, CommandContext};
use crate::protocol::RespValue;

/// KEYS command - Find all keys matching a pattern
///
/// Syntax: KEYS pattern
///
/// Walks the whole keyspace in one call; SCAN is the incremental
/// alternative.
pub struct KeysCommand;

impl Command for KeysCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let pattern = match bulk_arg(args, 0) {
            Ok(p) => p,
            Err(e) => return e,
        };

        RespValue::bulk_array(ctx.keyspace.keys(&pattern))
    }

    fn name(&self) -> &'static str {
        "KEYS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// SCAN command - Incrementally iterate the keyspace
///
/// Syntax: SCAN cursor [MATCH pattern] [COUNT count]
///
/// Replies `[next-cursor, [keys...]]`; a next cursor of 0 ends the walk.
pub struct ScanCommand;

impl Command for ScanCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let parsed = match scan_args(args, 0) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let page = ctx
            .keyspace
            .scan(parsed.cursor, parsed.pattern.as_deref(), parsed.count);
        scan_reply(
            page.cursor,
            page.items.into_iter().map(RespValue::bulk_string).collect(),
        )
    }

    fn name(&self) -> &'static str {
        "SCAN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(5)
    }
}
