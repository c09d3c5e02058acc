//! Stream commands (XADD, XLEN, XRANGE)

use super::{bulk_arg, int_arg, is_option, pair_args, Command, CommandContext};
use crate::error::StoreError;
use crate::protocol::RespValue;
use crate::store::{IdRequest, StreamFields, StreamId};

/// XADD command - Append an entry to a stream
///
/// Syntax: XADD key <* | ms-* | ms-seq> field value [field value ...]
///
/// Replies with the id of the new entry.
pub struct XAddCommand;

impl Command for XAddCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let id = match bulk_arg(args, 1).and_then(|raw| IdRequest::parse(&raw).map_err(Into::into)) {
            Ok(id) => id,
            Err(e) => return e,
        };
        let fields = match pair_args(self.name(), args, 2) {
            Ok(f) => f,
            Err(e) => return e,
        };

        match ctx.keyspace.xadd(key, id, fields) {
            Ok(id) => RespValue::bulk_string(id.to_string()),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "XADD"
    }

    fn min_args(&self) -> usize {
        4
    }
}

/// XLEN command - Get the number of entries in a stream
///
/// Syntax: XLEN key
pub struct XLenCommand;

impl Command for XLenCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.xlen(&key) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "XLEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// XRANGE command - Get entries within an id range
///
/// Syntax: XRANGE key start end [COUNT count]
///
/// `-` and `+` stand for the lowest and highest possible ids.
pub struct XRangeCommand;

impl Command for XRangeCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let start = match bound_arg(args, 1, true) {
            Ok(id) => id,
            Err(e) => return e,
        };
        let end = match bound_arg(args, 2, false) {
            Ok(id) => id,
            Err(e) => return e,
        };

        let count = match args.get(3) {
            None => None,
            Some(option) if is_option(option, "COUNT") && args.len() == 5 => {
                match int_arg(args, 4) {
                    Ok(n) => Some(n.max(0) as usize),
                    Err(e) => return e,
                }
            }
            Some(_) => return StoreError::Syntax.into(),
        };

        match ctx.keyspace.xrange(&key, start, end, count) {
            Ok(entries) => RespValue::array(
                entries
                    .into_iter()
                    .map(|(id, fields)| entry_reply(id, fields))
                    .collect(),
            ),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "XRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(5)
    }
}

fn bound_arg(args: &[RespValue], index: usize, is_start: bool) -> Result<StreamId, RespValue> {
    let raw = bulk_arg(args, index)?;
    StreamId::parse_bound(&raw, is_start).map_err(Into::into)
}

/// `[id, [field, value, ...]]`
fn entry_reply(id: StreamId, fields: StreamFields) -> RespValue {
    RespValue::array(vec![
        RespValue::bulk_string(id.to_string()),
        RespValue::bulk_array(fields.into_iter().flat_map(|(f, v)| [f, v])),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<RespValue> {
        parts.iter().map(|p| RespValue::bulk_string(p.to_string())).collect()
    }

    #[test]
    fn test_xadd_explicit_ids() {
        let ctx = CommandContext::new();
        assert_eq!(
            XAddCommand.execute(&ctx, &args(&["events", "1-1", "kind", "login"])),
            RespValue::bulk_string("1-1")
        );
        assert_eq!(
            XAddCommand.execute(&ctx, &args(&["events", "1-*", "kind", "click"])),
            RespValue::bulk_string("1-2")
        );
        assert_eq!(
            XAddCommand.execute(&ctx, &args(&["events", "1-1", "kind", "late"])),
            RespValue::error(
                "ERR The ID specified in XADD is equal or smaller than the target stream top item"
            )
        );
        assert_eq!(XLenCommand.execute(&ctx, &args(&["events"])), RespValue::integer(2));
    }

    #[test]
    fn test_xadd_auto_id() {
        let ctx = CommandContext::new();
        let first = XAddCommand.execute(&ctx, &args(&["s", "*", "f", "v"]));
        let second = XAddCommand.execute(&ctx, &args(&["s", "*", "f", "v"]));
        assert!(first.as_bulk_string().is_some());
        assert_ne!(first, second);
        assert_eq!(
            ctx.keyspace.type_of(&"s".into()).map(|k| k.type_name()),
            Some("stream")
        );
    }

    #[test]
    fn test_xadd_bad_input() {
        let ctx = CommandContext::new();
        assert!(XAddCommand.execute(&ctx, &args(&["s", "abc", "f", "v"])).is_error());
        assert!(XAddCommand.execute(&ctx, &args(&["s", "1-1", "f"])).is_error());
        assert_eq!(XLenCommand.execute(&ctx, &args(&["s"])), RespValue::integer(0));
    }

    #[test]
    fn test_xrange() {
        let ctx = CommandContext::new();
        for id in ["1-0", "2-0", "2-1", "3-0"] {
            XAddCommand.execute(&ctx, &args(&["s", id, "n", id]));
        }

        let all = XRangeCommand.execute(&ctx, &args(&["s", "-", "+"]));
        assert_eq!(all.as_array().unwrap().len(), 4);

        let within = XRangeCommand.execute(&ctx, &args(&["s", "2", "2"]));
        assert_eq!(within.as_array().unwrap().len(), 2);

        let limited = XRangeCommand.execute(&ctx, &args(&["s", "-", "+", "COUNT", "1"]));
        assert_eq!(
            limited,
            RespValue::array(vec![RespValue::array(vec![
                RespValue::bulk_string("1-0"),
                RespValue::bulk_array(["n", "1-0"]),
            ])])
        );

        assert!(XRangeCommand.execute(&ctx, &args(&["s", "-", "+", "LIMIT", "1"])).is_error());
    }
}
