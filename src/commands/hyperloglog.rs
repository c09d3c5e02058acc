//! Cardinality sketch commands (PFADD, PFCOUNT, PFMERGE)

use super::{bulk_arg, bulk_args, Command, CommandContext};
use crate::protocol::RespValue;

/// PFADD command - Add elements to a cardinality sketch
///
/// Syntax: PFADD key [element ...]
///
/// Replies 1 when the sketch was created or any register changed, 0 otherwise.
pub struct PfAddCommand;

impl Command for PfAddCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let elements = match bulk_args(args, 1) {
            Ok(e) => e,
            Err(e) => return e,
        };

        match ctx.keyspace.pfadd(key, &elements) {
            Ok(changed) => RespValue::integer(changed as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "PFADD"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// PFCOUNT command - Estimate the number of distinct elements
///
/// Syntax: PFCOUNT key [key ...]
///
/// With several keys the estimate covers their union; no key is modified.
pub struct PfCountCommand;

impl Command for PfCountCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let keys = match bulk_args(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.pfcount(&keys) {
            Ok(count) => RespValue::integer(count as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "PFCOUNT"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// PFMERGE command - Merge several sketches into one
///
/// Syntax: PFMERGE destkey [sourcekey ...]
pub struct PfMergeCommand;

impl Command for PfMergeCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let dest = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let sources = match bulk_args(args, 1) {
            Ok(s) => s,
            Err(e) => return e,
        };

        match ctx.keyspace.pfmerge(dest, &sources) {
            Ok(()) => RespValue::simple_string("OK"),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "PFMERGE"
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

    fn fill(ctx: &CommandContext, key: &str, range: std::ops::Range<u32>) {
        let mut batch = vec![RespValue::bulk_string(key.to_string())];
        batch.extend(range.map(|i| RespValue::bulk_string(format!("element:{}", i))));
        PfAddCommand.execute(ctx, &batch);
    }

    fn count(ctx: &CommandContext, keys: &[&str]) -> i64 {
        PfCountCommand.execute(ctx, &args(keys)).as_integer().unwrap()
    }

    #[test]
    fn test_pfadd_reports_change() {
        let ctx = CommandContext::new();
        assert_eq!(PfAddCommand.execute(&ctx, &args(&["hll", "a", "b"])), RespValue::integer(1));
        assert_eq!(PfAddCommand.execute(&ctx, &args(&["hll", "a", "b"])), RespValue::integer(0));
        assert_eq!(count(&ctx, &["hll"]), 2);
    }

    #[test]
    fn test_pfcount_estimate() {
        let ctx = CommandContext::new();
        fill(&ctx, "visitors", 0..100_000);

        let estimate = count(&ctx, &["visitors"]) as f64;
        let error = (estimate - 100_000.0).abs() / 100_000.0;
        assert!(error < 0.03, "estimate {} too far off", estimate);
    }

    #[test]
    fn test_pfmerge_union() {
        let ctx = CommandContext::new();
        fill(&ctx, "a", 0..60_000);
        fill(&ctx, "b", 40_000..100_000);

        assert_eq!(
            PfMergeCommand.execute(&ctx, &args(&["both", "a", "b"])),
            RespValue::simple_string("OK")
        );
        let estimate = count(&ctx, &["both"]) as f64;
        assert!((estimate - 100_000.0).abs() / 100_000.0 < 0.03);

        let union = count(&ctx, &["a", "b"]) as f64;
        assert!((union - 100_000.0).abs() / 100_000.0 < 0.03);
    }

    #[test]
    fn test_sketch_type_checks() {
        let ctx = CommandContext::new();
        ctx.keyspace.set(Bytes::from("plain"), Bytes::from("v")).unwrap();
        assert!(PfAddCommand.execute(&ctx, &args(&["plain", "x"])).is_error());

        PfAddCommand.execute(&ctx, &args(&["hll", "x"]));
        assert!(ctx.keyspace.get_string(&Bytes::from("hll")).is_err());
    }
}
