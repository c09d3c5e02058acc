//! Command execution module
//!
//! Provides a unified interface for all commands through the Command trait.
//! Each command family is implemented in a separate file for high cohesion.

mod context;
mod registry;

// Command implementations
mod admin;
mod counter;
mod hash;
mod hyperloglog;
mod key;
mod list;
mod search;
mod set;
mod stream;
mod string;
mod zset;

pub use context::CommandContext;
pub use registry::CommandRegistry;

use bytes::Bytes;

use crate::error::StoreError;
use crate::protocol::RespValue;

/// Command execution trait
///
/// All commands implement this trait with a single execute method.
/// This provides loose coupling between command implementations and the dispatcher.
pub trait Command: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: the command context (shared; the keyspace synchronizes itself)
    /// - args: command arguments (excluding the command name itself)
    ///
    /// Returns:
    /// - RespValue representing the reply
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue;

    /// Get the command name (for debugging/logging)
    fn name(&self) -> &'static str;

    /// Get the minimum number of arguments required
    fn min_args(&self) -> usize {
        0
    }

    /// Get the maximum number of arguments (None = unlimited)
    fn max_args(&self) -> Option<usize> {
        None
    }
}

impl From<StoreError> for RespValue {
    fn from(err: StoreError) -> Self {
        RespValue::error(err.to_string())
    }
}

/// Helper function to extract bulk string from RespValue
pub(crate) fn extract_bulk_string(value: &RespValue) -> Result<&Bytes, &'static str> {
    value.as_bulk_string().ok_or("Expected bulk string")
}

/// Helper function to extract integer from RespValue or parse from bulk string
pub(crate) fn extract_integer(value: &RespValue) -> Result<i64, &'static str> {
    match value {
        RespValue::Integer(i) => Ok(*i),
        RespValue::BulkString(bytes) => {
            let s = std::str::from_utf8(bytes).map_err(|_| "Invalid UTF-8")?;
            s.parse::<i64>().map_err(|_| "Invalid integer")
        }
        _ => Err("Expected integer or bulk string"),
    }
}

/// Error reply for a bad argument count
pub(crate) fn wrong_arity(name: &str) -> RespValue {
    RespValue::error(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_lowercase()
    ))
}

/// Bulk string argument at `index`
pub(crate) fn bulk_arg(args: &[RespValue], index: usize) -> Result<Bytes, RespValue> {
    match args.get(index).map(extract_bulk_string) {
        Some(Ok(bytes)) => Ok(bytes.clone()),
        Some(Err(e)) => Err(RespValue::error(format!("ERR {}", e))),
        None => Err(StoreError::Syntax.into()),
    }
}

/// Every argument from `from` on, as bulk strings
pub(crate) fn bulk_args(args: &[RespValue], from: usize) -> Result<Vec<Bytes>, RespValue> {
    (from..args.len()).map(|i| bulk_arg(args, i)).collect()
}

/// Integer argument at `index`
pub(crate) fn int_arg(args: &[RespValue], index: usize) -> Result<i64, RespValue> {
    match args.get(index) {
        Some(value) => extract_integer(value).map_err(|_| StoreError::NotAnInteger.into()),
        None => Err(StoreError::Syntax.into()),
    }
}

/// `start stop` index pair at `index`
pub(crate) fn range_args(args: &[RespValue], index: usize) -> Result<(i64, i64), RespValue> {
    let start = int_arg(args, index).map_err(|_| RespValue::from(StoreError::InvalidRange))?;
    let stop = int_arg(args, index + 1).map_err(|_| RespValue::from(StoreError::InvalidRange))?;
    Ok((start, stop))
}

/// Float argument at `index` (`inf`, `-inf` accepted)
pub(crate) fn float_arg(args: &[RespValue], index: usize) -> Result<f64, RespValue> {
    let raw = bulk_arg(args, index)?;
    std::str::from_utf8(&raw)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| StoreError::NotAFloat.into())
}

/// Field/value (or key/value) pairs from `from` on
pub(crate) fn pair_args(
    name: &str,
    args: &[RespValue],
    from: usize,
) -> Result<Vec<(Bytes, Bytes)>, RespValue> {
    let rest = args.len().saturating_sub(from);
    if rest == 0 || rest % 2 != 0 {
        return Err(wrong_arity(name));
    }
    let flat = bulk_args(args, from)?;
    Ok(flat
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Case-insensitive match of an option keyword
pub(crate) fn is_option(value: &RespValue, option: &str) -> bool {
    value
        .as_bulk_string()
        .map_or(false, |b| b.eq_ignore_ascii_case(option.as_bytes()))
}

/// Parsed arguments of the SCAN family
#[derive(Debug, Default)]
pub(crate) struct ScanArgs {
    pub cursor: u64,
    pub pattern: Option<Bytes>,
    pub count: Option<usize>,
}

/// Parse `cursor [MATCH pattern] [COUNT count]` starting at `index`
pub(crate) fn scan_args(args: &[RespValue], index: usize) -> Result<ScanArgs, RespValue> {
    let cursor = bulk_arg(args, index)?;
    let cursor = std::str::from_utf8(&cursor)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| RespValue::error("ERR invalid cursor"))?;

    let mut parsed = ScanArgs {
        cursor,
        ..ScanArgs::default()
    };
    let mut i = index + 1;
    while i < args.len() {
        if is_option(&args[i], "MATCH") {
            parsed.pattern = Some(bulk_arg(args, i + 1)?);
        } else if is_option(&args[i], "COUNT") {
            let count = int_arg(args, i + 1)?;
            if count < 1 {
                return Err(StoreError::Syntax.into());
            }
            parsed.count = Some(count as usize);
        } else {
            return Err(StoreError::Syntax.into());
        }
        i += 2;
    }
    Ok(parsed)
}

/// Reply for one scan step: `[cursor, [items...]]`
pub(crate) fn scan_reply(cursor: u64, items: Vec<RespValue>) -> RespValue {
    RespValue::array(vec![
        RespValue::bulk_string(cursor.to_string()),
        RespValue::array(items),
    ])
}
