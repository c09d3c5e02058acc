//! Sorted set commands (ZADD, ZRANGE, ZRANK, ZREVRANK, ZSCORE, ZCARD, ZREM, ZREMRANGEBYRANK)

use super::{
    bulk_arg, bulk_args, float_arg, is_option, range_args, wrong_arity, Command, CommandContext,
};
use crate::error::StoreError;
use crate::protocol::RespValue;
use crate::store::format_float;

/// ZADD command - Add members with scores to a sorted set
///
/// Syntax: ZADD key score member [score member ...]
///
/// Replies with the number of new members; updating a score does not count.
pub struct ZAddCommand;

impl Command for ZAddCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        if args.len() < 3 || (args.len() - 1) % 2 != 0 {
            return wrong_arity(self.name());
        }

        let mut pairs = Vec::with_capacity((args.len() - 1) / 2);
        for i in (1..args.len()).step_by(2) {
            let score = match float_arg(args, i) {
                Ok(s) => s,
                Err(e) => return e,
            };
            let member = match bulk_arg(args, i + 1) {
                Ok(m) => m,
                Err(e) => return e,
            };
            pairs.push((score, member));
        }

        match ctx.keyspace.zadd(key, pairs) {
            Ok(added) => RespValue::integer(added as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "ZADD"
    }

    fn min_args(&self) -> usize {
        3
    }
}

/// ZRANGE command - Get members by rank, lowest score first
///
/// Syntax: ZRANGE key start stop [WITHSCORES]
pub struct ZRangeCommand;

impl Command for ZRangeCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let (start, stop) = match range_args(args, 1) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let with_scores = match args.get(3) {
            None => false,
            Some(option) if is_option(option, "WITHSCORES") => true,
            Some(_) => return StoreError::Syntax.into(),
        };

        match ctx.keyspace.zrange(&key, start, stop) {
            Ok(members) => {
                let mut reply = Vec::with_capacity(members.len() * if with_scores { 2 } else { 1 });
                for (member, score) in members {
                    reply.push(RespValue::bulk_string(member));
                    if with_scores {
                        reply.push(RespValue::bulk_string(format_float(score)));
                    }
                }
                RespValue::array(reply)
            }
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "ZRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
}

/// ZRANK command - Get the ascending rank of a member
///
/// Syntax: ZRANK key member
pub struct ZRankCommand;

impl Command for ZRankCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        rank_reply(ctx, args, false)
    }

    fn name(&self) -> &'static str {
        "ZRANK"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// ZREVRANK command - Get the descending rank of a member
///
/// Syntax: ZREVRANK key member
///
/// The highest-scored member has rank 0.
pub struct ZRevRankCommand;

impl Command for ZRevRankCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        rank_reply(ctx, args, true)
    }

    fn name(&self) -> &'static str {
        "ZREVRANK"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

fn rank_reply(ctx: &CommandContext, args: &[RespValue], reverse: bool) -> RespValue {
    let key = match bulk_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let member = match bulk_arg(args, 1) {
        Ok(m) => m,
        Err(e) => return e,
    };

    let rank = if reverse {
        ctx.keyspace.zrevrank(&key, &member)
    } else {
        ctx.keyspace.zrank(&key, &member)
    };
    match rank {
        Ok(Some(rank)) => RespValue::integer(rank as i64),
        Ok(None) => RespValue::null(),
        Err(e) => e.into(),
    }
}

/// ZSCORE command - Get the score of a member
///
/// Syntax: ZSCORE key member
pub struct ZScoreCommand;

impl Command for ZScoreCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let member = match bulk_arg(args, 1) {
            Ok(m) => m,
            Err(e) => return e,
        };

        match ctx.keyspace.zscore(&key, &member) {
            Ok(score) => RespValue::bulk_or_null(score.map(format_float)),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "ZSCORE"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// ZCARD command - Get the number of members in a sorted set
///
/// Syntax: ZCARD key
pub struct ZCardCommand;

impl Command for ZCardCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };

        match ctx.keyspace.zcard(&key) {
            Ok(len) => RespValue::integer(len as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "ZCARD"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// ZREM command - Remove members from a sorted set
///
/// Syntax: ZREM key member [member ...]
pub struct ZRemCommand;

impl Command for ZRemCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let members = match bulk_args(args, 1) {
            Ok(m) => m,
            Err(e) => return e,
        };

        match ctx.keyspace.zrem(&key, &members) {
            Ok(removed) => RespValue::integer(removed as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "ZREM"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// ZREMRANGEBYRANK command - Remove members within a rank range
///
/// Syntax: ZREMRANGEBYRANK key start stop
pub struct ZRemRangeByRankCommand;

impl Command for ZRemRangeByRankCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let key = match bulk_arg(args, 0) {
            Ok(k) => k,
            Err(e) => return e,
        };
        let (start, stop) = match range_args(args, 1) {
            Ok(r) => r,
            Err(e) => return e,
        };

        match ctx.keyspace.zremrangebyrank(&key, start, stop) {
            Ok(removed) => RespValue::integer(removed as i64),
            Err(e) => e.into(),
        }
    }

    fn name(&self) -> &'static str {
        "ZREMRANGEBYRANK"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}
