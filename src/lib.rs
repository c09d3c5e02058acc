//! FerrumKV - An embeddable, in-memory, multi-type key-value store
//!
//! FerrumKV keeps the layering of a small server without the server:
//! - `store` holds the sharded keyspace and every value type
//! - `commands` turns argument arrays into typed keyspace calls
//! - `dispatch` looks commands up, checks arity and runs them
//! - `protocol` is the shared argument/reply value model
//!
//! ```
//! use ferrumkv::{Dispatcher, RespValue};
//!
//! let db = Dispatcher::new();
//! db.call(["RPUSH", "queue", "a", "b"]);
//! assert_eq!(db.call(["LRANGE", "queue", "0", "-1"]), RespValue::bulk_array(["a", "b"]));
//! ```

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod store;

/// Re-export commonly used types
pub use commands::{Command, CommandContext};
pub use config::StoreConfig;
pub use dispatch::Dispatcher;
pub use error::{StoreError, StoreResult};
pub use protocol::RespValue;
pub use store::{Entry, Keyspace, ScanPage, SetCondition, Value, ValueKind};
