//! Reply value types
//!
//! Independent from the store and command modules (loose coupling).

mod types;

pub use types::RespValue;
