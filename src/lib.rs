//! Dotlink (workspace facade crate).
//!
//! Exposes `dotlink::{core,adapter,types}` while the implementation lives in
//! dedicated crates under `crates/`.

pub mod logging;

pub use dotlink_adapter as adapter;
pub use dotlink_core as core;
pub use dotlink_types as types;
