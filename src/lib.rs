//! dstcheck library - DST transition tracking
//!
//! This module exports internal components for integration testing.

pub mod cli;
pub mod config;
pub mod error;
pub mod invoker;
pub mod offset;
pub mod oracle;
pub mod reconcile;
pub mod record;
pub mod redact;
pub mod run;
pub mod store;
