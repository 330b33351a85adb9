#![forbid(unsafe_code)]

//! Permission audit runtime.
//!
//! Wraps the kernel with event sources, lazily loaded event streams,
//! reference snapshot storage, reconciliation and configuration.
//!
//! No folding logic lives here — every snapshot is produced by the kernel.

pub mod raw;
pub mod bridge;
pub mod source;
pub mod stream;
pub mod replay;
pub mod snapshot_codec;
pub mod reconcile;
pub mod config;
