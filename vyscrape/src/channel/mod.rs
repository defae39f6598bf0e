//! Channel layer for collecting interactive shell output.
//!
//! This module handles turning a live shell into a byte buffer:
//! escape stripping as data arrives, and the idle/overall bounded wait
//! that decides when the device has finished talking.

mod buffer;
mod collect;

pub use buffer::OutputBuffer;
pub use collect::{Budget, DRAIN_LIMIT, StopReason, collect, drain_available};
