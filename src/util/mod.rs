//! Utility modules
//!
//! - [`stream`]: deterministic, seekable pseudorandom payload stream
//! - [`time`]: wall-clock timestamps and human-readable formatting

pub mod stream;
pub mod time;
