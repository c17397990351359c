//! Shared sink utilities
//!
//! - **evicting_buffer**: Fixed-capacity FIFO that drops the oldest element
//! - **rate_limited_logger**: Warn-level logging that collapses bursts

pub mod evicting_buffer;
pub mod rate_limited_logger;

pub use evicting_buffer::BoundedEvictingBuffer;
pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
