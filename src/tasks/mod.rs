//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Collector: runs a cleanup function at a fixed interval until stopped

mod collector;

pub use collector::Collector;
