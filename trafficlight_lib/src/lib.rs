//! A traffic light that switches phases on its own thread and publishes every switch through a blocking queue.

#![deny(missing_docs)]

pub mod config;
pub mod core;
pub mod error;
pub mod light;
pub mod queue;
pub mod shutdown;
