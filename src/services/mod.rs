//! Service layer
//!
//! The monitor ties the watch layer and the alert pipeline together.

pub mod monitor;

pub use monitor::Monitor;
