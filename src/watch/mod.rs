//! HorizontalPodAutoscaler watch layer
//!
//! Discovery of the served autoscaling version, per-version normalization
//! and the watch task that feeds registered handlers.

pub mod cluster;
pub mod normalize;
pub mod platform;
pub mod raw;
pub mod version;
pub mod watcher;

pub use cluster::KubePlatform;
pub use normalize::normalize;
pub use platform::{Platform, WatchEvent};
pub use raw::RawHpa;
pub use version::HpaVersion;
pub use watcher::{HpaEventHandler, HpaWatcher, SubscriptionHandle};
