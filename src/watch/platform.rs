//! Platform abstraction
//!
//! The watcher only needs two things from the cluster: the list of served
//! versions for a resource, and a stream of change events for one version.
//! This trait keeps the watcher testable without a real API server.

use super::raw::RawHpa;
use super::version::HpaVersion;
use crate::error::WatchError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Change event delivered by a watch stream
///
/// Mirrors the list-then-watch protocol: `Init`, zero or more `InitApply`,
/// `InitDone`, then live `Apply`/`Delete` events. A relist after a dropped
/// connection repeats the `Init..InitDone` sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Object created or modified
    Apply(RawHpa),
    /// Object deleted
    Delete(RawHpa),
    /// A full listing is starting
    Init,
    /// Object returned by the current listing
    InitApply(RawHpa),
    /// The current listing is complete
    InitDone,
}

/// Cluster capabilities consumed by the watcher
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// Versions of `group` serving `resource`, most preferred first
    async fn served_versions(&self, group: &str, resource: &str)
        -> Result<Vec<String>, WatchError>;

    /// Open a list-then-watch stream of HPAs at `version` across all namespaces
    fn watch(&self, version: HpaVersion) -> BoxStream<'static, Result<WatchEvent, WatchError>>;
}
