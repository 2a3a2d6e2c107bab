//! Version-resolving HPA watcher
//!
//! Resolves the autoscaling version served by the cluster, holds the
//! registered event handlers and drives the list-then-watch stream on its
//! own task.

use super::platform::{Platform, WatchEvent};
use super::raw::RawHpa;
use super::version::{HpaVersion, HPA_GROUP, HPA_RESOURCE};
use crate::domain::WorkloadKey;
use crate::error::WatchError;

use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Receives raw HPA change notifications
///
/// Handlers are called synchronously from the watch task and must not block.
pub trait HpaEventHandler: Send + Sync {
    /// A new object was observed. `is_initial_list` is set for objects
    /// returned by a full listing rather than the live stream.
    fn on_add(&self, obj: &RawHpa, is_initial_list: bool);

    /// A known object changed
    fn on_update(&self, old: &RawHpa, new: &RawHpa);

    /// An object was removed
    fn on_delete(&self, obj: &RawHpa);
}

/// Token for a registered handler, consumed by [`HpaWatcher::stop`]
#[derive(Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: u64,
    version: HpaVersion,
}

impl SubscriptionHandle {
    /// Version the handler was registered for
    pub fn version(&self) -> HpaVersion {
        self.version
    }
}

#[derive(Default)]
struct HandlerRegistry {
    handlers: RwLock<Vec<(u64, Arc<dyn HpaEventHandler>)>>,
}

impl HandlerRegistry {
    fn register(&self, id: u64, handler: Arc<dyn HpaEventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
    }

    fn unregister(&self, id: u64) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    fn is_empty(&self) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn dispatch(&self, notification: &Notification) {
        // Clone out so handlers run without holding the lock
        let handlers: Vec<Arc<dyn HpaEventHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            match notification {
                Notification::Add { obj, initial } => handler.on_add(obj, *initial),
                Notification::Update { old, new } => handler.on_update(old, new),
                Notification::Delete { obj } => handler.on_delete(obj),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Notification {
    Add { obj: RawHpa, initial: bool },
    Update { old: RawHpa, new: RawHpa },
    Delete { obj: RawHpa },
}

/// Last seen object per key, used to turn watch events into
/// add/update/delete notifications
#[derive(Debug, Default)]
struct EventCache {
    objects: HashMap<WorkloadKey, RawHpa>,
    relist: Option<HashSet<WorkloadKey>>,
}

impl EventCache {
    fn apply(&mut self, event: WatchEvent) -> Vec<Notification> {
        match event {
            WatchEvent::Init => {
                self.relist = Some(HashSet::new());
                Vec::new()
            }
            WatchEvent::InitApply(obj) => {
                let Some(key) = Self::key_of(&obj) else {
                    return Vec::new();
                };
                if let Some(seen) = self.relist.as_mut() {
                    seen.insert(key.clone());
                }
                vec![self.upsert(key, obj, true)]
            }
            WatchEvent::InitDone => {
                let Some(seen) = self.relist.take() else {
                    return Vec::new();
                };
                let mut stale: Vec<WorkloadKey> = self
                    .objects
                    .keys()
                    .filter(|key| !seen.contains(*key))
                    .cloned()
                    .collect();
                stale.sort();
                stale
                    .into_iter()
                    .filter_map(|key| self.objects.remove(&key))
                    .map(|obj| Notification::Delete { obj })
                    .collect()
            }
            WatchEvent::Apply(obj) => {
                let Some(key) = Self::key_of(&obj) else {
                    return Vec::new();
                };
                vec![self.upsert(key, obj, false)]
            }
            WatchEvent::Delete(obj) => {
                if let Some(key) = Self::key_of(&obj) {
                    self.objects.remove(&key);
                }
                vec![Notification::Delete { obj }]
            }
        }
    }

    fn upsert(&mut self, key: WorkloadKey, obj: RawHpa, initial: bool) -> Notification {
        match self.objects.insert(key, obj.clone()) {
            Some(old) => Notification::Update { old, new: obj },
            None => Notification::Add { obj, initial },
        }
    }

    fn key_of(obj: &RawHpa) -> Option<WorkloadKey> {
        match obj.key() {
            Ok(key) => Some(key),
            Err(e) => {
                log::warn!("[watcher] skipping object without identity: {}", e);
                None
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.objects.len()
    }
}

/// Watches HorizontalPodAutoscalers at one resolved version
pub struct HpaWatcher<P: Platform> {
    platform: Arc<P>,
    version: Mutex<Option<HpaVersion>>,
    registry: Arc<HandlerRegistry>,
    next_id: AtomicU64,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
    started: Mutex<bool>,
}

impl<P: Platform> HpaWatcher<P> {
    /// Create a watcher over the given platform
    pub fn new(platform: Arc<P>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            platform,
            version: Mutex::new(None),
            registry: Arc::new(HandlerRegistry::default()),
            next_id: AtomicU64::new(1),
            stop_tx,
            task: Mutex::new(None),
            started: Mutex::new(false),
        }
    }

    /// Discover the first known HPA version served by the cluster
    pub async fn resolve(&self) -> Result<HpaVersion, WatchError> {
        let served = self
            .platform
            .served_versions(HPA_GROUP, HPA_RESOURCE)
            .await?;
        let version = HpaVersion::pick(&served)?;
        log::info!(
            "[watcher] resolved {}/{} to version {} (served: {})",
            HPA_GROUP,
            HPA_RESOURCE,
            version,
            served.join(", ")
        );
        Ok(version)
    }

    /// Register a handler for `version`
    ///
    /// All registrations must share one version.
    pub fn subscribe(
        &self,
        version: HpaVersion,
        handler: Arc<dyn HpaEventHandler>,
    ) -> Result<SubscriptionHandle, WatchError> {
        let mut current = self.version.lock().unwrap_or_else(PoisonError::into_inner);
        match *current {
            Some(active) if active != version => {
                return Err(WatchError::Subscription(format!(
                    "already subscribed at {}, cannot subscribe at {}",
                    active, version
                )));
            }
            _ => *current = Some(version),
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.register(id, handler);
        log::debug!("[watcher] registered handler {} for {}", id, version);
        Ok(SubscriptionHandle { id, version })
    }

    /// Spawn the watch task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), WatchError> {
        if self.registry.is_empty() {
            return Err(WatchError::Subscription(
                "no handler registered".to_string(),
            ));
        }
        let version = self
            .version()
            .ok_or_else(|| WatchError::Subscription("no version subscribed".to_string()))?;

        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
        if *started {
            return Err(WatchError::Subscription(
                "watcher already started".to_string(),
            ));
        }
        *started = true;

        let stream = self.platform.watch(version);
        let registry = Arc::clone(&self.registry);
        let stop_rx = self.stop_tx.subscribe();
        let task = tokio::spawn(run_watch(version, stream, registry, stop_rx));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        log::info!("[watcher] started watching {}/{}", HPA_GROUP, version);
        Ok(())
    }

    /// Unregister a handler, close the stream and wait for the watch task
    ///
    /// The stream stays open while other handlers remain registered.
    pub async fn stop(&self, handle: SubscriptionHandle) -> Result<(), WatchError> {
        if !self.registry.unregister(handle.id) {
            return Err(WatchError::Subscription(format!(
                "unknown subscription handle {}",
                handle.id
            )));
        }
        log::debug!("[watcher] unregistered handler {}", handle.id);

        if !self.registry.is_empty() {
            return Ok(());
        }

        self.stop_tx.send_replace(true);
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.await
                .map_err(|e| WatchError::Subscription(format!("watch task failed: {}", e)))?;
        }
        log::info!("[watcher] stopped");
        Ok(())
    }

    /// Subscribed version, if any
    pub fn version(&self) -> Option<HpaVersion> {
        *self.version.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the watch task is alive
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

async fn run_watch(
    version: HpaVersion,
    mut stream: BoxStream<'static, Result<WatchEvent, WatchError>>,
    registry: Arc<HandlerRegistry>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut cache = EventCache::default();

    loop {
        tokio::select! {
            biased;
            _ = async { let _ = stop_rx.wait_for(|stop| *stop).await; } => break,
            next = stream.next() => match next {
                Some(Ok(event)) => {
                    if event == WatchEvent::InitDone {
                        log::debug!("[watcher] listing complete at {}", version);
                    }
                    for notification in cache.apply(event) {
                        registry.dispatch(&notification);
                    }
                }
                Some(Err(e)) => log::warn!("[watcher] {}", e),
                None => {
                    log::warn!("[watcher] watch stream for {} ended", version);
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{raw_hpa, MockPlatform};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    struct ChannelHandler(mpsc::UnboundedSender<String>);

    impl HpaEventHandler for ChannelHandler {
        fn on_add(&self, obj: &RawHpa, is_initial_list: bool) {
            let _ = self.0.send(format!(
                "add {} initial={}",
                obj.key().unwrap(),
                is_initial_list
            ));
        }

        fn on_update(&self, old: &RawHpa, new: &RawHpa) {
            let replicas = |o: &RawHpa| o.as_value()["status"]["currentReplicas"].clone();
            let _ = self.0.send(format!(
                "update {} {}->{}",
                new.key().unwrap(),
                replicas(old),
                replicas(new)
            ));
        }

        fn on_delete(&self, obj: &RawHpa) {
            let _ = self.0.send(format!("delete {}", obj.key().unwrap()));
        }
    }

    fn channel_handler() -> (Arc<ChannelHandler>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelHandler(tx)), rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("handler channel closed")
    }

    #[test]
    fn test_cache_apply_sequence() {
        let mut cache = EventCache::default();
        let first = raw_hpa("default", "api", 2, 10);
        let second = raw_hpa("default", "api", 5, 10);

        assert!(cache.apply(WatchEvent::Init).is_empty());
        assert_eq!(
            cache.apply(WatchEvent::InitApply(first.clone())),
            vec![Notification::Add {
                obj: first.clone(),
                initial: true
            }]
        );
        assert!(cache.apply(WatchEvent::InitDone).is_empty());
        assert_eq!(
            cache.apply(WatchEvent::Apply(second.clone())),
            vec![Notification::Update {
                old: first,
                new: second.clone()
            }]
        );
        assert_eq!(
            cache.apply(WatchEvent::Delete(second.clone())),
            vec![Notification::Delete { obj: second }]
        );
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_live_apply_is_not_initial() {
        let mut cache = EventCache::default();
        let obj = raw_hpa("default", "web", 1, 3);
        assert_eq!(
            cache.apply(WatchEvent::Apply(obj.clone())),
            vec![Notification::Add {
                obj,
                initial: false
            }]
        );
    }

    #[test]
    fn test_cache_relist_deletes_missing_keys() {
        let mut cache = EventCache::default();
        let api = raw_hpa("default", "api", 1, 10);
        let web = raw_hpa("default", "web", 1, 10);
        let worker = raw_hpa("jobs", "worker", 1, 10);

        cache.apply(WatchEvent::Init);
        cache.apply(WatchEvent::InitApply(api.clone()));
        cache.apply(WatchEvent::InitApply(web.clone()));
        cache.apply(WatchEvent::InitApply(worker.clone()));
        cache.apply(WatchEvent::InitDone);

        // Relist after a reconnect only returns api
        cache.apply(WatchEvent::Init);
        let relisted = cache.apply(WatchEvent::InitApply(api.clone()));
        assert!(matches!(relisted.as_slice(), [Notification::Update { .. }]));

        assert_eq!(
            cache.apply(WatchEvent::InitDone),
            vec![
                Notification::Delete { obj: web },
                Notification::Delete { obj: worker }
            ]
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_skips_objects_without_key() {
        let mut cache = EventCache::default();
        let nameless = RawHpa::new(serde_json::json!({ "metadata": {} }));
        assert!(cache.apply(WatchEvent::Apply(nameless)).is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_resolve_picks_preferred_known_version() {
        let platform = Arc::new(MockPlatform::serving(&["v2", "v1"]));
        let watcher = HpaWatcher::new(platform);
        assert_eq!(watcher.resolve().await.unwrap(), HpaVersion::V2);
    }

    #[tokio::test]
    async fn test_resolve_unsupported() {
        let platform = Arc::new(MockPlatform::serving(&["v3"]));
        let watcher = HpaWatcher::new(platform);
        assert!(matches!(
            watcher.resolve().await,
            Err(WatchError::UnsupportedVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_discovery_failure() {
        let platform = Arc::new(MockPlatform::failing_discovery("connection refused"));
        let watcher = HpaWatcher::new(platform);
        assert!(matches!(
            watcher.resolve().await,
            Err(WatchError::DiscoveryFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_second_version() {
        let watcher = HpaWatcher::new(Arc::new(MockPlatform::serving(&["v2"])));
        let (handler, _rx) = channel_handler();

        watcher.subscribe(HpaVersion::V2, handler.clone()).unwrap();
        watcher.subscribe(HpaVersion::V2, handler.clone()).unwrap();
        assert!(matches!(
            watcher.subscribe(HpaVersion::V1, handler),
            Err(WatchError::Subscription(_))
        ));
        assert_eq!(watcher.version(), Some(HpaVersion::V2));
    }

    #[tokio::test]
    async fn test_start_requires_handler() {
        let watcher = HpaWatcher::new(Arc::new(MockPlatform::serving(&["v2"])));
        assert!(matches!(
            watcher.start(),
            Err(WatchError::Subscription(_))
        ));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let platform = Arc::new(MockPlatform::serving(&["v2"]));
        let watcher = HpaWatcher::new(platform);
        let (handler, _rx) = channel_handler();
        let handle = watcher.subscribe(HpaVersion::V2, handler).unwrap();

        watcher.start().unwrap();
        assert!(matches!(
            watcher.start(),
            Err(WatchError::Subscription(_))
        ));
        watcher.stop(handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_delivers_notifications() {
        let platform = Arc::new(MockPlatform::serving(&["v2"]));
        let watcher = HpaWatcher::new(Arc::clone(&platform));
        let (handler, mut rx) = channel_handler();
        let handle = watcher.subscribe(HpaVersion::V2, handler).unwrap();
        watcher.start().unwrap();
        assert!(watcher.is_running());
        assert_eq!(platform.watched_versions(), vec![HpaVersion::V2]);

        platform.send(WatchEvent::Init);
        platform.send(WatchEvent::InitApply(raw_hpa("default", "api", 2, 10)));
        platform.send(WatchEvent::InitDone);
        platform.send(WatchEvent::Apply(raw_hpa("default", "api", 6, 10)));
        platform.send_error(WatchError::Stream("connection reset".to_string()));
        platform.send(WatchEvent::Delete(raw_hpa("default", "api", 6, 10)));

        assert_eq!(next(&mut rx).await, "add default/api initial=true");
        assert_eq!(next(&mut rx).await, "update default/api 2->6");
        assert_eq!(next(&mut rx).await, "delete default/api");

        watcher.stop(handle).await.unwrap();
        assert!(!watcher.is_running());
    }

    #[tokio::test]
    async fn test_stop_unknown_handle() {
        let platform = Arc::new(MockPlatform::serving(&["v2"]));
        let watcher = HpaWatcher::new(Arc::clone(&platform));
        let other = HpaWatcher::new(platform);
        let (handler, _rx) = channel_handler();

        let handle = other.subscribe(HpaVersion::V2, handler).unwrap();
        assert!(matches!(
            watcher.stop(handle).await,
            Err(WatchError::Subscription(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_keeps_stream_for_remaining_handlers() {
        let platform = Arc::new(MockPlatform::serving(&["v2"]));
        let watcher = HpaWatcher::new(Arc::clone(&platform));
        let (first, _first_rx) = channel_handler();
        let (second, mut second_rx) = channel_handler();
        let first = watcher.subscribe(HpaVersion::V2, first).unwrap();
        let second_handle = watcher.subscribe(HpaVersion::V2, second).unwrap();
        watcher.start().unwrap();

        watcher.stop(first).await.unwrap();
        assert!(watcher.is_running());

        platform.send(WatchEvent::Apply(raw_hpa("default", "api", 1, 2)));
        assert_eq!(next(&mut second_rx).await, "add default/api initial=false");

        watcher.stop(second_handle).await.unwrap();
        assert!(!watcher.is_running());
    }
}
