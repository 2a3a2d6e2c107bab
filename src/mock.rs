//! Mock implementations for testing
//!
//! Provides a scripted platform, recording/failing notifiers and a recording
//! alert sink so the pipeline can be tested without a cluster.

use crate::alerts::{Alert, AlertSink, Notifier};
use crate::error::{DeliveryError, WatchError};
use crate::watch::{HpaVersion, Platform, RawHpa, WatchEvent};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

type EventResult = Result<WatchEvent, WatchError>;

/// Mock platform with scripted discovery and a channel-fed watch stream
pub struct MockPlatform {
    served: Result<Vec<String>, String>,
    sender: mpsc::UnboundedSender<EventResult>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<EventResult>>>,
    watched: Mutex<Vec<HpaVersion>>,
}

impl MockPlatform {
    fn with_discovery(served: Result<Vec<String>, String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            served,
            sender,
            receiver: Mutex::new(Some(receiver)),
            watched: Mutex::new(Vec::new()),
        }
    }

    /// Platform serving the given versions, most preferred first
    pub fn serving(versions: &[&str]) -> Self {
        Self::with_discovery(Ok(versions.iter().map(|v| v.to_string()).collect()))
    }

    /// Platform whose discovery request fails
    pub fn failing_discovery(message: &str) -> Self {
        Self::with_discovery(Err(message.to_string()))
    }

    /// Push an event into the watch stream
    pub fn send(&self, event: WatchEvent) {
        let _ = self.sender.send(Ok(event));
    }

    /// Push a stream error into the watch stream
    pub fn send_error(&self, error: WatchError) {
        let _ = self.sender.send(Err(error));
    }

    /// Versions passed to `watch`, in call order
    pub fn watched_versions(&self) -> Vec<HpaVersion> {
        self.watched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn served_versions(
        &self,
        _group: &str,
        _resource: &str,
    ) -> Result<Vec<String>, WatchError> {
        self.served
            .clone()
            .map_err(WatchError::DiscoveryFailure)
    }

    fn watch(&self, version: HpaVersion) -> BoxStream<'static, EventResult> {
        self.watched.lock().unwrap().push(version);
        match self.receiver.lock().unwrap().take() {
            Some(rx) => stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|event| (event, rx))
            })
            .boxed(),
            None => stream::empty().boxed(),
        }
    }
}

/// Notifier forwarding every alert to a channel
pub struct RecordingNotifier {
    name: String,
    sender: mpsc::UnboundedSender<Alert>,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    /// Create a notifier and the receiver of its deliveries
    pub fn new(name: &str) -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                name: name.to_string(),
                sender,
                delay: None,
            },
            receiver,
        )
    }

    /// Sleep before every delivery
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let _ = self.sender.send(alert.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}

/// Notifier that fails every delivery and counts attempts
pub struct FailingNotifier {
    name: String,
    attempts: Arc<AtomicUsize>,
}

impl FailingNotifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared attempt counter
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _alert: &Alert) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Rejected {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

/// Alert sink keeping every reported alert
#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingSink {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingSink {
    fn report(&self, alert: Alert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

/// autoscaling/v2 HPA payload
pub fn raw_hpa(namespace: &str, name: &str, current_replicas: i32, max_replicas: i32) -> RawHpa {
    RawHpa::new(json!({
        "apiVersion": "autoscaling/v2",
        "kind": "HorizontalPodAutoscaler",
        "metadata": { "name": name, "namespace": namespace },
        "spec": {
            "minReplicas": 1,
            "maxReplicas": max_replicas,
            "scaleTargetRef": { "apiVersion": "apps/v1", "kind": "Deployment", "name": name }
        },
        "status": {
            "currentReplicas": current_replicas,
            "desiredReplicas": current_replicas
        }
    }))
}
