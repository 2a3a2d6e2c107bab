//! Kubernetes-backed platform
//!
//! Uses kube discovery to find the served autoscaling versions and
//! `kube::runtime::watcher` over `DynamicObject` so a single code path can
//! watch any of the known versions.

use super::platform::{Platform, WatchEvent};
use super::raw::RawHpa;
use super::version::{HpaVersion, HPA_GROUP, HPA_KIND};
use crate::error::WatchError;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use kube::api::Api;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::runtime::watcher::{self, Event};
use kube::runtime::WatchStreamExt;
use kube::{Client, Config};
use std::path::Path;

/// Platform implementation talking to a real API server
#[derive(Clone)]
pub struct KubePlatform {
    client: Client,
}

impl KubePlatform {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect with an explicit kubeconfig path, or in-cluster credentials
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self, WatchError> {
        let config = match kubeconfig {
            Some(path) => {
                log::info!("[kubernetes] using kubeconfig {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    WatchError::ClientFailure(format!("{}: {}", path.display(), e))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| WatchError::ClientFailure(e.to_string()))?
            }
            None => {
                log::info!("[kubernetes] using in-cluster configuration");
                Config::incluster().map_err(|e| WatchError::ClientFailure(e.to_string()))?
            }
        };

        let client =
            Client::try_from(config).map_err(|e| WatchError::ClientFailure(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Platform for KubePlatform {
    async fn served_versions(
        &self,
        group: &str,
        resource: &str,
    ) -> Result<Vec<String>, WatchError> {
        let api_group = match kube::discovery::group(&self.client, group).await {
            Ok(api_group) => api_group,
            Err(e) => return discovery_error(group, e),
        };

        let versions: Vec<(&str, Vec<String>)> = api_group
            .versions()
            .map(|version| {
                let plurals = api_group
                    .versioned_resources(version)
                    .into_iter()
                    .map(|(ar, _)| ar.plural)
                    .collect();
                (version, plurals)
            })
            .collect();
        let served = served_in_order(
            api_group.preferred_version_or_latest(),
            &versions,
            resource,
        );

        log::debug!(
            "[kubernetes] {}/{} served as {:?}",
            group,
            resource,
            served
        );
        Ok(served)
    }

    fn watch(&self, version: HpaVersion) -> BoxStream<'static, Result<WatchEvent, WatchError>> {
        let gvk = GroupVersionKind::gvk(HPA_GROUP, version.as_str(), HPA_KIND);
        let resource = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        watcher::watcher(api, watcher::Config::default())
            .default_backoff()
            .map(|event| match event {
                Ok(event) => convert_event(event),
                Err(e) => Err(WatchError::Stream(e.to_string())),
            })
            .boxed()
    }
}

/// Versions serving `resource`, the preferred one first, the rest in
/// discovery order
fn served_in_order(
    preferred: &str,
    versions: &[(&str, Vec<String>)],
    resource: &str,
) -> Vec<String> {
    let serves = |plurals: &Vec<String>| plurals.iter().any(|plural| plural == resource);

    let preferred_entry = versions
        .iter()
        .filter(|(version, plurals)| *version == preferred && serves(plurals));
    let others = versions
        .iter()
        .filter(|(version, plurals)| *version != preferred && serves(plurals));

    preferred_entry
        .chain(others)
        .map(|(version, _)| version.to_string())
        .collect()
}

fn discovery_error(group: &str, error: kube::Error) -> Result<Vec<String>, WatchError> {
    match error {
        // The server answered, it just does not serve this group
        kube::Error::Discovery(e) => {
            log::debug!("[kubernetes] group {} not served: {}", group, e);
            Ok(Vec::new())
        }
        e => Err(WatchError::DiscoveryFailure(e.to_string())),
    }
}

fn convert_event(event: Event<DynamicObject>) -> Result<WatchEvent, WatchError> {
    Ok(match event {
        Event::Apply(obj) => WatchEvent::Apply(to_raw(obj)?),
        Event::Delete(obj) => WatchEvent::Delete(to_raw(obj)?),
        Event::Init => WatchEvent::Init,
        Event::InitApply(obj) => WatchEvent::InitApply(to_raw(obj)?),
        Event::InitDone => WatchEvent::InitDone,
    })
}

fn to_raw(obj: DynamicObject) -> Result<RawHpa, WatchError> {
    serde_json::to_value(obj)
        .map(RawHpa::new)
        .map_err(|e| WatchError::Stream(format!("failed to encode object: {}", e)))
}
