/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::{
    ops::Sub,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    consts::CONTROLLER_NAME,
    referencegrant_utils::desired_reference_grant,
    route_utils::desired_http_route,
    utils::{ownership, set_owner_reference, Ownership},
    *,
};

use futures::StreamExt;
use gateway_api::apis::standard::{httproutes::HTTPRoute, referencegrants::ReferenceGrant};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, ListParams},
    runtime::{controller::Action, reflector::ObjectRef, watcher::Config, Controller},
    Resource, ResourceExt,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The Namespace was deleted before it could be reconciled.
    NotFound,
    /// The Namespace is on the exclusion list.
    Excluded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The HTTPRoute and ReferenceGrant exist and are owned by the Namespace.
    Applied,
    /// Nothing was done; this is still a success.
    Skipped(SkipReason),
}

/// Derives the admin HTTPRoute and the ReferenceGrant for a Namespace.
///
/// Holds no state between invocations, so the same Namespace may be reconciled any number of
/// times, concurrently with itself or with other Namespaces.
pub struct Reconciler<S> {
    store: S,
    exclusions: Arc<dyn ExclusionPolicy>,
    timeout: Duration,
}

impl<S: ObjectStore> Reconciler<S> {
    pub fn new(store: S, exclusions: impl ExclusionPolicy + 'static) -> Self {
        Self {
            store,
            exclusions: Arc::new(exclusions),
            timeout: ControllerConfig::default().reconcile_timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconciles the Namespace with the given name.
    ///
    /// A Namespace that no longer exists or is excluded is a success. Store failures are
    /// returned with the failing object's identity and are never retried here. Cancelling
    /// `cancel` or exceeding the configured deadline drops any store call in flight.
    #[instrument(skip(self, cancel), fields(controller = CONTROLLER_NAME))]
    pub async fn reconcile(
        &self,
        namespace: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome> {
        if namespace.is_empty() {
            return Err(Error::InvalidConfigError(
                "namespace name must not be empty".to_string(),
            ));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled(namespace.to_string())),
            res = tokio::time::timeout(self.timeout, self.reconcile_namespace(namespace)) => {
                res.unwrap_or_else(|_| {
                    Err(Error::DeadlineExceeded {
                        namespace: namespace.to_string(),
                        timeout: self.timeout,
                    })
                })
            }
        }
    }

    async fn reconcile_namespace(&self, name: &str) -> Result<ReconcileOutcome> {
        let namespace = self
            .store
            .get_namespace(name)
            .await
            .map_err(|source| Error::NamespaceLookup {
                namespace: name.to_string(),
                source,
            })?;

        let Some(namespace) = namespace else {
            debug!(namespace = name, "Namespace no longer exists");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NotFound));
        };

        if self.exclusions.is_excluded(name) {
            info!(namespace = name, "skipping excluded Namespace");
            return Ok(ReconcileOutcome::Skipped(SkipReason::Excluded));
        }

        // Both objects are created independently; on failure the next attempt starts over from
        // the HTTPRoute.
        self.sync_http_route(&namespace).await?;
        self.sync_reference_grant(&namespace).await?;

        Ok(ReconcileOutcome::Applied)
    }

    async fn sync_http_route(&self, namespace: &Namespace) -> Result<()> {
        let mut route = desired_http_route(&namespace.name_any());
        attach_owner(namespace, &mut route)?;
        let applied = self
            .store
            .create_http_route(&route)
            .await
            .map_err(|source| apply_error(&route, source))?;
        check_converged(namespace, applied)
    }

    async fn sync_reference_grant(&self, namespace: &Namespace) -> Result<()> {
        let mut grant = desired_reference_grant(&namespace.name_any());
        attach_owner(namespace, &mut grant)?;
        let applied = self
            .store
            .create_reference_grant(&grant)
            .await
            .map_err(|source| apply_error(&grant, source))?;
        check_converged(namespace, applied)
    }
}

fn attach_owner<K>(namespace: &Namespace, obj: &mut K) -> Result<()>
where
    K: Resource<DynamicType = ()>,
{
    set_owner_reference(namespace, obj).map_err(|err| {
        error!(
            error = %err,
            "failed to set owner reference; is the Namespace type registered with the API server?"
        );
        err
    })
}

fn apply_error<K>(obj: &K, source: kube::Error) -> Error
where
    K: Resource<DynamicType = ()>,
{
    Error::Apply {
        kind: K::kind(&()).to_string(),
        namespace: obj.namespace().unwrap_or_default(),
        name: obj.name_any(),
        source,
    }
}

// An existing object is left as it is. It only blocks convergence while it still belongs to a
// deleted Namespace of the same name.
fn check_converged<K>(namespace: &Namespace, applied: Applied<K>) -> Result<()>
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&());
    match applied {
        Applied::Created(obj) => {
            info!(
                kind = %kind,
                namespace = %obj.namespace().unwrap_or_default(),
                name = %obj.name_any(),
                "created object"
            );
            Ok(())
        }
        Applied::Existing(obj) => {
            match ownership(&obj, &namespace.uid().unwrap_or_default()) {
                Ownership::Owned => {
                    debug!(
                        kind = %kind,
                        namespace = %obj.namespace().unwrap_or_default(),
                        name = %obj.name_any(),
                        "object already exists"
                    );
                    Ok(())
                }
                Ownership::Unmanaged => {
                    warn!(
                        kind = %kind,
                        namespace = %obj.namespace().unwrap_or_default(),
                        name = %obj.name_any(),
                        "object exists without a controlling Namespace; leaving it unchanged"
                    );
                    Ok(())
                }
                Ownership::StaleNamespace { uid } => Err(Error::StaleOwner {
                    kind: kind.to_string(),
                    namespace: obj.namespace().unwrap_or_default(),
                    name: obj.name_any(),
                    owner: namespace.name_any(),
                    stale_uid: uid,
                }),
            }
        }
    }
}

// Maps a derived object back to the Namespace controlling it.
pub fn owning_namespace<K: Resource>(obj: &K) -> Option<ObjectRef<Namespace>> {
    obj.meta()
        .owner_references
        .as_ref()?
        .iter()
        .find(|r| r.controller == Some(true) && r.kind == "Namespace" && r.api_version == "v1")
        .map(|r| ObjectRef::new(&r.name))
}

// Managed Namespaces are periodically reconciled again; skipped ones wait for a change.
pub fn action_for(outcome: ReconcileOutcome, config: &ControllerConfig) -> Action {
    match (outcome, config.resync_interval) {
        (ReconcileOutcome::Applied, Some(interval)) => Action::requeue(interval),
        _ => Action::await_change(),
    }
}

pub fn requeue_for_error(error: &Error, config: &ControllerConfig) -> Action {
    if error.is_configuration() {
        Action::requeue(config.config_error_requeue)
    } else {
        Action::requeue(config.error_requeue)
    }
}

pub async fn reconcile(namespace: Arc<Namespace>, ctx: Arc<Context>) -> Result<Action> {
    let start = Instant::now();

    let name = namespace
        .metadata
        .name
        .clone()
        .ok_or(Error::InvalidConfigError("invalid name".to_string()))?;

    let outcome = ctx.reconciler.reconcile(&name, &ctx.shutdown).await?;

    let duration = Instant::now().sub(start);
    info!(
        namespace = %name,
        duration_ms = duration.as_millis() as u64,
        "finished reconciling"
    );
    Ok(action_for(outcome, &ctx.config))
}

/// Registers the namespace reconciler with a controller watching Namespaces and the objects
/// derived from them, and runs it until `ctx.shutdown` is cancelled.
pub async fn controller(ctx: Context) -> Result<()> {
    let client = ctx.reconciler.store().client();

    let routes = Api::<HTTPRoute>::all(client.clone());
    routes
        .list(&ListParams::default().limit(1))
        .await
        .map_err(Error::CRDNotFoundError)?;

    let grants = Api::<ReferenceGrant>::all(client.clone());
    grants
        .list(&ListParams::default().limit(1))
        .await
        .map_err(Error::CRDNotFoundError)?;

    let namespaces = Api::<Namespace>::all(client);
    let shutdown = ctx.shutdown.clone();

    info!("starting {CONTROLLER_NAME}");
    Controller::new(namespaces, Config::default().any_semantic())
        .watches(routes, Config::default().any_semantic(), |route| {
            owning_namespace(&route)
        })
        .watches(grants, Config::default().any_semantic(), |grant| {
            owning_namespace(&grant)
        })
        .graceful_shutdown_on(async move { shutdown.cancelled().await })
        .run(reconcile, error_policy, Arc::new(ctx))
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;
    info!("{CONTROLLER_NAME} terminated");

    Ok(())
}

fn error_policy(namespace: Arc<Namespace>, error: &Error, ctx: Arc<Context>) -> Action {
    if error.is_configuration() {
        error!(namespace = %namespace.name_any(), error = ?error, "reconcile failed");
    } else {
        warn!(namespace = %namespace.name_any(), error = ?error, "reconcile failed");
    }
    requeue_for_error(error, &ctx.config)
}
