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

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use config::ControllerConfig;
pub use exclusion::{ExcludedNamespaces, ExclusionPolicy};
pub use namespace_controller::{
    controller as namespace_controller, ReconcileOutcome, Reconciler, SkipReason,
};
pub use store::{Applied, KubeStore, ObjectStore};

pub mod config;
pub mod consts;
pub mod exclusion;
pub mod namespace_controller;
pub mod referencegrant_utils;
pub mod route_utils;
pub mod store;
pub mod utils;

// Context for our reconciler
#[derive(Clone)]
pub struct Context {
    /// Namespace reconciler backed by the Kubernetes API
    pub reconciler: Arc<Reconciler<KubeStore>>,
    /// Requeue policy and timeouts
    pub config: ControllerConfig,
    /// Cancelled on shutdown; aborts in-flight reconciles
    pub shutdown: CancellationToken,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: `{0}`")]
    InvalidConfigError(String),
    #[error("error querying Gateway API CRDs: `{0}`; are the CRDs installed?")]
    CRDNotFoundError(#[source] kube::Error),
    #[error("failed to fetch Namespace {namespace}: {source}")]
    NamespaceLookup {
        namespace: String,
        #[source]
        source: kube::Error,
    },
    #[error(
        "failed to set owner reference on {kind} {namespace}/{name}: Namespace {owner} has no {missing}"
    )]
    OwnerReference {
        kind: String,
        namespace: String,
        name: String,
        owner: String,
        missing: &'static str,
    },
    #[error("failed to create or update {kind} {namespace}/{name}: {source}")]
    Apply {
        kind: String,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error(
        "{kind} {namespace}/{name} is still owned by a previous Namespace {owner} (uid {stale_uid})"
    )]
    StaleOwner {
        kind: String,
        namespace: String,
        name: String,
        owner: String,
        stale_uid: String,
    },
    #[error("reconciliation of Namespace {0} was cancelled")]
    Cancelled(String),
    #[error("reconciliation of Namespace {namespace} exceeded its deadline of {timeout:?}")]
    DeadlineExceeded { namespace: String, timeout: Duration },
}

impl Error {
    /// Errors that indicate a setup defect rather than a transient condition.
    /// Retrying these is unlikely to help.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfigError(_) | Error::CRDNotFoundError(_) | Error::OwnerReference { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
