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

use std::fmt::Debug;

use crate::consts::FIELD_MANAGER;

use async_trait::async_trait;
use gateway_api::apis::standard::{httproutes::HTTPRoute, referencegrants::ReferenceGrant};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, PostParams},
    Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Result of an idempotent create.
#[derive(Clone, Debug)]
pub enum Applied<K> {
    /// The object did not exist and was created as given.
    Created(K),
    /// An object with the same identity already existed; it is returned unchanged.
    Existing(K),
}

/// The cluster state the namespace reconciler reads and writes.
///
/// Creates must be atomic in the backing store: of two racing creates for the same identity,
/// one succeeds and the other observes the existing object.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches a Namespace by name; `None` if it does not exist.
    async fn get_namespace(&self, name: &str) -> kube::Result<Option<Namespace>>;

    /// Creates the HTTPRoute unless one with the same namespace and name exists.
    async fn create_http_route(&self, route: &HTTPRoute) -> kube::Result<Applied<HTTPRoute>>;

    /// Creates the ReferenceGrant unless one with the same namespace and name exists.
    async fn create_reference_grant(
        &self,
        grant: &ReferenceGrant,
    ) -> kube::Result<Applied<ReferenceGrant>>;
}

/// Kubernetes API server implementation of [`ObjectStore`].
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_namespace(&self, name: &str) -> kube::Result<Option<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        match api.get(name).await {
            Ok(ns) => Ok(Some(ns)),
            Err(err) if check_if_not_found_err(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_http_route(&self, route: &HTTPRoute) -> kube::Result<Applied<HTTPRoute>> {
        let api: Api<HTTPRoute> =
            Api::namespaced(self.client.clone(), &route.namespace().unwrap_or_default());
        create_or_get(&api, route).await
    }

    async fn create_reference_grant(
        &self,
        grant: &ReferenceGrant,
    ) -> kube::Result<Applied<ReferenceGrant>> {
        let api: Api<ReferenceGrant> =
            Api::namespaced(self.client.clone(), &grant.namespace().unwrap_or_default());
        create_or_get(&api, grant).await
    }
}

// Creates the object, or returns the existing one if the API server reports a conflict on its
// name. The existing object is never modified.
pub async fn create_or_get<K>(api: &Api<K>, obj: &K) -> kube::Result<Applied<K>>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let params = PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    };
    match api.create(&params, obj).await {
        Ok(created) => Ok(Applied::Created(created)),
        Err(err) if check_if_already_exists_err(&err) => {
            debug!(name = %obj.name_any(), "object already exists; reading it back");
            api.get(&obj.name_any()).await.map(Applied::Existing)
        }
        Err(err) => Err(err),
    }
}

// Returns true if the provided error is a not found error.
pub fn check_if_not_found_err(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

// Returns true if the provided error reports that the object already exists.
pub fn check_if_already_exists_err(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409)
}
