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

use crate::{Error, Result};

use k8s_openapi::api::core::v1::Namespace;
use kube::{Resource, ResourceExt};

// How an object already present in the cluster relates to the Namespace reconciling it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    // Carries an owner reference to this Namespace.
    Owned,
    // Controlled by an earlier Namespace of the same name that is awaiting garbage collection.
    StaleNamespace { uid: String },
    // No controlling Namespace; created by hand or by something else.
    Unmanaged,
}

// Stamps a controller owner reference to the given Namespace on the object, so that the object is
// garbage collected when the Namespace is deleted. Any previous controller reference is replaced.
//
// Fails if the Namespace lacks the name or uid the reference is built from.
pub fn set_owner_reference<K>(owner: &Namespace, obj: &mut K) -> Result<()>
where
    K: Resource<DynamicType = ()>,
{
    let missing = if owner.metadata.name.is_none() {
        "name"
    } else {
        "uid"
    };
    let mut owner_ref = owner
        .controller_owner_ref(&())
        .ok_or_else(|| Error::OwnerReference {
            kind: K::kind(&()).to_string(),
            namespace: obj.meta().namespace.clone().unwrap_or_default(),
            name: obj.meta().name.clone().unwrap_or_default(),
            owner: owner.name_any(),
            missing,
        })?;
    // deleting the Namespace in the foreground waits for its derived objects
    owner_ref.block_owner_deletion = Some(true);

    let refs = obj.meta_mut().owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.controller != Some(true) && r.uid != owner_ref.uid);
    refs.push(owner_ref);
    Ok(())
}

// Classifies an existing object by its owner references relative to the Namespace with the
// given uid.
pub fn ownership<K: Resource>(obj: &K, owner_uid: &str) -> Ownership {
    let refs = obj.meta().owner_references.as_deref().unwrap_or_default();
    if refs.iter().any(|r| r.uid == owner_uid) {
        return Ownership::Owned;
    }
    match refs
        .iter()
        .find(|r| r.controller == Some(true) && r.kind == "Namespace")
    {
        Some(r) => Ownership::StaleNamespace { uid: r.uid.clone() },
        None => Ownership::Unmanaged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_utils::desired_http_route;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use kube::core::ObjectMeta;

    fn namespace(name: &str, uid: Option<&str>) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                uid: uid.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn owner_reference_points_at_namespace() {
        let ns = namespace("teamA", Some("uid-1"));
        let mut route = desired_http_route("teamA");
        set_owner_reference(&ns, &mut route).unwrap();

        let refs = route.owner_references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].api_version, "v1");
        assert_eq!(refs[0].kind, "Namespace");
        assert_eq!(refs[0].name, "teamA");
        assert_eq!(refs[0].uid, "uid-1");
        assert_eq!(refs[0].controller, Some(true));
        assert_eq!(refs[0].block_owner_deletion, Some(true));
    }

    #[test]
    fn setting_owner_twice_is_idempotent() {
        let ns = namespace("teamA", Some("uid-1"));
        let mut route = desired_http_route("teamA");
        set_owner_reference(&ns, &mut route).unwrap();
        set_owner_reference(&ns, &mut route).unwrap();
        assert_eq!(route.owner_references().len(), 1);
    }

    #[test]
    fn owner_without_uid_is_a_configuration_error() {
        let ns = namespace("teamA", None);
        let mut route = desired_http_route("teamA");
        let err = set_owner_reference(&ns, &mut route).unwrap_err();
        assert!(err.is_configuration());
        match err {
            Error::OwnerReference {
                kind,
                namespace,
                name,
                owner,
                missing,
            } => {
                assert_eq!(kind, "HTTPRoute");
                assert_eq!(namespace, "kong-system");
                assert_eq!(name, "teamA-admin-route");
                assert_eq!(owner, "teamA");
                assert_eq!(missing, "uid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(route.owner_references().is_empty());
    }

    #[test]
    fn ownership_classification() {
        let mut route = desired_http_route("teamA");
        assert_eq!(ownership(&route, "uid-1"), Ownership::Unmanaged);

        set_owner_reference(&namespace("teamA", Some("uid-0")), &mut route).unwrap();
        assert_eq!(ownership(&route, "uid-0"), Ownership::Owned);
        assert_eq!(
            ownership(&route, "uid-1"),
            Ownership::StaleNamespace {
                uid: "uid-0".to_string()
            }
        );

        route.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "something-else".to_string(),
            uid: "uid-9".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }]);
        assert_eq!(ownership(&route, "uid-1"), Ownership::Unmanaged);
    }
}
