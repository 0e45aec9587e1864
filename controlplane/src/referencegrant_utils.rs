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

use crate::consts::{GATEWAY_API_GROUP, KONG_NAMESPACE, REFERENCE_GRANT_NAME};

use gateway_api::apis::standard::referencegrants::{
    ReferenceGrant, ReferenceGrantFrom, ReferenceGrantSpec, ReferenceGrantTo,
};

// Builds the ReferenceGrant that allows HTTPRoutes in the Kong namespace to reference any
// Service in the given namespace. Only its location varies between namespaces.
pub fn desired_reference_grant(namespace: &str) -> ReferenceGrant {
    let mut grant = ReferenceGrant::new(
        REFERENCE_GRANT_NAME,
        ReferenceGrantSpec {
            from: vec![ReferenceGrantFrom {
                group: GATEWAY_API_GROUP.to_string(),
                kind: "HTTPRoute".to_string(),
                namespace: KONG_NAMESPACE.to_string(),
            }],
            to: vec![ReferenceGrantTo {
                // core API group
                group: "".to_string(),
                kind: "Service".to_string(),
                name: None,
            }],
        },
    );
    grant.metadata.namespace = Some(namespace.to_string());
    grant
}
