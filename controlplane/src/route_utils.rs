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

use crate::consts::{
    ADMIN_GATEWAY_NAME, ADMIN_ROUTE_SUFFIX, ADMIN_SERVICE_PORT, ADMIN_SERVICE_SUFFIX,
    KONG_NAMESPACE,
};

use gateway_api::apis::standard::httproutes::{
    HTTPRoute, HTTPRouteParentRefs, HTTPRouteRules, HTTPRouteRulesBackendRefs,
    HTTPRouteRulesFilters, HTTPRouteRulesFiltersType, HTTPRouteRulesFiltersUrlRewrite,
    HTTPRouteRulesFiltersUrlRewritePath, HTTPRouteRulesFiltersUrlRewritePathType,
    HTTPRouteRulesMatches, HTTPRouteRulesMatchesPath, HTTPRouteRulesMatchesPathType,
    HTTPRouteSpec,
};

// Name of the admin HTTPRoute derived from the given namespace.
pub fn admin_route_name(namespace: &str) -> String {
    format!("{namespace}{ADMIN_ROUTE_SUFFIX}")
}

// Path prefix under which the namespace's admin API is exposed.
pub fn admin_path_prefix(namespace: &str) -> String {
    format!("/{namespace}")
}

// Name of the gateway admin Service living in the given namespace.
pub fn admin_service_name(namespace: &str) -> String {
    format!("{namespace}{ADMIN_SERVICE_SUFFIX}")
}

// Builds the desired admin HTTPRoute for a namespace. The route lives in the Kong namespace,
// attaches to the admin Gateway, matches `/<namespace>` and forwards to the namespace's gateway
// admin Service with the prefix stripped.
//
// The result depends only on the namespace name.
pub fn desired_http_route(namespace: &str) -> HTTPRoute {
    let mut route = HTTPRoute::new(
        &admin_route_name(namespace),
        HTTPRouteSpec {
            parent_refs: Some(vec![HTTPRouteParentRefs {
                kind: Some("Gateway".to_string()),
                name: ADMIN_GATEWAY_NAME.to_string(),
                namespace: Some(KONG_NAMESPACE.to_string()),
                ..Default::default()
            }]),
            rules: Some(vec![HTTPRouteRules {
                matches: Some(vec![HTTPRouteRulesMatches {
                    path: Some(HTTPRouteRulesMatchesPath {
                        r#type: Some(HTTPRouteRulesMatchesPathType::PathPrefix),
                        value: Some(admin_path_prefix(namespace)),
                    }),
                    ..Default::default()
                }]),
                backend_refs: Some(vec![HTTPRouteRulesBackendRefs {
                    name: admin_service_name(namespace),
                    namespace: Some(namespace.to_string()),
                    port: Some(ADMIN_SERVICE_PORT),
                    ..Default::default()
                }]),
                filters: Some(vec![HTTPRouteRulesFilters {
                    r#type: HTTPRouteRulesFiltersType::UrlRewrite,
                    url_rewrite: Some(HTTPRouteRulesFiltersUrlRewrite {
                        hostname: None,
                        path: Some(HTTPRouteRulesFiltersUrlRewritePath {
                            r#type: HTTPRouteRulesFiltersUrlRewritePathType::ReplacePrefixMatch,
                            replace_prefix_match: Some("/".to_string()),
                            replace_full_path: None,
                        }),
                    }),
                    extension_ref: None,
                    request_header_modifier: None,
                    request_mirror: None,
                    request_redirect: None,
                    response_header_modifier: None,
                }]),
                ..Default::default()
            }]),
            ..Default::default()
        },
    );
    route.metadata.namespace = Some(KONG_NAMESPACE.to_string());
    route
}
