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

// Stable name of the namespace controller, used for event attribution.
pub const CONTROLLER_NAME: &str = "namespace-controller";

// The namespace where the Kong gateway and the admin HTTPRoutes live.
pub const KONG_NAMESPACE: &str = "kong-system";

// The Gateway every admin HTTPRoute attaches to.
pub const ADMIN_GATEWAY_NAME: &str = "admin-gateway";

// Suffix of the per-namespace admin HTTPRoute name.
pub const ADMIN_ROUTE_SUFFIX: &str = "-admin-route";

// Suffix of the per-namespace gateway admin Service name.
pub const ADMIN_SERVICE_SUFFIX: &str = "-gateway-admin";

// Port of the gateway admin Service.
pub const ADMIN_SERVICE_PORT: i32 = 8444;

// Name of the ReferenceGrant created inside every managed namespace.
pub const REFERENCE_GRANT_NAME: &str = "allow-kong-system-routes";

// API group of the Gateway API resources.
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

// Namespaces that are never managed unless configured otherwise.
pub const DEFAULT_EXCLUDED_NAMESPACES: [&str; 4] =
    ["kube-system", "default", "kube-public", "monitoring"];

// Field manager recorded on objects created by the controller.
pub const FIELD_MANAGER: &str = "nsc-field-manager";
