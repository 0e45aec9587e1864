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

use std::collections::BTreeSet;

use crate::consts::DEFAULT_EXCLUDED_NAMESPACES;

/// Decides whether a namespace is managed by the controller at all.
pub trait ExclusionPolicy: Send + Sync {
    fn is_excluded(&self, namespace: &str) -> bool;
}

impl<F> ExclusionPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_excluded(&self, namespace: &str) -> bool {
        self(namespace)
    }
}

/// A fixed set of namespace names the controller leaves alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExcludedNamespaces(BTreeSet<String>);

impl ExcludedNamespaces {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ExcludedNamespaces {
    fn default() -> Self {
        DEFAULT_EXCLUDED_NAMESPACES.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludedNamespaces {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.is_empty())
                .collect(),
        )
    }
}

impl ExclusionPolicy for ExcludedNamespaces {
    fn is_excluded(&self, namespace: &str) -> bool {
        self.0.contains(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_excludes_system_namespaces() {
        let policy = ExcludedNamespaces::default();
        for ns in ["kube-system", "default", "kube-public", "monitoring"] {
            assert!(policy.is_excluded(ns), "{ns} should be excluded");
        }
        assert!(!policy.is_excluded("teamA"));
        assert!(!policy.is_excluded("kong-system"));
    }

    #[test]
    fn matching_is_exact() {
        let policy = ExcludedNamespaces::default();
        assert!(!policy.is_excluded("kube-system-2"));
        assert!(!policy.is_excluded("Default"));
        assert!(!policy.is_excluded(""));
    }

    #[test]
    fn custom_set_replaces_defaults() {
        let policy: ExcludedNamespaces = ["sandbox", ""].into_iter().collect();
        assert!(policy.is_excluded("sandbox"));
        assert!(!policy.is_excluded("kube-system"));
        assert_eq!(policy.iter().collect::<Vec<_>>(), vec!["sandbox"]);

        let empty: ExcludedNamespaces = std::iter::empty::<String>().collect();
        assert!(!empty.is_excluded("kube-system"));
    }

    #[test]
    fn closures_are_policies() {
        let policy = |ns: &str| ns.starts_with("tmp-");
        assert!(policy.is_excluded("tmp-build"));
        assert!(!ExclusionPolicy::is_excluded(&policy, "teamA"));
    }
}
