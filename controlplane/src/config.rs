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

use std::time::Duration;

use clap::Parser;

use crate::{consts::DEFAULT_EXCLUDED_NAMESPACES, Error, ExcludedNamespaces, Result};

/// Creates an admin HTTPRoute and a ReferenceGrant for every managed Namespace
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Args {
    #[clap(long, env = "NSC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Namespaces that never get an admin route (comma separated)
    #[clap(
        long,
        env = "NSC_EXCLUDED_NAMESPACES",
        value_delimiter = ',',
        default_values = DEFAULT_EXCLUDED_NAMESPACES
    )]
    pub excluded_namespaces: Vec<String>,

    /// Seconds between periodic reconciles of a managed Namespace; 0 disables
    #[clap(long, env = "NSC_RESYNC_INTERVAL", default_value_t = 60)]
    pub resync_interval: u64,

    /// Seconds before retrying a failed reconcile
    #[clap(long, env = "NSC_ERROR_REQUEUE", default_value_t = 5)]
    pub error_requeue: u64,

    /// Seconds before retrying a reconcile that failed on a setup defect
    #[clap(long, env = "NSC_CONFIG_ERROR_REQUEUE", default_value_t = 300)]
    pub config_error_requeue: u64,

    /// Deadline in seconds for a single reconcile
    #[clap(long, env = "NSC_RECONCILE_TIMEOUT", default_value_t = 30)]
    pub reconcile_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub excluded_namespaces: ExcludedNamespaces,
    pub resync_interval: Option<Duration>,
    pub error_requeue: Duration,
    pub config_error_requeue: Duration,
    pub reconcile_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            excluded_namespaces: ExcludedNamespaces::default(),
            resync_interval: Some(Duration::from_secs(60)),
            error_requeue: Duration::from_secs(5),
            config_error_requeue: Duration::from_secs(300),
            reconcile_timeout: Duration::from_secs(30),
        }
    }
}

impl TryFrom<&Args> for ControllerConfig {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self> {
        if args.reconcile_timeout == 0 {
            return Err(Error::InvalidConfigError(
                "reconcile timeout must be greater than zero".to_string(),
            ));
        }
        if args.error_requeue == 0 || args.config_error_requeue == 0 {
            return Err(Error::InvalidConfigError(
                "requeue intervals must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            excluded_namespaces: args.excluded_namespaces.iter().map(String::as_str).collect(),
            resync_interval: match args.resync_interval {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            error_requeue: Duration::from_secs(args.error_requeue),
            config_error_requeue: Duration::from_secs(args.config_error_requeue),
            reconcile_timeout: Duration::from_secs(args.reconcile_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExclusionPolicy;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("controller").chain(args.iter().copied()))
            .expect("args must parse")
    }

    #[test]
    fn defaults_match_builtin_config() {
        let config = ControllerConfig::try_from(&parse(&[])).unwrap();
        let default = ControllerConfig::default();
        assert_eq!(config.excluded_namespaces, default.excluded_namespaces);
        assert_eq!(config.resync_interval, default.resync_interval);
        assert_eq!(config.error_requeue, default.error_requeue);
        assert_eq!(config.config_error_requeue, default.config_error_requeue);
        assert_eq!(config.reconcile_timeout, default.reconcile_timeout);
    }

    #[test]
    fn excluded_namespaces_are_comma_separated() {
        let config = ControllerConfig::try_from(&parse(&[
            "--excluded-namespaces",
            "sandbox,kube-system",
        ]))
        .unwrap();
        assert!(config.excluded_namespaces.is_excluded("sandbox"));
        assert!(config.excluded_namespaces.is_excluded("kube-system"));
        assert!(!config.excluded_namespaces.is_excluded("monitoring"));
    }

    #[test]
    fn empty_exclusion_list_manages_everything() {
        let config =
            ControllerConfig::try_from(&parse(&["--excluded-namespaces", ""])).unwrap();
        assert_eq!(config.excluded_namespaces.iter().count(), 0);
    }

    #[test]
    fn zero_resync_disables_periodic_reconcile() {
        let config = ControllerConfig::try_from(&parse(&["--resync-interval", "0"])).unwrap();
        assert_eq!(config.resync_interval, None);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = ControllerConfig::try_from(&parse(&["--reconcile-timeout", "0"])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigError(_)));
        assert!(err.is_configuration());

        let err = ControllerConfig::try_from(&parse(&["--error-requeue", "0"])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigError(_)));
    }
}
