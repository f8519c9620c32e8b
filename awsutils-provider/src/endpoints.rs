//! Endpoint resolution
//!
//! Merges per-service endpoint overrides from configuration blocks and the
//! environment into one URL per canonical service key.
//!
//! Precedence: first non-empty block value, then the primary environment
//! variable, then the deprecated environment variable.

use std::collections::{BTreeMap, HashMap};

use crate::error::ConfigError;
use crate::names;

/// Source of environment variables
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Effective endpoint URL per canonical service key
pub type Endpoints = BTreeMap<String, String>;

/// Resolve endpoint overrides.
///
/// Block keys must be known service keys or aliases; the first unknown key
/// fails the whole resolution.
pub fn resolve_endpoints(
    blocks: &[HashMap<String, String>],
    env: &impl Environment,
) -> Result<Endpoints, ConfigError> {
    for block in blocks {
        let mut keys: Vec<_> = block.keys().collect();
        keys.sort();
        if let Some(unknown) = keys
            .into_iter()
            .find(|k| names::service_for_alias(k).is_none())
        {
            return Err(ConfigError::UnknownEndpointAlias {
                alias: unknown.clone(),
            });
        }
    }

    let mut out = Endpoints::new();

    for block in blocks {
        for alias in names::aliases() {
            let service = names::service_for_alias(alias).ok_or_else(|| {
                ConfigError::UnknownEndpointAlias {
                    alias: alias.to_string(),
                }
            })?;

            if out.contains_key(service.key) {
                continue;
            }
            if let Some(url) = block.get(alias).filter(|u| !u.is_empty()) {
                out.insert(service.key.to_string(), url.clone());
            }
        }
    }

    for service in names::SERVICES {
        if out.contains_key(service.key) {
            continue;
        }

        if let Some(url) = env.var(service.env_var).filter(|v| !v.is_empty()) {
            out.insert(service.key.to_string(), url);
            continue;
        }

        if let Some(url) = env
            .var(service.deprecated_env_var)
            .filter(|v| !v.is_empty())
        {
            log::warn!(
                "The environment variable {:?} is deprecated. Use {:?} instead.",
                service.deprecated_env_var,
                service.env_var
            );
            out.insert(service.key.to_string(), url);
        }
    }

    for (service, url) in &out {
        log::info!("using endpoint override for {}: {}", service, url);
    }

    Ok(out)
}
