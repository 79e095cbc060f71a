//! Name-keyed registry of instantiated discoveries.
//!
//! Built once per process by folding candidates in order. A later candidate
//! with an already-registered name replaces the earlier one, so external
//! plugins (folded after built-ins) shadow built-ins of the same name.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::{Discovery, DiscoveryCandidate, PluginOrigin};
use crate::api::ApiInterface;
use crate::error::CommandError;
use crate::sink::Sink;
use crate::utils::outcome::assert_exists;

pub struct RegisteredDiscovery {
    pub origin: PluginOrigin,
    pub handler: Box<dyn Discovery>,
}

pub struct DiscoveryRegistry {
    entries: BTreeMap<String, RegisteredDiscovery>,
}

impl DiscoveryRegistry {
    pub fn build(
        candidates: impl IntoIterator<Item = DiscoveryCandidate>,
        api: Arc<dyn ApiInterface>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        let entries = candidates
            .into_iter()
            .fold(BTreeMap::new(), |mut acc, candidate| {
                let entry = RegisteredDiscovery {
                    origin: candidate.origin().clone(),
                    handler: candidate.instantiate(Arc::clone(&api), Arc::clone(&sink)),
                };
                if let Some(previous) = acc.insert(candidate.name().to_string(), entry) {
                    debug!(
                        name = candidate.name(),
                        shadowed = %previous.origin,
                        by = %candidate.origin(),
                        "discovery overridden"
                    );
                }
                acc
            });
        Self { entries }
    }

    /// Look up `target`, or describe it as unknown.
    pub fn resolve(&self, target: &str) -> Result<&dyn Discovery, CommandError> {
        assert_exists(&self.entries, target).map(|entry| entry.handler.as_ref())
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&RegisteredDiscovery> {
        self.entries.get(name)
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
