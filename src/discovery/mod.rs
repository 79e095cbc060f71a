//! Discovery capability and candidates.
//!
//! A discovery is a named query against the bridge whose records go to the
//! sink. Its name is known before any instance exists: built-ins carry it as
//! an associated constant, directory plugins declare it in their manifest.
//! A [`DiscoveryCandidate`] pairs that name with a constructor; the registry
//! instantiates candidates with the shared API and sink.

pub mod builtin;
pub mod external;
pub mod registry;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiInterface;
use crate::sink::Sink;

pub use registry::DiscoveryRegistry;

/// A runnable discovery.
///
/// `arguments` holds zero or one element; a present element is a sub-target
/// filter. Failures are reported through the sink, never returned.
pub trait Discovery: Send + Sync {
    fn exec(&self, arguments: &[String]);
}

/// Discoveries compiled into the binary.
pub trait BuiltinDiscovery: Discovery + Sized + 'static {
    const NAME: &'static str;

    fn new(api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>) -> Self;
}

pub type DiscoveryFactory =
    Box<dyn Fn(Arc<dyn ApiInterface>, Arc<dyn Sink>) -> Box<dyn Discovery>>;

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOrigin {
    Builtin,
    External(PathBuf),
}

impl fmt::Display for PluginOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginOrigin::Builtin => f.write_str("builtin"),
            PluginOrigin::External(dir) => write!(f, "external: {}", dir.display()),
        }
    }
}

/// A validated plugin that has not been instantiated yet.
pub struct DiscoveryCandidate {
    name: String,
    origin: PluginOrigin,
    factory: DiscoveryFactory,
}

impl DiscoveryCandidate {
    pub fn new(name: impl Into<String>, origin: PluginOrigin, factory: DiscoveryFactory) -> Self {
        Self {
            name: name.into(),
            origin,
            factory,
        }
    }

    pub fn builtin<D: BuiltinDiscovery>() -> Self {
        Self::new(
            D::NAME,
            PluginOrigin::Builtin,
            Box::new(
                |api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>| -> Box<dyn Discovery> {
                    Box::new(D::new(api, sink))
                },
            ),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &PluginOrigin {
        &self.origin
    }

    pub fn instantiate(&self, api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>) -> Box<dyn Discovery> {
        (self.factory)(api, sink)
    }
}

impl fmt::Debug for DiscoveryCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryCandidate")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
