//! Discoveries compiled into the binary: `lights`, `groups`, `sensors`.
//!
//! Each forwards the records of one bridge category to the sink. A sub-target
//! keeps only records whose `id` equals it or whose `type` matches it
//! case-insensitively (`groups:1`, `sensors:ZLLTemperature`).

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BuiltinDiscovery, Discovery, DiscoveryCandidate};
use crate::api::ApiInterface;
use crate::sink::{Record, Sink};

/// Every built-in, in registration order.
pub fn candidates() -> Vec<DiscoveryCandidate> {
    vec![
        DiscoveryCandidate::builtin::<LightsDiscovery>(),
        DiscoveryCandidate::builtin::<GroupsDiscovery>(),
        DiscoveryCandidate::builtin::<SensorsDiscovery>(),
    ]
}

macro_rules! bridge_discovery {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $query:ident) => {
        $(#[$doc])*
        pub struct $ty {
            api: Arc<dyn ApiInterface>,
            sink: Arc<dyn Sink>,
        }

        impl BuiltinDiscovery for $ty {
            const NAME: &'static str = $name;

            fn new(api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>) -> Self {
                Self { api, sink }
            }
        }

        impl Discovery for $ty {
            fn exec(&self, arguments: &[String]) {
                forward_records(Self::NAME, self.api.$query(), arguments, self.sink.as_ref());
            }
        }
    };
}

bridge_discovery!(
    /// All lights known to the bridge.
    LightsDiscovery,
    "lights",
    get_lights
);
bridge_discovery!(
    /// Rooms, zones and light groups.
    GroupsDiscovery,
    "groups",
    get_groups
);
bridge_discovery!(
    /// Motion, temperature, light-level and switch sensors.
    SensorsDiscovery,
    "sensors",
    get_sensors
);

/// Send each fetched record (optionally filtered) to the sink, or one error
/// record if the query failed.
pub fn forward_records(name: &str, fetched: Result<Vec<Value>>, arguments: &[String], sink: &dyn Sink) {
    let records = match fetched {
        Ok(records) => records,
        Err(e) => {
            warn!(discovery = name, error = %format!("{e:#}"), "discovery query failed");
            sink.process(Record::error(
                "discovery",
                format!("discovery `{name}` failed: {e:#}"),
            ));
            return;
        }
    };

    let sub_target = arguments.first().map(String::as_str);
    let mut forwarded = 0usize;
    for record in records
        .into_iter()
        .filter(|r| sub_target.is_none_or(|s| matches_sub_target(r, s)))
    {
        sink.process(Record::Entity(record));
        forwarded += 1;
    }
    debug!(discovery = name, ?sub_target, forwarded, "discovery finished");
}

/// Does `record` match a sub-target filter?
pub fn matches_sub_target(record: &Value, sub_target: &str) -> bool {
    let id_matches = match record.get("id") {
        Some(Value::String(id)) => id == sub_target,
        Some(Value::Number(n)) => n.to_string() == sub_target,
        _ => false,
    };
    id_matches
        || record
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case(sub_target))
}
