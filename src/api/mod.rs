//! Hue bridge API access.
//!
//! ApiInterface -> one query per entity category (lights / groups / sensors).
//! HueApi: parse_bridge_url + GET `<base>/<resource>` over reqwest.
//! The bridge answers `{ "<id>": {...}, ... }`; records are flattened into an
//! array with the id folded in as `"id"`.
//!
use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::utils::block_on;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Entity categories the bridge exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Lights,
    Groups,
    Sensors,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Lights => "lights",
            Resource::Groups => "groups",
            Resource::Sensors => "sensors",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Queries used by discoveries. Each returns the raw records of one category.
pub trait ApiInterface: Send + Sync {
    fn get_lights(&self) -> Result<Vec<Value>>;
    fn get_groups(&self) -> Result<Vec<Value>>;
    fn get_sensors(&self) -> Result<Vec<Value>>;

    /// Bridge endpoint, when the implementation talks to a real one.
    fn base_url(&self) -> Option<&Url> {
        None
    }
}

/// Validate a `hue_hub_url` value (e.g. `http://192.168.1.2/api/<key>`).
///
/// Only http/https are accepted. A trailing slash is ensured so resource
/// paths join underneath the key instead of replacing it.
pub fn parse_bridge_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Bridge URL is empty");
    }
    let mut url =
        Url::parse(trimmed).with_context(|| format!("Failed to parse bridge URL: '{trimmed}'"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("Unsupported bridge URL scheme '{other}' (expected http or https)"),
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// HTTP client for a Hue bridge.
#[derive(Debug, Clone)]
pub struct HueApi {
    base: Url,
    timeout: Duration,
}

impl HueApi {
    pub fn new(base: Url, timeout: Duration) -> Self {
        Self { base, timeout }
    }

    pub fn from_config(raw_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = parse_bridge_url(raw_url)?;
        Ok(Self::new(base, timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)))
    }

    pub fn resource_url(&self, resource: Resource) -> Result<Url> {
        self.base
            .join(resource.path())
            .with_context(|| format!("Failed to build URL for '{resource}'"))
    }

    fn fetch(&self, resource: Resource) -> Result<Vec<Value>> {
        let url = self.resource_url(resource)?;
        debug!(%url, "querying bridge");
        let body = block_on(fetch_json(url, self.timeout))??;
        records_from_response(body).with_context(|| format!("Bridge rejected query for '{resource}'"))
    }
}

impl ApiInterface for HueApi {
    fn get_lights(&self) -> Result<Vec<Value>> {
        self.fetch(Resource::Lights)
    }

    fn get_groups(&self) -> Result<Vec<Value>> {
        self.fetch(Resource::Groups)
    }

    fn get_sensors(&self) -> Result<Vec<Value>> {
        self.fetch(Resource::Sensors)
    }

    fn base_url(&self) -> Option<&Url> {
        Some(&self.base)
    }
}

/// Used when `hue_hub_url` is missing: dispatch still works, every query fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredApi;

impl UnconfiguredApi {
    fn missing() -> Result<Vec<Value>> {
        Err(anyhow!("hue_hub_url is not configured"))
    }
}

impl ApiInterface for UnconfiguredApi {
    fn get_lights(&self) -> Result<Vec<Value>> {
        Self::missing()
    }

    fn get_groups(&self) -> Result<Vec<Value>> {
        Self::missing()
    }

    fn get_sensors(&self) -> Result<Vec<Value>> {
        Self::missing()
    }
}

async fn fetch_json(url: Url, timeout: Duration) -> Result<Value> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Bridge returned HTTP {status} for {url}");
    }

    response
        .json::<Value>()
        .await
        .with_context(|| format!("Bridge returned invalid JSON for {url}"))
}

/// Convert a bridge response into a flat record list.
///
/// - `{id: obj}` maps become `[obj + {"id": id}]`, numeric ids first in
///   numeric order, then any other ids lexically
/// - `[{"error": {...}}]` payloads become an error
/// - arrays of plain objects pass through
pub fn records_from_response(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by_cached_key(|(id, _)| id_sort_key(id));
            Ok(entries
                .into_iter()
                .map(|(id, v)| with_id(id, v))
                .collect())
        }
        Value::Array(items) => {
            if let Some(desc) = items
                .iter()
                .find_map(|i| i.get("error")?.get("description")?.as_str())
            {
                return Err(anyhow!("{desc}"));
            }
            Ok(items)
        }
        other => bail!("unexpected bridge response: {other}"),
    }
}

/// Numeric ids first in numeric order, then the rest lexically.
fn id_sort_key(id: &str) -> (bool, Option<u64>, String) {
    let numeric = id.parse::<u64>().ok();
    (numeric.is_none(), numeric, id.to_string())
}

fn with_id(id: String, value: Value) -> Value {
    match value {
        Value::Object(mut obj) => {
            obj.insert("id".to_string(), Value::String(id));
            Value::Object(obj)
        }
        other => {
            let mut obj = Map::new();
            obj.insert("id".to_string(), Value::String(id));
            obj.insert("value".to_string(), other);
            Value::Object(obj)
        }
    }
}

/// Canned API for tests.
#[cfg(test)]
pub mod testing {
    use super::*;

    #[derive(Debug, Default, Clone)]
    pub struct StaticApi {
        pub lights: Vec<Value>,
        pub groups: Vec<Value>,
        pub sensors: Vec<Value>,
        pub fail_with: Option<String>,
    }

    impl StaticApi {
        fn answer(&self, records: &[Value]) -> Result<Vec<Value>> {
            match &self.fail_with {
                Some(msg) => Err(anyhow!("{msg}")),
                None => Ok(records.to_vec()),
            }
        }
    }

    impl ApiInterface for StaticApi {
        fn get_lights(&self) -> Result<Vec<Value>> {
            self.answer(&self.lights)
        }
        fn get_groups(&self) -> Result<Vec<Value>> {
            self.answer(&self.groups)
        }
        fn get_sensors(&self) -> Result<Vec<Value>> {
            self.answer(&self.sensors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bridge_url_gets_trailing_slash() {
        let url = parse_bridge_url("http://192.168.1.2/api/secret").unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.2/api/secret/");
    }

    #[test]
    fn resource_joins_under_key() {
        let api = HueApi::from_config("http://10.0.0.5/api/abc", None).unwrap();
        let url = api.resource_url(Resource::Groups).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5/api/abc/groups");
        assert_eq!(api.base_url().map(Url::as_str), Some("http://10.0.0.5/api/abc/"));
    }

    #[test]
    fn non_http_scheme_rejected() {
        let err = parse_bridge_url("ftp://bridge/api/x").unwrap_err();
        assert!(err.to_string().contains("Unsupported bridge URL scheme"));
    }

    #[test]
    fn empty_url_rejected() {
        let err = parse_bridge_url("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn map_response_flattened_in_numeric_id_order() {
        let body = json!({
            "10": {"name": "Porch"},
            "2": {"name": "Hall"},
            "1": {"name": "Bulb A"}
        });
        let records = records_from_response(body).unwrap();
        let ids: Vec<&str> = records
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
        assert_eq!(records[0]["name"], "Bulb A");
    }

    #[test]
    fn mixed_ids_numeric_first_then_lexical() {
        let body = json!({
            "10": {}, "5x": {}, "9": {}, "sensor": {}, "2": {}, "10a": {}
        });
        let records = records_from_response(body).unwrap();
        let ids: Vec<&str> = records
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["2", "9", "10", "10a", "5x", "sensor"]);
    }

    #[test]
    fn error_payload_becomes_err() {
        let body = json!([{"error": {"type": 1, "address": "/", "description": "unauthorized user"}}]);
        let err = records_from_response(body).unwrap_err();
        assert!(err.to_string().contains("unauthorized user"));
    }

    #[test]
    fn unconfigured_api_fails_every_query() {
        let api = UnconfiguredApi;
        assert!(api.get_lights().is_err());
        assert!(api.get_groups().is_err());
        let err = api.get_sensors().unwrap_err();
        assert!(err.to_string().contains("hue_hub_url"));
        assert!(api.base_url().is_none());
    }

    #[test]
    fn scalar_response_rejected() {
        assert!(records_from_response(json!(42)).is_err());
    }
}
