//! Asset source selection from the `version` query parameter.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{ViewerError, ViewerResult};

pub const VERSION_QUERY_KEY: &str = "version";
pub const DEFAULT_VERSION: &str = "v4";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceCatalog {
    pub default_version: String,
    pub versions: BTreeMap<String, String>,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        let versions = [
            ("v2", "models/v2/02.gltf"),
            ("v3", "models/v3/444.gltf"),
            ("v4", "models/v4/666.gltf"),
        ]
        .into_iter()
        .map(|(version, path)| (version.to_string(), path.to_string()))
        .collect();

        Self {
            default_version: DEFAULT_VERSION.to_string(),
            versions,
        }
    }
}

/// The source a viewer mounts with, and whether the request had to fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    pub version: String,
    pub source_id: String,
    pub fell_back: bool,
}

impl SourceCatalog {
    pub fn lookup(&self, version: &str) -> ViewerResult<&str> {
        self.versions
            .get(version)
            .map(String::as_str)
            .ok_or_else(|| ViewerError::InvalidConfiguration(version.to_string()))
    }

    /// Pick the source for `requested`, falling back to the default version
    /// when the request is absent, empty or unknown.
    pub fn resolve(&self, requested: Option<&str>) -> SourceSelection {
        if let Some(version) = requested.filter(|v| !v.is_empty()) {
            match self.lookup(version) {
                Ok(source_id) => {
                    return SourceSelection {
                        version: version.to_string(),
                        source_id: source_id.to_string(),
                        fell_back: false,
                    }
                }
                Err(err) => {
                    log::warn!("{err}; falling back to '{}'", self.default_version);
                }
            }
        }

        SourceSelection {
            version: self.default_version.clone(),
            source_id: self
                .versions
                .get(&self.default_version)
                .cloned()
                .unwrap_or_default(),
            fell_back: requested.is_some(),
        }
    }
}

/// Extract the `version` value from a query string such as `?version=v3&lang=en`.
///
/// A bare token without `=` or `&` is taken as the value itself, so both
/// `version=v3` and `v3` work from a command line.
pub fn version_from_query(query: &str) -> Option<String> {
    let query = query.trim().trim_start_matches('?');
    if query.is_empty() {
        return None;
    }
    if !query.contains('=') && !query.contains('&') {
        return Some(query.to_string());
    }

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == VERSION_QUERY_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
