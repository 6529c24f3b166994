//! Topology file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::request::RequestConfig;

/// An ordered list of control requests that builds (and optionally tears
/// down) a set of pipelines.
///
/// # TOML Format
///
/// ```toml
/// name = "playback"
/// description = "host -> volume -> dai"
///
/// [[request]]
/// op = "pipeline-new"
/// id = 10
/// pipeline = 1
/// sched = 5
///
/// [[request]]
/// op = "component-new"
/// id = 1
/// type = "host"
/// pipeline = 1
/// [request.host]
/// direction = "playback"
///
/// [[request]]
/// op = "buffer-new"
/// id = 2
/// pipeline = 1
/// size = 768
///
/// [[request]]
/// op = "connect"
/// source = 1
/// sink = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topology {
    /// Name of the topology.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Requests in execution order.
    #[serde(default, rename = "request")]
    pub requests: Vec<RequestConfig>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            requests: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a request.
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.requests.push(request);
        self
    }

    /// Load a topology from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let topology = Self::from_toml(&content)?;
        tracing::debug!(
            "loaded topology '{}' ({} requests) from {}",
            topology.name,
            topology.len(),
            path.display()
        );
        Ok(topology)
    }

    /// Load a topology from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the topology to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the topology to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if the topology has no requests.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BufferSpec, IdSpec};

    #[test]
    fn parses_tagged_requests() {
        let t = Topology::from_toml(
            r#"
            name = "two"

            [[request]]
            op = "buffer-new"
            id = 2
            pipeline = 1
            size = 384
            caps = ["ram", "dma"]

            [[request]]
            op = "buffer-free"
            id = 2
            "#,
        )
        .unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.requests[0].op(), "buffer-new");
        assert_eq!(t.requests[1], RequestConfig::BufferFree(IdSpec { id: 2 }));
        let RequestConfig::BufferNew(BufferSpec { core, caps, .. }) = &t.requests[0] else {
            panic!("expected buffer-new");
        };
        assert_eq!(*core, 0);
        assert_eq!(caps.len(), 2);
    }

    #[test]
    fn unknown_op_is_a_parse_error() {
        let err = Topology::from_toml(
            r#"
            name = "bad"
            [[request]]
            op = "component-move"
            id = 1
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn missing_requests_is_empty() {
        let t = Topology::from_toml(r#"name = "empty""#).unwrap();
        assert!(t.is_empty());
        assert!(t.description.is_none());
    }
}
