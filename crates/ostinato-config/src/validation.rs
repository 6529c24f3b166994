//! Topology validation.
//!
//! Every request of a topology is checked before any of it runs: names and
//! identifiers must parse, creation requests must target a configured core,
//! and every component must resolve to a driver in the catalog. All problems
//! are collected, not just the first.
//!
//! # Example
//!
//! ```rust
//! use ostinato_config::{Topology, TopologyValidator};
//!
//! let topology = Topology::from_toml(r#"
//!     name = "tone"
//!
//!     [[request]]
//!     op = "component-new"
//!     id = 1
//!     type = "tone"
//!     pipeline = 1
//!     [request.tone]
//!     sample-rate = 48000
//! "#).unwrap();
//!
//! let validator = TopologyValidator::new(2);
//! assert!(validator.validate(&topology).is_ok());
//! ```

use ostinato_core::{CompDescriptor, ControlRequest};
use ostinato_registry::DriverCatalog;
use thiserror::Error;

use crate::topology::Topology;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A name field holds an unrecognized value.
    #[error("request {index}: unknown {field} '{value}'")]
    UnknownName {
        /// Position of the request.
        index: usize,
        /// What the name denotes.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An identifier is not in canonical form.
    #[error("request {index}: malformed identifier '{value}'")]
    MalformedUuid {
        /// Position of the request.
        index: usize,
        /// The rejected value.
        value: String,
    },

    /// A creation request targets a core outside the configured set.
    #[error("request {index}: core {core} is outside 0..{cores}")]
    CoreOutOfRange {
        /// Position of the request.
        index: usize,
        /// Requested core.
        core: u32,
        /// Configured core count.
        cores: usize,
    },

    /// A component carries more than one kind-specific table.
    #[error("request {index}: component {id} has more than one kind table")]
    ConflictingFields {
        /// Position of the request.
        index: usize,
        /// Component id.
        id: u32,
    },

    /// No catalog driver serves the component.
    #[error("request {index}: no driver for component {id}")]
    NoDriver {
        /// Position of the request.
        index: usize,
        /// Component id.
        id: u32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validator for topologies.
pub struct TopologyValidator {
    catalog: DriverCatalog,
    core_count: usize,
}

impl TopologyValidator {
    /// Validator for `core_count` cores and the built-in drivers.
    pub fn new(core_count: usize) -> Self {
        Self::with_catalog(DriverCatalog::new(), core_count)
    }

    /// Validator resolving drivers against `catalog`.
    pub fn with_catalog(catalog: DriverCatalog, core_count: usize) -> Self {
        Self {
            catalog,
            core_count,
        }
    }

    /// Number of cores creation requests may target.
    pub fn core_count(&self) -> usize {
        self.core_count
    }

    /// Driver catalog components resolve against.
    pub fn catalog(&self) -> &DriverCatalog {
        &self.catalog
    }

    /// Checks every request, returning them parsed in order.
    pub fn compile(&self, topology: &Topology) -> ValidationResult<Vec<ControlRequest>> {
        let mut requests = Vec::with_capacity(topology.requests.len());
        let mut errors = Vec::new();

        for (index, config) in topology.requests.iter().enumerate() {
            if let Some(core) = config.core()
                && core as usize >= self.core_count
            {
                errors.push(ValidationError::CoreOutOfRange {
                    index,
                    core,
                    cores: self.core_count,
                });
            }
            match config.to_request(index) {
                Ok(request) => {
                    if let ControlRequest::ComponentNew(desc) = &request
                        && !self.has_driver(desc)
                    {
                        errors.push(ValidationError::NoDriver {
                            index,
                            id: desc.id.0,
                        });
                    }
                    requests.push(request);
                }
                Err(e) => errors.push(e),
            }
        }

        match errors.len() {
            0 => Ok(requests),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// Checks every request without keeping the parsed result.
    pub fn validate(&self, topology: &Topology) -> ValidationResult<()> {
        self.compile(topology).map(|_| ())
    }

    fn has_driver(&self, desc: &CompDescriptor) -> bool {
        match desc.type_uuid() {
            Ok(Some(uuid)) => self.catalog.by_uuid(&uuid).is_some(),
            Ok(None) => self.catalog.by_type(desc.comp_type).is_some(),
            Err(_) => false,
        }
    }
}

impl Default for TopologyValidator {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Validates `topology` for `core_count` cores and the built-in drivers.
pub fn validate_topology(topology: &Topology, core_count: usize) -> ValidationResult<()> {
    TopologyValidator::new(core_count).validate(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ComponentSpec, ConnectSpec, RequestConfig, TriggerSpec};

    fn topology(requests: Vec<RequestConfig>) -> Topology {
        Topology {
            name: "test".into(),
            description: None,
            requests,
        }
    }

    #[test]
    fn accepts_plain_mixer() {
        let t = topology(vec![RequestConfig::ComponentNew(ComponentSpec::new(1, "mixer", 1))]);
        assert!(validate_topology(&t, 1).is_ok());
    }

    #[test]
    fn core_checked_against_count() {
        let t = topology(vec![RequestConfig::ComponentNew(
            ComponentSpec::new(1, "mixer", 1).on_core(2),
        )]);
        assert!(validate_topology(&t, 4).is_ok());
        assert_eq!(
            validate_topology(&t, 2),
            Err(ValidationError::CoreOutOfRange {
                index: 0,
                core: 2,
                cores: 2
            })
        );
    }

    #[test]
    fn collects_every_error() {
        let t = topology(vec![
            RequestConfig::ComponentNew(ComponentSpec::new(1, "flanger", 1)),
            RequestConfig::Connect(ConnectSpec { source: 1, sink: 2 }),
            RequestConfig::Trigger(TriggerSpec {
                id: 1,
                trigger: "go".into(),
            }),
        ]);
        let Err(ValidationError::Multiple(errors)) = validate_topology(&t, 1) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::UnknownName { index: 0, .. }));
        assert!(matches!(errors[1], ValidationError::UnknownName { index: 2, .. }));
    }

    #[test]
    fn unknown_uuid_has_no_driver() {
        let mut spec = ComponentSpec::new(5, "volume", 1);
        spec.uuid = Some("00000000-0000-0000-0000-000000000001".into());
        let t = topology(vec![RequestConfig::ComponentNew(spec)]);
        assert_eq!(
            validate_topology(&t, 1),
            Err(ValidationError::NoDriver { index: 0, id: 5 })
        );
    }

    #[test]
    fn switch_has_no_builtin_driver() {
        let t = topology(vec![RequestConfig::ComponentNew(ComponentSpec::new(1, "switch", 1))]);
        assert_eq!(
            validate_topology(&t, 1),
            Err(ValidationError::NoDriver { index: 0, id: 1 })
        );
        let empty = TopologyValidator::with_catalog(DriverCatalog::empty(), 1);
        assert!(empty.validate(&topology(Vec::new())).is_ok());
    }
}
