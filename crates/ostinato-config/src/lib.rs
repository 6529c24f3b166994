//! Topology files for the ostinato audio DSP runtime.
//!
//! A topology is an ordered list of control requests (create, connect,
//! complete, trigger, free) written as TOML. This crate loads and saves
//! topologies and turns them into [`ControlRequest`]s, validating every
//! request before any of them is handed to the runtime.
//!
//! # Features
//!
//! - **Topology Files**: Load and save request lists as TOML
//! - **Readable Names**: Types, frame formats, triggers and identifiers as text
//! - **Validation**: Unknown names, malformed identifiers, out-of-range cores
//!   and components without a driver are all reported up front
//!
//! # Example
//!
//! ```rust,no_run
//! use ostinato_config::{Topology, TopologyValidator};
//!
//! let topology = Topology::load("playback.toml").unwrap();
//! let requests = TopologyValidator::new(2).compile(&topology).unwrap();
//! for request in &requests {
//!     println!("{}", request.name());
//! }
//! ```

mod error;
mod topology;

/// Request tables and name parsing.
pub mod request;

/// Topology validation.
pub mod validation;

pub use error::ConfigError;
pub use request::{
    AsrcSpec, BufferSpec, ComponentSpec, ConnectSpec, DaiSpec, FileSpec, HostSpec, IdSpec,
    PipelineSpec, ProcessSpec, RequestConfig, SrcSpec, ToneSpec, TriggerSpec, VolumeSpec,
};
pub use topology::Topology;
pub use validation::{TopologyValidator, ValidationError, ValidationResult, validate_topology};

pub use ostinato_core::ControlRequest;
