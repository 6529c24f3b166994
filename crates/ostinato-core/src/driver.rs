//! Driver lookup table.
//!
//! A [`DriverList`] maps a component type code or a 128-bit type identifier
//! to a factory. Lookup is a pure function of the table and the descriptor:
//!
//! - if the descriptor declares extension data, the embedded identifier is
//!   matched against driver identifiers;
//! - otherwise the numeric type code is matched;
//! - the first matching driver in registration order wins.
//!
//! The table is populated outside the runtime core (see the
//! `ostinato-registry` crate for the built-in set).

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use crate::component::ComponentOps;
use crate::config::{ComponentConfig, ComponentType};
use crate::descriptor::CompDescriptor;
use crate::error::{Error, Result};
use crate::ids::TypeUuid;

/// Factory building driver behavior from a construction request.
pub type ComponentFactory = fn(&ComponentConfig) -> Result<Box<dyn ComponentOps>>;

/// A registered driver.
#[derive(Clone, Copy)]
pub struct DriverInfo {
    /// Type code the driver serves.
    pub type_code: ComponentType,
    /// Type identifier the driver serves.
    pub uuid: TypeUuid,
    /// Driver name.
    pub name: &'static str,
    /// Constructor.
    pub factory: ComponentFactory,
}

impl core::fmt::Debug for DriverInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DriverInfo")
            .field("type_code", &self.type_code)
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered driver table.
#[derive(Debug, Default, Clone)]
pub struct DriverList {
    entries: Vec<DriverInfo>,
}

impl DriverList {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a driver. Earlier registrations take precedence on lookup.
    pub fn register(&mut self, driver: DriverInfo) {
        #[cfg(feature = "tracing")]
        tracing::debug!("driver_register: {} {} {}", driver.name, driver.type_code, driver.uuid);
        self.entries.push(driver);
    }

    /// All drivers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DriverInfo> {
        self.entries.iter()
    }

    /// Number of registered drivers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no drivers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First driver registered for `uuid`.
    pub fn find_by_uuid(&self, uuid: &TypeUuid) -> Option<&DriverInfo> {
        self.entries.iter().find(|d| d.uuid == *uuid)
    }

    /// First driver registered for `type_code`.
    pub fn find_by_type(&self, type_code: ComponentType) -> Option<&DriverInfo> {
        self.entries.iter().find(|d| d.type_code == type_code)
    }

    /// Resolves the driver for a create-component request.
    ///
    /// Fails [`Error::InvalidDescriptor`] when the declared sizes do not hold
    /// the extension or identifier, and [`Error::DriverNotFound`] when nothing
    /// matches.
    pub fn resolve(&self, desc: &CompDescriptor) -> Result<&DriverInfo> {
        let found = match desc.type_uuid()? {
            Some(uuid) => self.find_by_uuid(&uuid),
            None => self.find_by_type(desc.comp_type),
        };
        found.ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::warn!("driver not found for comp {} type {}", desc.id, desc.comp_type);
            Error::DriverNotFound
        })
    }
}
