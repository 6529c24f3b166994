//! Built-in component driver catalog for the ostinato runtime.
//!
//! This crate owns the set of drivers the firmware ships with: their type
//! codes, 128-bit type identifiers and factories. The runtime core only sees
//! the resulting [`DriverList`]; this catalog adds the metadata a host tool
//! needs to list and filter drivers.
//!
//! # Features
//!
//! - **Driver Discovery**: List every built-in driver with its identifiers
//! - **Factory Lookup**: Build driver behavior by name from a configuration
//! - **Category System**: Drivers grouped by role (endpoint, rate conversion, ...)
//! - **Driver Table**: Export a [`DriverList`] for the graph registry
//!
//! # Example
//!
//! ```rust
//! use ostinato_registry::{DriverCatalog, DriverCategory};
//!
//! let catalog = DriverCatalog::new();
//!
//! for driver in catalog.all_drivers() {
//!     println!("{} {}: {}", driver.uuid, driver.id, driver.description);
//! }
//!
//! for driver in catalog.drivers_in_category(DriverCategory::RateConversion) {
//!     println!("converter: {}", driver.id);
//! }
//!
//! // Table handed to the graph registry.
//! let drivers = catalog.driver_list();
//! assert_eq!(drivers.len(), catalog.len());
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! ostinato-registry = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use ostinato_core::{
    ComponentConfig, ComponentFactory, ComponentOps, ComponentType, DriverInfo, DriverList, Error,
    Result, TypeUuid,
};

mod drivers;

pub use drivers::{MAX_RATE, VOLUME_MAX_CHANNELS};

/// Role of a driver, for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCategory {
    /// Host DMA and DAI endpoints
    Endpoint,
    /// Gain stages
    Gain,
    /// Mixing and channel routing
    Routing,
    /// Sample-rate converters
    RateConversion,
    /// Signal generators
    Generator,
    /// Filters and other blob-configured processing
    Processing,
    /// Wake-on-voice components
    Detection,
}

impl DriverCategory {
    /// All categories in display order.
    pub const ALL: [Self; 7] = [
        Self::Endpoint,
        Self::Gain,
        Self::Routing,
        Self::RateConversion,
        Self::Generator,
        Self::Processing,
        Self::Detection,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            DriverCategory::Endpoint => "Endpoint",
            DriverCategory::Gain => "Gain",
            DriverCategory::Routing => "Routing",
            DriverCategory::RateConversion => "Rate Conversion",
            DriverCategory::Generator => "Generator",
            DriverCategory::Processing => "Processing",
            DriverCategory::Detection => "Detection",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            DriverCategory::Endpoint => "Host DMA and digital audio interface endpoints",
            DriverCategory::Gain => "Volume and gain stages with ramping",
            DriverCategory::Routing => "Mixers, multiplexers and channel selectors",
            DriverCategory::RateConversion => "Synchronous and asynchronous rate converters",
            DriverCategory::Generator => "Test tone generators",
            DriverCategory::Processing => "Equalizers, DC blocking and codec processing",
            DriverCategory::Detection => "Key-phrase buffering and keyword detection",
        }
    }
}

/// Describes a driver in the catalog.
#[derive(Debug, Clone)]
pub struct DriverDescriptor {
    /// Unique identifier for the driver (lowercase, no spaces).
    pub id: &'static str,
    /// Brief description of the driver.
    pub description: &'static str,
    /// Category for organization.
    pub category: DriverCategory,
    /// Component type code the driver serves.
    pub type_code: ComponentType,
    /// 128-bit type identifier.
    pub uuid: TypeUuid,
}

/// Internal entry in the catalog.
struct CatalogEntry {
    descriptor: DriverDescriptor,
    factory: ComponentFactory,
}

/// Catalog of the built-in component drivers.
///
/// Registration order is lookup order: when two drivers serve the same type
/// code, the earlier one answers type-code lookups.
pub struct DriverCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for DriverCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverCatalog {
    /// Creates a catalog holding every built-in driver.
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register_builtin_drivers();
        catalog
    }

    /// Creates a catalog with no drivers.
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn register_builtin_drivers(&mut self) {
        use DriverCategory::{
            Detection, Endpoint, Gain, Generator, Processing, RateConversion, Routing,
        };
        use drivers as d;

        self.register(
            DriverDescriptor {
                id: "host",
                description: "Host DMA endpoint",
                category: Endpoint,
                type_code: ComponentType::HOST,
                uuid: TypeUuid::from_fields(
                    0x8b9d_100c,
                    0x6d78,
                    0x418f,
                    [0x90, 0xa3, 0xe0, 0xe8, 0x05, 0xd0, 0x85, 0x2b],
                ),
            },
            d::host,
        );
        self.register(
            DriverDescriptor {
                id: "dai",
                description: "Digital audio interface endpoint",
                category: Endpoint,
                type_code: ComponentType::DAI,
                uuid: TypeUuid::from_fields(
                    0xc2b0_0d27,
                    0xffbc,
                    0x4150,
                    [0xa5, 0x1a, 0x24, 0x5c, 0x79, 0xc5, 0xe5, 0x4b],
                ),
            },
            d::dai,
        );
        self.register(
            DriverDescriptor {
                id: "volume",
                description: "Per-channel volume with ramping",
                category: Gain,
                type_code: ComponentType::VOLUME,
                uuid: TypeUuid::from_fields(
                    0xb77e_677e,
                    0x5ff4,
                    0x4188,
                    [0xaf, 0x14, 0xfb, 0xa8, 0xbd, 0xbf, 0x86, 0x82],
                ),
            },
            d::volume,
        );
        self.register(
            DriverDescriptor {
                id: "mixer",
                description: "Sums several sources into one sink",
                category: Routing,
                type_code: ComponentType::MIXER,
                uuid: TypeUuid::from_fields(
                    0xbc06_c037,
                    0x12aa,
                    0x417c,
                    [0x9a, 0x97, 0x89, 0x28, 0x2e, 0x32, 0x1a, 0x76],
                ),
            },
            d::plain,
        );
        self.register(
            DriverDescriptor {
                id: "mux",
                description: "Channel multiplexer",
                category: Routing,
                type_code: ComponentType::MUX,
                uuid: TypeUuid::from_fields(
                    0xc607_ff4d,
                    0x9cb6,
                    0x49dc,
                    [0xb6, 0x78, 0x7d, 0xa3, 0xc6, 0x3e, 0xa5, 0x57],
                ),
            },
            d::mux,
        );
        self.register(
            DriverDescriptor {
                id: "demux",
                description: "Channel demultiplexer",
                category: Routing,
                type_code: ComponentType::DEMUX,
                uuid: TypeUuid::from_fields(
                    0xc4b2_6868,
                    0x1430,
                    0x470e,
                    [0xa0, 0x89, 0x15, 0xd1, 0xc7, 0x7f, 0x85, 0x1a],
                ),
            },
            d::demux,
        );
        self.register(
            DriverDescriptor {
                id: "selector",
                description: "Channel selector",
                category: Routing,
                type_code: ComponentType::SELECTOR,
                uuid: TypeUuid::from_fields(
                    0x55a8_8ed5,
                    0x3d18,
                    0x46ca,
                    [0x88, 0xf1, 0x0e, 0xe6, 0xea, 0xe9, 0x93, 0x0f],
                ),
            },
            d::selector,
        );
        self.register(
            DriverDescriptor {
                id: "src",
                description: "Synchronous sample-rate converter",
                category: RateConversion,
                type_code: ComponentType::SRC,
                uuid: TypeUuid::from_fields(
                    0xc1c5_326d,
                    0x8390,
                    0x46b4,
                    [0xaa, 0x47, 0x95, 0xc3, 0xbe, 0xca, 0x65, 0x50],
                ),
            },
            d::src,
        );
        self.register(
            DriverDescriptor {
                id: "asrc",
                description: "Asynchronous sample-rate converter",
                category: RateConversion,
                type_code: ComponentType::ASRC,
                uuid: TypeUuid::from_fields(
                    0xc8ec_72f6,
                    0x8526,
                    0x4faf,
                    [0x9d, 0x39, 0xa2, 0x3d, 0x0b, 0x54, 0x1d, 0xe2],
                ),
            },
            d::asrc,
        );
        self.register(
            DriverDescriptor {
                id: "tone",
                description: "Sine tone generator",
                category: Generator,
                type_code: ComponentType::TONE,
                uuid: TypeUuid::from_fields(
                    0x04e3_f894,
                    0x2c5c,
                    0x4f2e,
                    [0x8d, 0xc1, 0x69, 0x4e, 0xea, 0xab, 0x53, 0xfa],
                ),
            },
            d::tone,
        );
        self.register(
            DriverDescriptor {
                id: "eq-iir",
                description: "IIR equalizer",
                category: Processing,
                type_code: ComponentType::EQ_IIR,
                uuid: TypeUuid::from_fields(
                    0x5150_c0e6,
                    0x27f9,
                    0x4ec8,
                    [0x83, 0x51, 0xc7, 0x05, 0xb6, 0x42, 0xd1, 0x2f],
                ),
            },
            d::eq_iir,
        );
        self.register(
            DriverDescriptor {
                id: "eq-fir",
                description: "FIR equalizer",
                category: Processing,
                type_code: ComponentType::EQ_FIR,
                uuid: TypeUuid::from_fields(
                    0x43a9_0ce7,
                    0xf3a5,
                    0x41df,
                    [0xac, 0x06, 0xba, 0x98, 0x65, 0x1a, 0xe6, 0xa3],
                ),
            },
            d::eq_fir,
        );
        self.register(
            DriverDescriptor {
                id: "dcblock",
                description: "DC blocking filter",
                category: Processing,
                type_code: ComponentType::DCBLOCK,
                uuid: TypeUuid::from_fields(
                    0xb809_efaf,
                    0x5681,
                    0x42b1,
                    [0x9e, 0xd6, 0x04, 0xbb, 0x01, 0x2d, 0xd3, 0x84],
                ),
            },
            d::dcblock,
        );
        self.register(
            DriverDescriptor {
                id: "smart-amp",
                description: "Speaker protection with feedback",
                category: Processing,
                type_code: ComponentType::SMART_AMP,
                uuid: TypeUuid::from_fields(
                    0x167a_961e,
                    0x8ae4,
                    0x11ea,
                    [0x89, 0xf1, 0x00, 0x0c, 0x29, 0xce, 0x16, 0x35],
                ),
            },
            d::smart_amp,
        );
        self.register(
            DriverDescriptor {
                id: "codec-adaptor",
                description: "Adapter for third-party codec libraries",
                category: Processing,
                type_code: ComponentType::CODEC_ADAPTOR,
                uuid: TypeUuid::from_fields(
                    0xd944_281a,
                    0xafe9,
                    0x4695,
                    [0xa0, 0x43, 0xd7, 0xf6, 0x2b, 0x89, 0x53, 0x8e],
                ),
            },
            d::codec_adaptor,
        );
        self.register(
            DriverDescriptor {
                id: "kpb",
                description: "Key-phrase history buffer",
                category: Detection,
                type_code: ComponentType::KPB,
                uuid: TypeUuid::from_fields(
                    0xd821_8443,
                    0x5ff3,
                    0x4a4c,
                    [0xb3, 0x88, 0x6c, 0xfe, 0x07, 0xb9, 0x56, 0x2e],
                ),
            },
            d::kpb,
        );
        self.register(
            DriverDescriptor {
                id: "keyword-detect",
                description: "Keyword detector",
                category: Detection,
                type_code: ComponentType::KEYWORD_DETECT,
                uuid: TypeUuid::from_fields(
                    0xeba8_d51f,
                    0x7827,
                    0x47b5,
                    [0x82, 0xee, 0xde, 0x6e, 0x77, 0x43, 0xaf, 0x67],
                ),
            },
            d::keyword_detect,
        );
    }

    /// Appends a driver. Earlier registrations win type-code lookups.
    pub fn register(&mut self, descriptor: DriverDescriptor, factory: ComponentFactory) {
        #[cfg(feature = "tracing")]
        tracing::debug!("catalog: {} {} {}", descriptor.id, descriptor.type_code, descriptor.uuid);
        self.entries.push(CatalogEntry {
            descriptor,
            factory,
        });
    }

    /// Returns descriptors for all drivers.
    pub fn all_drivers(&self) -> Vec<&DriverDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for drivers in a specific category.
    pub fn drivers_in_category(&self, category: DriverCategory) -> Vec<&DriverDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Gets a driver descriptor by id.
    pub fn get(&self, id: &str) -> Option<&DriverDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// First driver serving `type_code`.
    pub fn by_type(&self, type_code: ComponentType) -> Option<&DriverDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.type_code == type_code)
            .map(|e| &e.descriptor)
    }

    /// Driver with type identifier `uuid`.
    pub fn by_uuid(&self, uuid: &TypeUuid) -> Option<&DriverDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.uuid == *uuid)
            .map(|e| &e.descriptor)
    }

    /// Builds driver behavior for `config` with the driver named `id`.
    ///
    /// Fails [`Error::DriverNotFound`] for unknown ids; otherwise returns the
    /// factory's verdict on the configuration.
    pub fn create(&self, id: &str, config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .ok_or(Error::DriverNotFound)?;
        (entry.factory)(config)
    }

    /// Exports the catalog as the driver table the graph registry resolves
    /// against, in registration order.
    pub fn driver_list(&self) -> DriverList {
        let mut list = DriverList::new();
        for entry in &self.entries {
            list.register(DriverInfo {
                type_code: entry.descriptor.type_code,
                uuid: entry.descriptor.uuid,
                name: entry.descriptor.id,
                factory: entry.factory,
            });
        }
        list
    }

    /// Returns the number of registered drivers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no drivers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for DriverCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.descriptor.id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ostinato_core::{
        CompDescriptor, CoreId, EntryId, KindFields, PipelineId, SrcConfig,
        VolumeConfig, build_config,
    };

    #[test]
    fn test_catalog_creation() {
        let catalog = DriverCatalog::new();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.len(), 17);
        assert!(DriverCatalog::empty().is_empty());
    }

    #[test]
    fn test_all_drivers() {
        let catalog = DriverCatalog::new();
        let ids: Vec<_> = catalog.all_drivers().iter().map(|d| d.id).collect();
        assert_eq!(ids[0], "host");
        assert!(ids.contains(&"volume"));
        assert!(ids.contains(&"keyword-detect"));
    }

    #[test]
    fn test_get_driver() {
        let catalog = DriverCatalog::new();
        let volume = catalog.get("volume").unwrap();
        assert_eq!(volume.type_code, ComponentType::VOLUME);
        assert_eq!(
            volume.uuid,
            TypeUuid::parse("b77e677e-5ff4-4188-af14-fba8bdbf8682").unwrap()
        );
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn test_drivers_by_category() {
        let catalog = DriverCatalog::new();
        let converters: Vec<_> = catalog
            .drivers_in_category(DriverCategory::RateConversion)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(converters, ["src", "asrc"]);

        let total: usize = DriverCategory::ALL
            .iter()
            .map(|&c| catalog.drivers_in_category(c).len())
            .sum();
        assert_eq!(total, catalog.len());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(DriverCategory::Endpoint.name(), "Endpoint");
        assert_eq!(DriverCategory::RateConversion.name(), "Rate Conversion");
        assert!(!DriverCategory::Detection.description().is_empty());
    }

    #[test]
    fn test_identifiers_unique() {
        let catalog = DriverCatalog::new();
        let all = catalog.all_drivers();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.uuid, b.uuid, "{} and {}", a.id, b.id);
                assert_ne!(a.type_code, b.type_code, "{} and {}", a.id, b.id);
                assert_ne!(a.id, b.id);
            }
            assert_eq!(a.type_code.name(), a.id, "id follows the type name");
        }
    }

    #[test]
    fn test_lookup_by_type_and_uuid() {
        let catalog = DriverCatalog::new();
        let tone = catalog.by_type(ComponentType::TONE).unwrap();
        assert_eq!(tone.id, "tone");
        assert_eq!(catalog.by_uuid(&tone.uuid).unwrap().id, "tone");
        assert!(catalog.by_type(ComponentType::SWITCH).is_none());
    }

    #[test]
    fn test_create_driver() {
        let catalog = DriverCatalog::new();
        let desc = CompDescriptor::new(EntryId(1), ComponentType::VOLUME, PipelineId(1), 0)
            .with_fields(KindFields::Volume(VolumeConfig {
                channels: 2,
                max_value: 100,
                ..VolumeConfig::default()
            }));
        let config = build_config(&desc, CoreId::PRIMARY).unwrap();
        assert!(catalog.create("volume", &config).is_ok());
        assert_eq!(catalog.create("src", &config).err(), Some(Error::InvalidDescriptor));
        assert_eq!(catalog.create("reverb", &config).err(), Some(Error::DriverNotFound));
    }

    #[test]
    fn test_driver_list_resolves() {
        let drivers = DriverCatalog::new().driver_list();
        assert_eq!(drivers.len(), 17);

        // Identifier lookup ignores the numeric type.
        let src = TypeUuid::parse("c1c5326d-8390-46b4-aa47-95c3beca6550").unwrap();
        let desc = CompDescriptor::new(EntryId(3), ComponentType::MIXER, PipelineId(1), 0)
            .with_uuid(src);
        assert_eq!(drivers.resolve(&desc).unwrap().name, "src");

        let desc = CompDescriptor::new(EntryId(3), ComponentType::SRC, PipelineId(1), 0)
            .with_fields(KindFields::Src(SrcConfig {
                sink_rate: 48_000,
                ..SrcConfig::default()
            }));
        let driver = drivers.resolve(&desc).unwrap();
        let config = build_config(&desc, CoreId::PRIMARY).unwrap();
        assert!((driver.factory)(&config).is_ok());
    }
}
