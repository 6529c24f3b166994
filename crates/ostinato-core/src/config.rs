//! Driver-agnostic component construction requests.
//!
//! A create-component descriptor carries generic fields (core, ids, type,
//! frame format, period counts, xrun action) plus one block of kind-specific
//! fields. [`build_config`] turns that pair into a [`ComponentConfig`]:
//! a [`CommonConfig`] and a [`SpecificConfig`] variant selected by the
//! component type. Kind-specific fields that do not fit the type are rejected
//! rather than reinterpreted.
//!
//! | type code                         | specific variant        |
//! |-----------------------------------|-------------------------|
//! | HOST, SG_HOST                     | `Host` or `File`        |
//! | DAI, SG_DAI                       | `Dai` or `File`         |
//! | VOLUME                            | `Volume`                |
//! | SRC                               | `Src`                   |
//! | ASRC                              | `Asrc`                  |
//! | TONE                              | `Tone`                  |
//! | EQ_IIR .. CODEC_ADAPTOR (process) | `Process`               |
//! | anything else                     | `None`                  |

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::descriptor::{CompDescriptor, KindFields};
use crate::error::{Error, Result};
use crate::ids::{CoreId, EntryId, PipelineId};
use crate::stream::{FrameFormat, StreamDirection};

/// Numeric component type code.
///
/// Open-ended: drivers may register codes outside the built-in set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(pub u32);

impl ComponentType {
    /// No type.
    pub const NONE: Self = Self(0);
    /// Host DMA endpoint.
    pub const HOST: Self = Self(1);
    /// DAI endpoint.
    pub const DAI: Self = Self(2);
    /// Scatter-gather host endpoint.
    pub const SG_HOST: Self = Self(3);
    /// Scatter-gather DAI endpoint.
    pub const SG_DAI: Self = Self(4);
    /// Volume with ramping.
    pub const VOLUME: Self = Self(5);
    /// Mixer.
    pub const MIXER: Self = Self(6);
    /// Channel multiplexer.
    pub const MUX: Self = Self(7);
    /// Sample-rate converter.
    pub const SRC: Self = Self(8);
    /// Splitter.
    pub const SPLITTER: Self = Self(9);
    /// Tone generator.
    pub const TONE: Self = Self(10);
    /// Switch.
    pub const SWITCH: Self = Self(11);
    /// Buffer pseudo-component.
    pub const BUFFER: Self = Self(12);
    /// IIR equalizer.
    pub const EQ_IIR: Self = Self(13);
    /// FIR equalizer.
    pub const EQ_FIR: Self = Self(14);
    /// Keyword detector.
    pub const KEYWORD_DETECT: Self = Self(15);
    /// Key-phrase buffer.
    pub const KPB: Self = Self(16);
    /// Channel selector.
    pub const SELECTOR: Self = Self(17);
    /// Channel demultiplexer.
    pub const DEMUX: Self = Self(18);
    /// Asynchronous sample-rate converter.
    pub const ASRC: Self = Self(19);
    /// DC blocker.
    pub const DCBLOCK: Self = Self(20);
    /// Smart amplifier.
    pub const SMART_AMP: Self = Self(21);
    /// Codec adaptor.
    pub const CODEC_ADAPTOR: Self = Self(22);

    /// Returns `true` for host endpoint types.
    pub const fn is_host(self) -> bool {
        matches!(self.0, 1 | 3)
    }

    /// Returns `true` for DAI endpoint types.
    pub const fn is_dai(self) -> bool {
        matches!(self.0, 2 | 4)
    }

    /// Returns `true` for types configured by an opaque processing blob.
    pub const fn is_process(self) -> bool {
        matches!(self.0, 7 | 13..=18 | 20..=22)
    }

    /// Short lowercase name, or `"custom"` for codes outside the built-in set.
    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "none",
            1 => "host",
            2 => "dai",
            3 => "sg-host",
            4 => "sg-dai",
            5 => "volume",
            6 => "mixer",
            7 => "mux",
            8 => "src",
            9 => "splitter",
            10 => "tone",
            11 => "switch",
            12 => "buffer",
            13 => "eq-iir",
            14 => "eq-fir",
            15 => "keyword-detect",
            16 => "kpb",
            17 => "selector",
            18 => "demux",
            19 => "asrc",
            20 => "dcblock",
            21 => "smart-amp",
            22 => "codec-adaptor",
            _ => "custom",
        }
    }

    /// Looks up a built-in type by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        (0..=22).map(Self).find(|t| t.name() == name)
    }
}

impl core::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// Host endpoint transfer configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct HostConfig {
    /// Stream direction.
    pub direction: StreamDirection,
    /// Run without a period interrupt.
    pub no_irq: bool,
    /// DMA controller configuration word.
    pub dmac_config: u32,
}

/// DAI endpoint configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DaiConfig {
    /// DAI instance index.
    pub dai_index: u32,
    /// Stream direction.
    pub direction: StreamDirection,
    /// DAI hardware type code.
    pub dai_type: u32,
}

/// Volume ramp configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct VolumeConfig {
    /// Channel count.
    pub channels: u32,
    /// Ramp length in milliseconds applied at start.
    pub initial_ramp: u32,
    /// Maximum gain value.
    pub max_value: u32,
    /// Minimum gain value.
    pub min_value: u32,
    /// Ramp shape code.
    pub ramp: u32,
}

/// Sample-rate converter configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SrcConfig {
    /// Supported rate mask.
    pub rate_mask: u32,
    /// Output rate in Hz, 0 to follow the sink buffer.
    pub sink_rate: u32,
    /// Input rate in Hz, 0 to follow the source buffer.
    pub source_rate: u32,
}

/// Asynchronous sample-rate converter configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AsrcConfig {
    /// Input rate in Hz.
    pub source_rate: u32,
    /// Output rate in Hz.
    pub sink_rate: u32,
    /// Track an asynchronous clock domain.
    pub asynchronous_mode: bool,
    /// Push or pull operation code.
    pub operation_mode: u32,
}

/// Tone generator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ToneConfig {
    /// Amplitude multiplier per repeat.
    pub ampl_mult: i32,
    /// Initial amplitude.
    pub amplitude: i32,
    /// Frequency multiplier per repeat.
    pub freq_mult: i32,
    /// Initial frequency.
    pub frequency: i32,
    /// Tone length in samples.
    pub length: u32,
    /// Repeat period in samples.
    pub period: u32,
    /// Amplitude ramp step.
    pub ramp_step: u32,
    /// Number of repeats.
    pub repeats: u32,
    /// Sample rate in Hz.
    pub sample_rate: i32,
}

/// Opaque processing configuration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ProcessConfig {
    /// Processing type code the blob is meant for.
    pub process_type: ComponentType,
    /// Driver-defined payload.
    pub data: Vec<u8>,
}

impl ProcessConfig {
    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl Default for ComponentType {
    fn default() -> Self {
        Self::NONE
    }
}

/// File endpoint used by host-side test benches in place of host/DAI.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FileConfig {
    /// Channel count.
    pub channels: u32,
    /// File name.
    pub file_name: String,
    /// Frame format of the file.
    pub frame_fmt: FrameFormat,
    /// Read or write mode code.
    pub mode: u32,
    /// Sample rate in Hz.
    pub rate: u32,
}

/// Kind-specific construction parameters.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SpecificConfig {
    /// Type takes no specific configuration.
    #[default]
    None,
    /// Host endpoint.
    Host(HostConfig),
    /// DAI endpoint.
    Dai(DaiConfig),
    /// Volume.
    Volume(VolumeConfig),
    /// Sample-rate converter.
    Src(SrcConfig),
    /// Asynchronous sample-rate converter.
    Asrc(AsrcConfig),
    /// Tone generator.
    Tone(ToneConfig),
    /// Opaque processing blob.
    Process(ProcessConfig),
    /// File endpoint.
    File(FileConfig),
}

impl SpecificConfig {
    /// Stream direction for endpoint kinds.
    pub fn direction(&self) -> Option<StreamDirection> {
        match self {
            Self::Host(h) => Some(h.direction),
            Self::Dai(d) => Some(d.direction),
            _ => None,
        }
    }
}

/// Generic construction parameters shared by every component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonConfig {
    /// Owning core.
    pub core: CoreId,
    /// Entry id.
    pub id: EntryId,
    /// Pipeline the component belongs to.
    pub pipeline_id: PipelineId,
    /// Type code.
    pub comp_type: ComponentType,
    /// Frame format.
    pub frame_fmt: FrameFormat,
    /// Periods in the sink buffer.
    pub periods_sink: u32,
    /// Periods in the source buffer.
    pub periods_source: u32,
    /// Action on xrun.
    pub xrun_action: u32,
}

/// A complete, driver-agnostic construction request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentConfig {
    /// Generic fields.
    pub common: CommonConfig,
    /// Kind-specific fields.
    pub specific: SpecificConfig,
}

/// Translates a validated descriptor into a construction request.
///
/// `core` must already be validated by the caller.
pub fn build_config(desc: &CompDescriptor, core: CoreId) -> Result<ComponentConfig> {
    let mut common = CommonConfig {
        core,
        id: desc.id,
        pipeline_id: desc.pipeline_id,
        comp_type: desc.comp_type,
        frame_fmt: FrameFormat::default(),
        periods_sink: 0,
        periods_source: 0,
        xrun_action: 0,
    };
    if desc.comp_type != ComponentType::BUFFER {
        let block = &desc.config;
        common.frame_fmt = block.frame_fmt;
        common.periods_sink = block.periods_sink;
        common.periods_source = block.periods_source;
        common.xrun_action = block.xrun_action;
    }

    let specific = build_specific(desc.comp_type, &desc.fields)?;
    Ok(ComponentConfig { common, specific })
}

fn build_specific(comp_type: ComponentType, fields: &KindFields) -> Result<SpecificConfig> {
    let spec = match (comp_type, fields) {
        (t, KindFields::File(f)) if t.is_host() || t.is_dai() => SpecificConfig::File(f.clone()),
        (t, KindFields::Host(h)) if t.is_host() => SpecificConfig::Host(h.clone()),
        (t, KindFields::Dai(d)) if t.is_dai() => SpecificConfig::Dai(d.clone()),
        (ComponentType::VOLUME, KindFields::Volume(v)) => SpecificConfig::Volume(v.clone()),
        (ComponentType::SRC, KindFields::Src(s)) => SpecificConfig::Src(s.clone()),
        (ComponentType::ASRC, KindFields::Asrc(a)) => SpecificConfig::Asrc(a.clone()),
        (ComponentType::TONE, KindFields::Tone(t)) => SpecificConfig::Tone(t.clone()),
        (t, KindFields::Process(data)) if t.is_process() => {
            SpecificConfig::Process(ProcessConfig {
                process_type: t,
                data: data.clone(),
            })
        }
        (t, _) if needs_specific(t) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("build_config: fields do not match type {t}");
            return Err(Error::InvalidDescriptor);
        }
        _ => SpecificConfig::None,
    };
    Ok(spec)
}

fn needs_specific(t: ComponentType) -> bool {
    t.is_host()
        || t.is_dai()
        || t.is_process()
        || matches!(
            t,
            ComponentType::VOLUME | ComponentType::SRC | ComponentType::ASRC | ComponentType::TONE
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ConfigBlock;

    fn desc(comp_type: ComponentType, fields: KindFields) -> CompDescriptor {
        CompDescriptor::new(EntryId(4), comp_type, PipelineId(1), 0).with_fields(fields)
    }

    #[test]
    fn common_fields_are_copied() {
        let d = desc(ComponentType::MIXER, KindFields::None).with_config(ConfigBlock {
            periods_sink: 2,
            periods_source: 3,
            frame_fmt: FrameFormat::S32Le,
            xrun_action: 1,
            ..ConfigBlock::default()
        });
        let cfg = build_config(&d, CoreId::PRIMARY).unwrap();
        assert_eq!(cfg.common.id, EntryId(4));
        assert_eq!(cfg.common.periods_sink, 2);
        assert_eq!(cfg.common.periods_source, 3);
        assert_eq!(cfg.common.frame_fmt, FrameFormat::S32Le);
        assert_eq!(cfg.common.xrun_action, 1);
        assert_eq!(cfg.specific, SpecificConfig::None);
    }

    #[test]
    fn buffer_type_skips_config_block() {
        let d = desc(ComponentType::BUFFER, KindFields::None).with_config(ConfigBlock {
            periods_sink: 9,
            ..ConfigBlock::default()
        });
        let cfg = build_config(&d, CoreId::PRIMARY).unwrap();
        assert_eq!(cfg.common.periods_sink, 0);
    }

    #[test]
    fn process_types_carry_their_type_code() {
        let d = desc(ComponentType::EQ_IIR, KindFields::Process(vec![1, 2, 3]));
        let cfg = build_config(&d, CoreId::PRIMARY).unwrap();
        match cfg.specific {
            SpecificConfig::Process(p) => {
                assert_eq!(p.process_type, ComponentType::EQ_IIR);
                assert_eq!(p.size(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn host_and_dai_accept_file_endpoints() {
        let file = FileConfig {
            channels: 2,
            file_name: "in.raw".into(),
            rate: 48_000,
            ..FileConfig::default()
        };
        for t in [ComponentType::HOST, ComponentType::SG_DAI] {
            let cfg = build_config(&desc(t, KindFields::File(file.clone())), CoreId::PRIMARY);
            assert!(matches!(cfg.unwrap().specific, SpecificConfig::File(_)));
        }
        let cfg = build_config(&desc(ComponentType::VOLUME, KindFields::File(file)), CoreId::PRIMARY);
        assert_eq!(cfg, Err(Error::InvalidDescriptor));
    }

    #[test]
    fn mismatched_fields_are_rejected() {
        let d = desc(ComponentType::VOLUME, KindFields::Src(SrcConfig::default()));
        assert_eq!(build_config(&d, CoreId::PRIMARY), Err(Error::InvalidDescriptor));
        let d = desc(ComponentType::TONE, KindFields::None);
        assert_eq!(build_config(&d, CoreId::PRIMARY), Err(Error::InvalidDescriptor));
    }

    #[test]
    fn fields_on_plain_types_are_ignored() {
        let d = desc(ComponentType::MIXER, KindFields::Volume(VolumeConfig::default()));
        let cfg = build_config(&d, CoreId::PRIMARY).unwrap();
        assert_eq!(cfg.specific, SpecificConfig::None);
    }

    #[test]
    fn type_names_round_trip() {
        assert_eq!(ComponentType::from_name("volume"), Some(ComponentType::VOLUME));
        assert_eq!(ComponentType::from_name("codec-adaptor"), Some(ComponentType::CODEC_ADAPTOR));
        assert_eq!(ComponentType::from_name("nope"), None);
        assert_eq!(ComponentType(900).name(), "custom");
        assert!(ComponentType::MUX.is_process());
        assert!(!ComponentType::MIXER.is_process());
    }
}
