//! Control requests as written in topology files.
//!
//! Each `[[request]]` table is tagged by `op`. Names (types, frame formats,
//! directions, triggers) and identifiers stay strings here and are parsed by
//! [`RequestConfig::to_request`], so errors can point at the offending
//! request.

use serde::{Deserialize, Serialize};

use ostinato_core::{
    AsrcConfig, BUF_OVERRUN_PERMITTED, BUF_UNDERRUN_PERMITTED, BufferDescriptor, CompDescriptor,
    ComponentType, ConfigBlock, ConnectDescriptor, ControlRequest, DaiConfig, EntryId,
    FileConfig, FrameFormat, HostConfig, KindFields, MemCaps, PipelineDescriptor, PipelineId,
    SrcConfig, StreamDirection, TimeDomain, ToneConfig, Trigger, TypeUuid, VolumeConfig,
};

use crate::validation::{ValidationError, ValidationResult};

/// One control request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum RequestConfig {
    /// Create a component.
    ComponentNew(ComponentSpec),
    /// Create a buffer.
    BufferNew(BufferSpec),
    /// Create a pipeline.
    PipelineNew(PipelineSpec),
    /// Connect a component and a buffer.
    Connect(ConnectSpec),
    /// Finalize a pipeline.
    PipelineComplete(IdSpec),
    /// Free a component.
    ComponentFree(IdSpec),
    /// Free a buffer.
    BufferFree(IdSpec),
    /// Free a pipeline.
    PipelineFree(IdSpec),
    /// Drive a lifecycle transition.
    Trigger(TriggerSpec),
}

/// `component-new` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentSpec {
    /// Entry id.
    pub id: u32,
    /// Type name, e.g. `volume`.
    #[serde(rename = "type")]
    pub comp_type: String,
    /// Optional type identifier; selects the driver instead of the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Pipeline number.
    pub pipeline: u32,
    /// Owning core.
    #[serde(default)]
    pub core: u32,
    /// Frame format name.
    #[serde(default = "default_frame_format")]
    pub frame_format: String,
    /// Periods in the sink buffer.
    #[serde(default = "default_periods")]
    pub periods_sink: u32,
    /// Periods in the source buffer.
    #[serde(default = "default_periods")]
    pub periods_source: u32,
    /// Action on xrun.
    #[serde(default)]
    pub xrun_action: u32,
    /// Host endpoint fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostSpec>,
    /// DAI endpoint fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dai: Option<DaiSpec>,
    /// Volume fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeSpec>,
    /// Sample-rate converter fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<SrcSpec>,
    /// Asynchronous sample-rate converter fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asrc: Option<AsrcSpec>,
    /// Tone generator fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneSpec>,
    /// Processing blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessSpec>,
    /// Test-bench file endpoint fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSpec>,
}

fn default_frame_format() -> String {
    FrameFormat::default().name().to_string()
}

fn default_periods() -> u32 {
    2
}

fn default_direction() -> String {
    "playback".to_string()
}

impl ComponentSpec {
    /// Minimal spec for `comp_type` on core 0.
    pub fn new(id: u32, comp_type: impl Into<String>, pipeline: u32) -> Self {
        Self {
            id,
            comp_type: comp_type.into(),
            uuid: None,
            pipeline,
            core: 0,
            frame_format: default_frame_format(),
            periods_sink: default_periods(),
            periods_source: default_periods(),
            xrun_action: 0,
            host: None,
            dai: None,
            volume: None,
            src: None,
            asrc: None,
            tone: None,
            process: None,
            file: None,
        }
    }

    /// Places the component on `core`.
    pub fn on_core(mut self, core: u32) -> Self {
        self.core = core;
        self
    }

    fn kind_fields(&self, index: usize) -> ValidationResult<KindFields> {
        let mut fields = Vec::new();
        if let Some(h) = &self.host {
            fields.push(KindFields::Host(HostConfig {
                direction: parse_direction(index, &h.direction)?,
                no_irq: h.no_irq,
                dmac_config: h.dmac_config,
            }));
        }
        if let Some(d) = &self.dai {
            fields.push(KindFields::Dai(DaiConfig {
                dai_index: d.index,
                direction: parse_direction(index, &d.direction)?,
                dai_type: d.dai_type,
            }));
        }
        if let Some(v) = &self.volume {
            fields.push(KindFields::Volume(VolumeConfig {
                channels: v.channels,
                initial_ramp: v.initial_ramp,
                max_value: v.max_value,
                min_value: v.min_value,
                ramp: v.ramp,
            }));
        }
        if let Some(s) = &self.src {
            fields.push(KindFields::Src(SrcConfig {
                rate_mask: s.rate_mask,
                sink_rate: s.sink_rate,
                source_rate: s.source_rate,
            }));
        }
        if let Some(a) = &self.asrc {
            fields.push(KindFields::Asrc(AsrcConfig {
                source_rate: a.source_rate,
                sink_rate: a.sink_rate,
                asynchronous_mode: a.asynchronous_mode,
                operation_mode: a.operation_mode,
            }));
        }
        if let Some(t) = &self.tone {
            fields.push(KindFields::Tone(ToneConfig {
                ampl_mult: t.ampl_mult,
                amplitude: t.amplitude,
                freq_mult: t.freq_mult,
                frequency: t.frequency,
                length: t.length,
                period: t.period,
                ramp_step: t.ramp_step,
                repeats: t.repeats,
                sample_rate: t.sample_rate,
            }));
        }
        if let Some(p) = &self.process {
            fields.push(KindFields::Process(p.data.clone()));
        }
        if let Some(f) = &self.file {
            fields.push(KindFields::File(FileConfig {
                channels: f.channels,
                file_name: f.file_name.clone(),
                frame_fmt: parse_frame_format(index, &f.frame_format)?,
                mode: f.mode,
                rate: f.rate,
            }));
        }
        if fields.len() > 1 {
            return Err(ValidationError::ConflictingFields {
                index,
                id: self.id,
            });
        }
        Ok(fields.pop().unwrap_or_default())
    }
}

/// `[request.host]` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HostSpec {
    /// `playback` or `capture`.
    #[serde(default = "default_direction")]
    pub direction: String,
    /// Run without a period interrupt.
    #[serde(default)]
    pub no_irq: bool,
    /// DMA controller configuration word.
    #[serde(default)]
    pub dmac_config: u32,
}

/// `[request.dai]` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct DaiSpec {
    /// DAI instance index.
    #[serde(default)]
    pub index: u32,
    /// `playback` or `capture`.
    #[serde(default = "default_direction")]
    pub direction: String,
    /// DAI hardware type code.
    #[serde(default)]
    pub dai_type: u32,
}

/// `[request.volume]` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct VolumeSpec {
    /// Channel count.
    pub channels: u32,
    /// Start-up ramp in milliseconds.
    pub initial_ramp: u32,
    /// Maximum gain value.
    pub max_value: u32,
    /// Minimum gain value.
    pub min_value: u32,
    /// Ramp shape code.
    pub ramp: u32,
}

/// `[request.src]` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SrcSpec {
    /// Supported rate mask.
    pub rate_mask: u32,
    /// Output rate in Hz.
    pub sink_rate: u32,
    /// Input rate in Hz.
    pub source_rate: u32,
}

/// `[request.asrc]` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AsrcSpec {
    /// Input rate in Hz.
    pub source_rate: u32,
    /// Output rate in Hz.
    pub sink_rate: u32,
    /// Track an asynchronous clock.
    pub asynchronous_mode: bool,
    /// Push or pull operation code.
    pub operation_mode: u32,
}

/// `[request.tone]` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToneSpec {
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

/// `[request.process]` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessSpec {
    /// Driver-defined payload bytes.
    pub data: Vec<u8>,
}

/// `[request.file]` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FileSpec {
    /// File to read or write.
    pub file_name: String,
    /// Channel count.
    #[serde(default)]
    pub channels: u32,
    /// Frame format name.
    #[serde(default = "default_frame_format")]
    pub frame_format: String,
    /// Read or write mode code.
    #[serde(default)]
    pub mode: u32,
    /// Sample rate in Hz.
    #[serde(default)]
    pub rate: u32,
}

/// `buffer-new` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BufferSpec {
    /// Entry id.
    pub id: u32,
    /// Pipeline number.
    pub pipeline: u32,
    /// Owning core.
    #[serde(default)]
    pub core: u32,
    /// Data size in bytes.
    pub size: u32,
    /// Memory capability names; `ram` when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caps: Vec<String>,
    /// Reading past the writer is tolerated.
    #[serde(default)]
    pub underrun_permitted: bool,
    /// Writing past the reader is tolerated.
    #[serde(default)]
    pub overrun_permitted: bool,
}

/// `pipeline-new` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineSpec {
    /// Entry id of the pipeline.
    pub id: u32,
    /// Pipeline number.
    pub pipeline: u32,
    /// Entry id of the scheduling component.
    pub sched: u32,
    /// Owning core.
    #[serde(default)]
    pub core: u32,
    /// Scheduling priority.
    #[serde(default)]
    pub priority: u32,
    /// Period in microseconds.
    #[serde(default = "default_period")]
    pub period: u32,
    /// Worst-case MIPS per period.
    #[serde(default)]
    pub period_mips: u32,
    /// Frames per scheduling run.
    #[serde(default)]
    pub frames_per_sched: u32,
    /// `timer` or `dma`.
    #[serde(default = "default_time_domain")]
    pub time_domain: String,
    /// Tolerated xrun time in microseconds.
    #[serde(default)]
    pub xrun_limit_us: u32,
}

fn default_period() -> u32 {
    1000
}

fn default_time_domain() -> String {
    "timer".to_string()
}

/// `connect` fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectSpec {
    /// Upstream entry.
    pub source: u32,
    /// Downstream entry.
    pub sink: u32,
}

/// Fields of requests that name one entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdSpec {
    /// Entry id.
    pub id: u32,
}

/// `trigger` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerSpec {
    /// Component id.
    pub id: u32,
    /// Trigger name, e.g. `start`.
    pub trigger: String,
}

impl RequestConfig {
    /// Short name of the operation, as written in `op`.
    pub const fn op(&self) -> &'static str {
        match self {
            Self::ComponentNew(_) => "component-new",
            Self::BufferNew(_) => "buffer-new",
            Self::PipelineNew(_) => "pipeline-new",
            Self::Connect(_) => "connect",
            Self::PipelineComplete(_) => "pipeline-complete",
            Self::ComponentFree(_) => "component-free",
            Self::BufferFree(_) => "buffer-free",
            Self::PipelineFree(_) => "pipeline-free",
            Self::Trigger(_) => "trigger",
        }
    }

    /// Core a creation request places its entry on.
    pub fn core(&self) -> Option<u32> {
        match self {
            Self::ComponentNew(c) => Some(c.core),
            Self::BufferNew(b) => Some(b.core),
            Self::PipelineNew(p) => Some(p.core),
            _ => None,
        }
    }

    /// Parses names and identifiers into a control request.
    ///
    /// `index` is the request's position in its topology, used in errors.
    pub fn to_request(&self, index: usize) -> ValidationResult<ControlRequest> {
        Ok(match self {
            Self::ComponentNew(c) => {
                let comp_type = parse_type(index, &c.comp_type)?;
                let mut desc =
                    CompDescriptor::new(EntryId(c.id), comp_type, PipelineId(c.pipeline), c.core);
                if let Some(uuid) = &c.uuid {
                    desc = desc.with_uuid(parse_uuid(index, uuid)?);
                }
                let desc = desc
                    .with_config(ConfigBlock {
                        periods_sink: c.periods_sink,
                        periods_source: c.periods_source,
                        frame_fmt: parse_frame_format(index, &c.frame_format)?,
                        xrun_action: c.xrun_action,
                        ..ConfigBlock::default()
                    })
                    .with_fields(c.kind_fields(index)?);
                ControlRequest::ComponentNew(desc)
            }
            Self::BufferNew(b) => {
                let mut desc =
                    BufferDescriptor::new(EntryId(b.id), PipelineId(b.pipeline), b.core, b.size);
                if !b.caps.is_empty() {
                    desc.caps = b.caps.iter().try_fold(MemCaps::default(), |caps, name| {
                        parse_cap(index, name).map(|c| caps | c)
                    })?;
                }
                if b.underrun_permitted {
                    desc.flags |= BUF_UNDERRUN_PERMITTED;
                }
                if b.overrun_permitted {
                    desc.flags |= BUF_OVERRUN_PERMITTED;
                }
                ControlRequest::BufferNew(desc)
            }
            Self::PipelineNew(p) => ControlRequest::PipelineNew(PipelineDescriptor {
                priority: p.priority,
                period: p.period,
                period_mips: p.period_mips,
                frames_per_sched: p.frames_per_sched,
                time_domain: parse_time_domain(index, &p.time_domain)?,
                xrun_limit_usecs: p.xrun_limit_us,
                ..PipelineDescriptor::new(
                    EntryId(p.id),
                    PipelineId(p.pipeline),
                    EntryId(p.sched),
                    p.core,
                )
            }),
            Self::Connect(c) => ControlRequest::Connect(ConnectDescriptor {
                source_id: EntryId(c.source),
                sink_id: EntryId(c.sink),
            }),
            Self::PipelineComplete(r) => ControlRequest::PipelineComplete(EntryId(r.id)),
            Self::ComponentFree(r) => ControlRequest::ComponentFree(EntryId(r.id)),
            Self::BufferFree(r) => ControlRequest::BufferFree(EntryId(r.id)),
            Self::PipelineFree(r) => ControlRequest::PipelineFree(EntryId(r.id)),
            Self::Trigger(t) => {
                ControlRequest::Trigger(EntryId(t.id), parse_trigger(index, &t.trigger)?)
            }
        })
    }
}

fn unknown(index: usize, field: &'static str, value: &str) -> ValidationError {
    ValidationError::UnknownName {
        index,
        field,
        value: value.to_string(),
    }
}

/// Parses a component type name.
pub fn parse_type(index: usize, name: &str) -> ValidationResult<ComponentType> {
    ComponentType::from_name(name).ok_or_else(|| unknown(index, "component type", name))
}

/// Parses a canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` identifier.
pub fn parse_uuid(index: usize, text: &str) -> ValidationResult<TypeUuid> {
    TypeUuid::parse(text).ok_or_else(|| ValidationError::MalformedUuid {
        index,
        value: text.to_string(),
    })
}

/// Parses `s16le`, `s24le`, `s32le` or `float`.
pub fn parse_frame_format(index: usize, name: &str) -> ValidationResult<FrameFormat> {
    (0..4)
        .filter_map(FrameFormat::from_raw)
        .find(|f| f.name() == name)
        .ok_or_else(|| unknown(index, "frame format", name))
}

/// Parses `playback` or `capture`.
pub fn parse_direction(index: usize, name: &str) -> ValidationResult<StreamDirection> {
    match name {
        "playback" => Ok(StreamDirection::Playback),
        "capture" => Ok(StreamDirection::Capture),
        _ => Err(unknown(index, "direction", name)),
    }
}

/// Parses `timer` or `dma`.
pub fn parse_time_domain(index: usize, name: &str) -> ValidationResult<TimeDomain> {
    match name {
        "timer" => Ok(TimeDomain::Timer),
        "dma" => Ok(TimeDomain::Dma),
        _ => Err(unknown(index, "time domain", name)),
    }
}

/// Parses a lifecycle trigger name.
pub fn parse_trigger(index: usize, name: &str) -> ValidationResult<Trigger> {
    Trigger::from_name(name).ok_or_else(|| unknown(index, "trigger", name))
}

/// Parses a memory capability name.
pub fn parse_cap(index: usize, name: &str) -> ValidationResult<MemCaps> {
    Ok(match name {
        "ram" => MemCaps::RAM,
        "rom" => MemCaps::ROM,
        "ext" => MemCaps::EXT,
        "lp" => MemCaps::LP,
        "hp" => MemCaps::HP,
        "dma" => MemCaps::DMA,
        "cache" => MemCaps::CACHE,
        _ => return Err(unknown(index, "memory capability", name)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_formats_by_name() {
        assert_eq!(parse_frame_format(0, "s24le"), Ok(FrameFormat::S24Le));
        assert_eq!(parse_frame_format(0, "float"), Ok(FrameFormat::Float));
        assert!(parse_frame_format(0, "s8").is_err());
    }

    #[test]
    fn uuid_must_be_canonical() {
        assert!(parse_uuid(0, "b77e677e-5ff4-4188-af14-fba8bdbf8682").is_ok());
        assert_eq!(
            parse_uuid(4, "b77e677e5ff44188af14fba8bdbf8682"),
            Err(ValidationError::MalformedUuid {
                index: 4,
                value: "b77e677e5ff44188af14fba8bdbf8682".to_string(),
            })
        );
    }

    #[test]
    fn caps_combine() {
        let spec = RequestConfig::BufferNew(BufferSpec {
            id: 2,
            pipeline: 1,
            core: 0,
            size: 384,
            caps: vec!["ram".into(), "dma".into()],
            underrun_permitted: true,
            overrun_permitted: false,
        });
        let ControlRequest::BufferNew(desc) = spec.to_request(0).unwrap() else {
            panic!("expected buffer-new");
        };
        assert_eq!(desc.caps, MemCaps::RAM | MemCaps::DMA);
        assert_eq!(desc.flags, BUF_UNDERRUN_PERMITTED);
    }

    #[test]
    fn one_kind_table_per_component() {
        let mut spec = ComponentSpec::new(1, "host", 1);
        spec.host = Some(HostSpec {
            direction: "capture".into(),
            no_irq: false,
            dmac_config: 0,
        });
        spec.file = Some(FileSpec {
            file_name: "in.raw".into(),
            channels: 2,
            frame_format: "s16le".into(),
            mode: 0,
            rate: 48_000,
        });
        assert_eq!(
            RequestConfig::ComponentNew(spec).to_request(7),
            Err(ValidationError::ConflictingFields { index: 7, id: 1 })
        );
    }

    #[test]
    fn uuid_is_embedded() {
        let mut spec = ComponentSpec::new(1, "mixer", 1);
        spec.uuid = Some("b77e677e-5ff4-4188-af14-fba8bdbf8682".into());
        let ControlRequest::ComponentNew(desc) =
            RequestConfig::ComponentNew(spec).to_request(0).unwrap()
        else {
            panic!("expected component-new");
        };
        assert_eq!(
            desc.type_uuid().unwrap(),
            TypeUuid::parse("b77e677e-5ff4-4188-af14-fba8bdbf8682")
        );
    }
}
