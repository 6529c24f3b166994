//! Built-in driver behavior.
//!
//! Signal processing is out of scope for the runtime core, so these drivers
//! only hold their construction parameters, check them, and check the stream
//! parameters negotiated onto them. Every factory rejects configuration
//! variants that do not belong to its kind.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use ostinato_core::{
    AsrcConfig, ComponentConfig, ComponentOps, Error, FileConfig, ProcessConfig, Result,
    SpecificConfig, SrcConfig, StreamParams, ToneConfig, Trigger, VolumeConfig,
};

/// Highest channel count a volume instance accepts.
pub const VOLUME_MAX_CHANNELS: u32 = 8;

/// Highest sample rate any converter accepts, in Hz.
pub const MAX_RATE: u32 = 192_000;

fn reject(_driver: &str, _why: &str) -> Error {
    #[cfg(feature = "tracing")]
    tracing::warn!("{_driver}: {_why}");
    Error::InvalidDescriptor
}

fn check_rate(driver: &str, rate: u32) -> Result<()> {
    if rate == 0 || rate > MAX_RATE {
        return Err(reject(driver, "sample rate out of range"));
    }
    Ok(())
}

/// Host or DAI endpoint, optionally backed by a test-bench file.
struct Endpoint {
    name: &'static str,
    file: Option<FileConfig>,
}

impl Endpoint {
    fn build(name: &'static str, config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
        let file = match &config.specific {
            SpecificConfig::Host(_) | SpecificConfig::Dai(_) => None,
            SpecificConfig::File(f) => {
                if f.file_name.is_empty() {
                    return Err(reject(name, "file endpoint without a file name"));
                }
                Some(f.clone())
            }
            _ => return Err(reject(name, "not an endpoint configuration")),
        };
        Ok(Box::new(Self { name, file }))
    }
}

impl ComponentOps for Endpoint {
    fn params(&mut self, params: &StreamParams) -> Result<()> {
        // A file replays at the format it was recorded in.
        if let Some(file) = &self.file {
            if file.rate != 0 && params.rate != 0 && file.rate != params.rate {
                return Err(reject(self.name, "stream rate differs from file rate"));
            }
            if file.channels != 0 && params.channels != 0 && file.channels != params.channels {
                return Err(reject(self.name, "stream channels differ from file channels"));
            }
        }
        Ok(())
    }
}

pub(crate) fn host(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    Endpoint::build("host", config)
}

pub(crate) fn dai(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    Endpoint::build("dai", config)
}

/// Gain stage.
struct Volume {
    config: VolumeConfig,
}

impl ComponentOps for Volume {
    fn params(&mut self, params: &StreamParams) -> Result<()> {
        if params.channels > self.config.channels {
            return Err(reject("volume", "more channels than configured"));
        }
        Ok(())
    }
}

pub(crate) fn volume(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    let SpecificConfig::Volume(v) = &config.specific else {
        return Err(reject("volume", "not a volume configuration"));
    };
    if v.channels == 0 || v.channels > VOLUME_MAX_CHANNELS {
        return Err(reject("volume", "channel count out of range"));
    }
    if v.min_value > v.max_value {
        return Err(reject("volume", "min_value above max_value"));
    }
    Ok(Box::new(Volume { config: v.clone() }))
}

/// Synchronous rate converter. One side's rate may be left 0 and taken from
/// the stream.
struct Src {
    config: SrcConfig,
}

impl ComponentOps for Src {
    fn params(&mut self, params: &StreamParams) -> Result<()> {
        check_rate("src", params.rate)?;
        let SrcConfig {
            source_rate,
            sink_rate,
            ..
        } = self.config;
        if source_rate != 0 && sink_rate != 0 && params.rate != source_rate && params.rate != sink_rate
        {
            return Err(reject("src", "stream rate matches neither side"));
        }
        Ok(())
    }
}

pub(crate) fn src(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    let SpecificConfig::Src(s) = &config.specific else {
        return Err(reject("src", "not a src configuration"));
    };
    if s.source_rate == 0 && s.sink_rate == 0 {
        return Err(reject("src", "neither rate configured"));
    }
    for rate in [s.source_rate, s.sink_rate] {
        if rate != 0 {
            check_rate("src", rate)?;
        }
    }
    Ok(Box::new(Src { config: s.clone() }))
}

/// Asynchronous rate converter. Both rates are fixed at construction.
struct Asrc {
    config: AsrcConfig,
}

impl ComponentOps for Asrc {
    fn params(&mut self, params: &StreamParams) -> Result<()> {
        if params.rate != self.config.source_rate && params.rate != self.config.sink_rate {
            return Err(reject("asrc", "stream rate matches neither side"));
        }
        Ok(())
    }
}

pub(crate) fn asrc(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    let SpecificConfig::Asrc(a) = &config.specific else {
        return Err(reject("asrc", "not an asrc configuration"));
    };
    check_rate("asrc", a.source_rate)?;
    check_rate("asrc", a.sink_rate)?;
    Ok(Box::new(Asrc { config: a.clone() }))
}

/// Tone generator.
struct Tone {
    config: ToneConfig,
}

impl ComponentOps for Tone {
    fn params(&mut self, params: &StreamParams) -> Result<()> {
        if params.rate != 0 && i64::from(params.rate) != i64::from(self.config.sample_rate) {
            return Err(reject("tone", "stream rate differs from generator rate"));
        }
        Ok(())
    }
}

pub(crate) fn tone(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    let SpecificConfig::Tone(t) = &config.specific else {
        return Err(reject("tone", "not a tone configuration"));
    };
    let rate = u32::try_from(t.sample_rate).map_err(|_| reject("tone", "negative sample rate"))?;
    check_rate("tone", rate)?;
    if t.frequency < 0 || t.amplitude < 0 {
        return Err(reject("tone", "negative frequency or amplitude"));
    }
    Ok(Box::new(Tone { config: t.clone() }))
}

/// Processing component configured by an opaque blob.
struct Process {
    name: &'static str,
    config: ProcessConfig,
}

impl ComponentOps for Process {
    fn trigger(&mut self, trigger: Trigger) -> Result<()> {
        // Nothing to run without coefficients.
        if trigger == Trigger::Start && self.config.data.is_empty() && needs_blob(self.name) {
            return Err(reject(self.name, "started without configuration data"));
        }
        Ok(())
    }
}

fn needs_blob(name: &str) -> bool {
    matches!(name, "eq-iir" | "eq-fir")
}

fn process(name: &'static str, config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    let SpecificConfig::Process(p) = &config.specific else {
        return Err(reject(name, "not a process configuration"));
    };
    Ok(Box::new(Process {
        name,
        config: p.clone(),
    }))
}

macro_rules! process_factory {
    ($($fn_name:ident => $name:literal),* $(,)?) => {
        $(
            pub(crate) fn $fn_name(config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
                process($name, config)
            }
        )*
    };
}

process_factory! {
    mux => "mux",
    demux => "demux",
    eq_iir => "eq-iir",
    eq_fir => "eq-fir",
    keyword_detect => "keyword-detect",
    kpb => "kpb",
    selector => "selector",
    dcblock => "dcblock",
    smart_amp => "smart-amp",
    codec_adaptor => "codec-adaptor",
}

/// Component with no configuration of its own.
struct Plain;

impl ComponentOps for Plain {}

pub(crate) fn plain(_config: &ComponentConfig) -> Result<Box<dyn ComponentOps>> {
    Ok(Box::new(Plain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ostinato_core::{
        CommonConfig, ComponentType, CoreId, EntryId, FrameFormat, HostConfig, PipelineId,
        StreamDirection,
    };

    fn config(comp_type: ComponentType, specific: SpecificConfig) -> ComponentConfig {
        ComponentConfig {
            common: CommonConfig {
                core: CoreId::PRIMARY,
                id: EntryId(1),
                pipeline_id: PipelineId(1),
                comp_type,
                frame_fmt: FrameFormat::S16Le,
                periods_sink: 2,
                periods_source: 2,
                xrun_action: 0,
            },
            specific,
        }
    }

    fn vol(channels: u32, min_value: u32, max_value: u32) -> SpecificConfig {
        SpecificConfig::Volume(VolumeConfig {
            channels,
            initial_ramp: 0,
            max_value,
            min_value,
            ramp: 1,
        })
    }

    fn stream(channels: u32, rate: u32) -> StreamParams {
        StreamParams {
            channels,
            rate,
            ..StreamParams::default()
        }
    }

    #[test]
    fn volume_checks_ranges() {
        assert!(volume(&config(ComponentType::VOLUME, vol(2, 0, 100))).is_ok());
        for bad in [vol(0, 0, 1), vol(9, 0, 1), vol(2, 5, 1)] {
            assert_eq!(
                volume(&config(ComponentType::VOLUME, bad)).err(),
                Some(Error::InvalidDescriptor)
            );
        }
    }

    #[test]
    fn volume_rejects_wider_stream() {
        let mut ops = volume(&config(ComponentType::VOLUME, vol(2, 0, 100))).unwrap();
        assert!(ops.params(&stream(2, 48_000)).is_ok());
        assert_eq!(ops.params(&stream(4, 48_000)), Err(Error::InvalidDescriptor));
    }

    #[test]
    fn factories_reject_foreign_variants() {
        let host_cfg = SpecificConfig::Host(HostConfig {
            direction: StreamDirection::Playback,
            no_irq: false,
            dmac_config: 0,
        });
        assert!(host(&config(ComponentType::HOST, host_cfg.clone())).is_ok());
        assert!(volume(&config(ComponentType::VOLUME, host_cfg.clone())).is_err());
        assert!(src(&config(ComponentType::SRC, host_cfg.clone())).is_err());
        assert!(eq_iir(&config(ComponentType::EQ_IIR, host_cfg)).is_err());
        assert!(host(&config(ComponentType::HOST, SpecificConfig::None)).is_err());
    }

    #[test]
    fn src_takes_one_side_from_stream() {
        let cfg = SpecificConfig::Src(SrcConfig {
            rate_mask: 0,
            sink_rate: 48_000,
            source_rate: 0,
        });
        let mut ops = src(&config(ComponentType::SRC, cfg)).unwrap();
        assert!(ops.params(&stream(2, 44_100)).is_ok());
        assert!(ops.params(&stream(2, 0)).is_err());

        let neither = SpecificConfig::Src(SrcConfig::default());
        assert!(src(&config(ComponentType::SRC, neither)).is_err());
    }

    #[test]
    fn file_endpoint_pins_format() {
        let cfg = SpecificConfig::File(FileConfig {
            channels: 2,
            file_name: "in.raw".into(),
            frame_fmt: FrameFormat::S32Le,
            mode: 0,
            rate: 48_000,
        });
        let mut ops = dai(&config(ComponentType::DAI, cfg)).unwrap();
        assert!(ops.params(&stream(2, 48_000)).is_ok());
        assert!(ops.params(&stream(2, 16_000)).is_err());
        assert!(ops.params(&stream(1, 48_000)).is_err());
    }

    #[test]
    fn eq_needs_coefficients_to_start() {
        let empty = SpecificConfig::Process(ProcessConfig {
            process_type: ComponentType::EQ_IIR,
            data: Default::default(),
        });
        let mut ops = eq_iir(&config(ComponentType::EQ_IIR, empty.clone())).unwrap();
        assert!(ops.trigger(Trigger::Prepare).is_ok());
        assert_eq!(ops.trigger(Trigger::Start), Err(Error::InvalidDescriptor));

        let mut ops = dcblock(&config(ComponentType::DCBLOCK, empty)).unwrap();
        assert!(ops.trigger(Trigger::Start).is_ok());
    }

    #[test]
    fn tone_rejects_negative_rate() {
        let cfg = SpecificConfig::Tone(ToneConfig {
            sample_rate: -1,
            ..ToneConfig::default()
        });
        assert!(tone(&config(ComponentType::TONE, cfg)).is_err());
    }
}
