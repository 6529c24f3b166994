//! Stream format metadata carried by buffers and components.

/// PCM frame format code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FrameFormat {
    /// Signed 16-bit little endian.
    #[default]
    S16Le,
    /// Signed 24-bit in a 32-bit little endian container.
    S24Le,
    /// Signed 32-bit little endian.
    S32Le,
    /// 32-bit IEEE float.
    Float,
}

impl FrameFormat {
    /// Decodes the wire code.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::S16Le),
            1 => Some(Self::S24Le),
            2 => Some(Self::S32Le),
            3 => Some(Self::Float),
            _ => None,
        }
    }

    /// Returns the wire code.
    pub const fn raw(self) -> u32 {
        match self {
            Self::S16Le => 0,
            Self::S24Le => 1,
            Self::S32Le => 2,
            Self::Float => 3,
        }
    }

    /// Bytes per sample.
    pub const fn sample_bytes(self) -> usize {
        match self {
            Self::S16Le => 2,
            Self::S24Le | Self::S32Le | Self::Float => 4,
        }
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::S16Le => "s16le",
            Self::S24Le => "s24le",
            Self::S32Le => "s32le",
            Self::Float => "float",
        }
    }
}

/// Sample layout inside a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BufferFormat {
    /// Channels interleaved frame by frame.
    #[default]
    Interleaved,
    /// One contiguous run per channel.
    NonInterleaved,
}

/// Direction of data flow through an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StreamDirection {
    /// Host to DAI.
    #[default]
    Playback,
    /// DAI to host.
    Capture,
}

impl StreamDirection {
    /// Decodes the wire code.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Playback),
            1 => Some(Self::Capture),
            _ => None,
        }
    }
}

/// Stream parameters negotiated across a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StreamParams {
    /// Frame format.
    pub frame_fmt: FrameFormat,
    /// Buffer layout.
    pub buffer_fmt: BufferFormat,
    /// Channel count.
    pub channels: u32,
    /// Sample rate in Hz.
    pub rate: u32,
}

impl StreamParams {
    /// Bytes per frame.
    pub const fn frame_bytes(&self) -> usize {
        self.frame_fmt.sample_bytes() * self.channels as usize
    }
}

/// Selects which [`StreamParams`] fields a buffer imposes on a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ParamFlags(pub u32);

impl ParamFlags {
    /// Take the buffer's frame format.
    pub const FRAME_FMT: Self = Self(1 << 0);
    /// Take the buffer's layout.
    pub const BUFFER_FMT: Self = Self(1 << 1);
    /// Take the buffer's channel count.
    pub const CHANNELS: Self = Self(1 << 2);
    /// Take the buffer's sample rate.
    pub const RATE: Self = Self(1 << 3);
    /// No fields.
    pub const NONE: Self = Self(0);
    /// All fields.
    pub const ALL: Self = Self(0xf);

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Overwrites the selected fields of `params` with those of `from`.
    pub fn apply(self, from: &StreamParams, params: &mut StreamParams) {
        if self.contains(Self::FRAME_FMT) {
            params.frame_fmt = from.frame_fmt;
        }
        if self.contains(Self::BUFFER_FMT) {
            params.buffer_fmt = from.buffer_fmt;
        }
        if self.contains(Self::CHANNELS) {
            params.channels = from.channels;
        }
        if self.contains(Self::RATE) {
            params.rate = from.rate;
        }
    }
}

impl core::ops::BitOr for ParamFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Frames per period for `rate` Hz and a period of `period_us` microseconds,
/// rounded up.
pub const fn period_frames(rate: u32, period_us: u32) -> u32 {
    let product = rate as u64 * period_us as u64;
    product.div_ceil(1_000_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_apply_only_selected_fields() {
        let from = StreamParams {
            frame_fmt: FrameFormat::S32Le,
            buffer_fmt: BufferFormat::NonInterleaved,
            channels: 8,
            rate: 96_000,
        };
        let mut params = StreamParams {
            channels: 2,
            rate: 48_000,
            ..StreamParams::default()
        };
        (ParamFlags::RATE | ParamFlags::FRAME_FMT).apply(&from, &mut params);
        assert_eq!(params.rate, 96_000);
        assert_eq!(params.frame_fmt, FrameFormat::S32Le);
        assert_eq!(params.channels, 2);
        assert_eq!(params.buffer_fmt, BufferFormat::Interleaved);
    }

    #[test]
    fn period_frames_rounds_up() {
        assert_eq!(period_frames(48_000, 1000), 48);
        assert_eq!(period_frames(44_100, 1000), 45);
        assert_eq!(period_frames(0, 1000), 0);
    }

    #[test]
    fn frame_format_codes() {
        for raw in 0..4 {
            assert_eq!(FrameFormat::from_raw(raw).unwrap().raw(), raw);
        }
        assert!(FrameFormat::from_raw(4).is_none());
        assert_eq!(FrameFormat::S24Le.sample_bytes(), 4);
    }
}
