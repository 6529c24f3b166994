//! Identifier types shared by the graph registry, the driver table and the
//! schedule domains.
//!
//! Components, buffers and pipelines live in one id space ([`EntryId`]).
//! A pipeline additionally carries a [`PipelineId`] that components and
//! buffers use to name the pipeline they belong to. Cores are addressed by
//! [`CoreId`], bounded by [`MAX_CORES`].

use core::fmt;

/// Number of DSP cores the runtime is built for.
pub const MAX_CORES: usize = 4;

/// Byte length of a component type identifier.
pub const UUID_SIZE: usize = 16;

/// Index of a DSP core.
///
/// Always below [`MAX_CORES`]; construct with [`CoreId::new`] to validate
/// an index coming from a control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreId(u8);

impl CoreId {
    /// The core that receives control requests and owns platform init.
    pub const PRIMARY: Self = Self(0);

    /// Validates a raw core index.
    #[inline]
    pub const fn new(index: u32) -> Option<Self> {
        if (index as usize) < MAX_CORES {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Returns the core index, usable for per-core arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every core the runtime is built for.
    pub fn all() -> impl Iterator<Item = CoreId> {
        (0..MAX_CORES as u8).map(CoreId)
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "core{}", self.0)
    }
}

/// Identifier of a registry entry (component, buffer or pipeline).
///
/// Assigned by the host in control requests. Unique across all entry kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u32);

impl EntryId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pipeline number as named by components and buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipelineId(pub u32);

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe{}", self.0)
    }
}

/// 128-bit component type identifier.
///
/// Stored in the byte order it is carried in descriptor extension data.
/// Displayed in the canonical `8-4-4-4-12` form where the first three groups
/// are little-endian, matching how firmware UUIDs are declared.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeUuid([u8; UUID_SIZE]);

impl TypeUuid {
    /// Wraps raw identifier bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; UUID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds an identifier from its canonical field values.
    pub const fn from_fields(a: u32, b: u16, c: u16, d: [u8; 8]) -> Self {
        let a = a.to_le_bytes();
        let b = b.to_le_bytes();
        let c = c.to_le_bytes();
        Self([
            a[0], a[1], a[2], a[3], b[0], b[1], c[0], c[1], d[0], d[1], d[2], d[3], d[4], d[5],
            d[6], d[7],
        ])
    }

    /// Reads an identifier from the front of `bytes`.
    ///
    /// Returns `None` if fewer than [`UUID_SIZE`] bytes are available.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let head: [u8; UUID_SIZE] = bytes.get(..UUID_SIZE)?.try_into().ok()?;
        Some(Self(head))
    }

    /// Returns the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; UUID_SIZE] {
        &self.0
    }

    /// Parses the canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form.
    pub fn parse(text: &str) -> Option<Self> {
        let groups: [&str; 5] = {
            let mut it = text.split('-');
            let g = [it.next()?, it.next()?, it.next()?, it.next()?, it.next()?];
            if it.next().is_some() {
                return None;
            }
            g
        };
        let widths = [8, 4, 4, 4, 12];
        if groups.iter().zip(widths).any(|(g, w)| g.len() != w) {
            return None;
        }
        let a = u32::from_str_radix(groups[0], 16).ok()?;
        let b = u16::from_str_radix(groups[1], 16).ok()?;
        let c = u16::from_str_radix(groups[2], 16).ok()?;
        let mut d = [0u8; 8];
        let tail = groups[3].as_bytes().chunks(2).chain(groups[4].as_bytes().chunks(2));
        for (slot, pair) in d.iter_mut().zip(tail) {
            let pair = core::str::from_utf8(pair).ok()?;
            *slot = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self::from_fields(a, b, c, d))
    }
}

impl fmt::Display for TypeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let a = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let m = u16::from_le_bytes([b[4], b[5]]);
        let h = u16::from_le_bytes([b[6], b[7]]);
        write!(
            f,
            "{a:08x}-{m:04x}-{h:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for TypeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeUuid({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_id_rejects_out_of_range() {
        assert_eq!(CoreId::new(0), Some(CoreId::PRIMARY));
        assert!(CoreId::new(MAX_CORES as u32 - 1).is_some());
        assert!(CoreId::new(MAX_CORES as u32).is_none());
        assert_eq!(CoreId::all().count(), MAX_CORES);
    }

    #[test]
    fn uuid_parse_and_display_agree() {
        let text = "b77e677e-5ff4-4188-af14-fba8bdbf8682";
        let uuid = TypeUuid::parse(text).unwrap();
        assert_eq!(uuid.to_string(), text);
        // First group is stored little-endian.
        assert_eq!(uuid.as_bytes()[0], 0x7e);
        assert_eq!(uuid.as_bytes()[3], 0xb7);
        assert_eq!(uuid.as_bytes()[8], 0xaf);
    }

    #[test]
    fn uuid_parse_rejects_malformed() {
        assert!(TypeUuid::parse("").is_none());
        assert!(TypeUuid::parse("b77e677e-5ff4-4188-af14").is_none());
        assert!(TypeUuid::parse("b77e677e-5ff4-4188-af14-fba8bdbf8682-00").is_none());
        assert!(TypeUuid::parse("g77e677e-5ff4-4188-af14-fba8bdbf8682").is_none());
        assert!(TypeUuid::parse("b77e677e5-ff4-4188-af14-fba8bdbf8682").is_none());
    }

    #[test]
    fn uuid_from_slice_needs_full_length() {
        let bytes = [7u8; 20];
        assert!(TypeUuid::from_slice(&bytes).is_some());
        assert!(TypeUuid::from_slice(&bytes[..15]).is_none());
    }
}
