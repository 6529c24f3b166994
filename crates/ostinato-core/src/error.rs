//! Error taxonomy for registry, driver lookup and schedule domain operations.
//!
//! Every operation reports failure synchronously. Forwarding a request to
//! another core is a routing outcome ([`Dispatch`](crate::Dispatch)), never an
//! [`Error`].

use crate::ids::EntryId;

/// Errno values used in control replies.
pub mod errno {
    /// No such device.
    pub const ENODEV: i32 = 19;
    /// Out of memory.
    pub const ENOMEM: i32 = 12;
    /// Device or resource busy.
    pub const EBUSY: i32 = 16;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// I/O error.
    pub const EIO: i32 = 5;
}

/// Errors reported by the runtime core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The id is already registered.
    DuplicateId(EntryId),
    /// The referenced id is absent.
    NotFound(EntryId),
    /// A control descriptor failed size or format validation.
    InvalidDescriptor,
    /// No registered driver matches the descriptor.
    DriverNotFound,
    /// Connection endpoints are not one buffer and one component.
    InvalidConnection,
    /// The entry is not in a state that permits the operation.
    InvalidState(EntryId),
    /// The buffer has active components on both ends.
    Busy(EntryId),
    /// The allocator could not satisfy a request.
    OutOfMemory,
    /// A schedule domain backend rejected register or unregister.
    BackendFailure,
    /// The core index is outside the configured core set.
    InvalidCore(u32),
}

impl Error {
    /// Negative errno-style code carried in control replies.
    pub const fn errno(&self) -> i32 {
        match self {
            Self::NotFound(_) => -errno::ENODEV,
            Self::OutOfMemory => -errno::ENOMEM,
            Self::Busy(_) => -errno::EBUSY,
            Self::BackendFailure => -errno::EIO,
            Self::DuplicateId(_)
            | Self::InvalidDescriptor
            | Self::DriverNotFound
            | Self::InvalidConnection
            | Self::InvalidState(_)
            | Self::InvalidCore(_) => -errno::EINVAL,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "id {id} already registered"),
            Self::NotFound(id) => write!(f, "id {id} not found"),
            Self::InvalidDescriptor => write!(f, "descriptor failed validation"),
            Self::DriverNotFound => write!(f, "no driver matches descriptor"),
            Self::InvalidConnection => {
                write!(f, "connection must join one buffer and one component")
            }
            Self::InvalidState(id) => write!(f, "entry {id} is in the wrong state"),
            Self::Busy(id) => write!(f, "buffer {id} has two active endpoints"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::BackendFailure => write!(f, "schedule domain backend failure"),
            Self::InvalidCore(core) => write!(f, "core {core} is out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result alias for runtime core operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_mapping() {
        assert_eq!(Error::NotFound(EntryId(1)).errno(), -19);
        assert_eq!(Error::OutOfMemory.errno(), -12);
        assert_eq!(Error::Busy(EntryId(1)).errno(), -16);
        assert_eq!(Error::BackendFailure.errno(), -5);
        assert_eq!(Error::DuplicateId(EntryId(1)).errno(), -22);
        assert_eq!(Error::InvalidConnection.errno(), -22);
        assert_eq!(Error::InvalidCore(9).errno(), -22);
    }

    #[cfg(feature = "std")]
    #[test]
    fn display_names_the_entry() {
        let msg = Error::Busy(EntryId(7)).to_string();
        assert!(msg.contains("#7"), "got: {msg}");
        let msg = Error::InvalidCore(5).to_string();
        assert!(msg.contains('5'), "got: {msg}");
    }
}
