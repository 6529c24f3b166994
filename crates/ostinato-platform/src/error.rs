//! Error types for platform operations.

use ostinato_core::{CoreId, EntryId};
use thiserror::Error;

/// Errors raised by the platform layer.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform configuration is unusable.
    #[error("invalid platform configuration: {0}")]
    InvalidConfig(String),

    /// The runtime core rejected an operation.
    #[error("runtime error: {0}")]
    Runtime(#[from] ostinato_core::Error),

    /// The pipeline has not been completed.
    #[error("pipeline {0} is not complete")]
    NotSchedulable(EntryId),

    /// The pipeline already has a scheduled task.
    #[error("pipeline {0} is already scheduled")]
    AlreadyScheduled(EntryId),

    /// The pipeline has no scheduled task.
    #[error("pipeline {0} is not scheduled")]
    NotScheduled(EntryId),

    /// The owning core forwarded a request again.
    #[error("{0} did not accept a forwarded request")]
    Unroutable(CoreId),

    /// A core worker stopped accepting requests.
    #[error("{0} mailbox closed")]
    MailboxClosed(CoreId),

    /// A core worker thread could not be started.
    #[error("failed to start core worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl PlatformError {
    /// Negative errno-style reply code for control replies.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Runtime(e) => e.errno(),
            Self::MailboxClosed(_) | Self::Spawn(_) => -ostinato_core::errno::EIO,
            Self::NotSchedulable(_)
            | Self::AlreadyScheduled(_)
            | Self::NotScheduled(_)
            | Self::Unroutable(_)
            | Self::InvalidConfig(_) => -ostinato_core::errno::EINVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_errors_keep_their_code() {
        let err = PlatformError::from(ostinato_core::Error::Busy(EntryId(4)));
        assert_eq!(err.errno(), ostinato_core::Error::Busy(EntryId(4)).errno());
        assert!(err.to_string().starts_with("runtime error:"));
    }

    #[test]
    fn scheduling_errors_are_einval() {
        assert_eq!(
            PlatformError::NotScheduled(EntryId(1)).errno(),
            -ostinato_core::errno::EINVAL
        );
    }
}
