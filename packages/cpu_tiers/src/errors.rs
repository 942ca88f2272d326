use std::io;

use thiserror::Error;

/// Errors surfaced by affinity and powersave operations.
///
/// There is no retry logic anywhere in this crate - a failed operation leaves no partial state
/// behind and the caller decides whether to re-issue the call or proceed unpinned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AffinityError {
    /// The current operating system or architecture has no thread affinity control.
    #[error("thread affinity control is not supported on this platform")]
    Unsupported,

    /// A raw powersave mode outside the valid 0/1/2 range was supplied.
    #[error("{0} is not a valid powersave mode (expected 0, 1 or 2)")]
    InvalidPowersaveMode(u32),

    /// The supplied affinity mask selects no processors, so there would be nothing left for
    /// the thread to run on.
    #[error("affinity mask selects no processors")]
    EmptyMask,

    /// The operating system rejected the affinity request, e.g. due to insufficient
    /// permissions.
    #[error("the operating system rejected the affinity request")]
    Os(#[from] io::Error),
}

impl AffinityError {
    /// Maps an I/O error from the platform layer onto the crate's error taxonomy.
    pub(crate) fn from_platform(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::Unsupported {
            Self::Unsupported
        } else {
            Self::Os(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AffinityError: Debug, Send, Sync);

    #[test]
    fn unsupported_kind_maps_to_unsupported_variant() {
        let error = io::Error::new(io::ErrorKind::Unsupported, "no affinity here");
        assert!(matches!(
            AffinityError::from_platform(error),
            AffinityError::Unsupported
        ));
    }

    #[test]
    fn other_kinds_map_to_os_variant() {
        let error = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            AffinityError::from_platform(error),
            AffinityError::Os(_)
        ));
    }
}
