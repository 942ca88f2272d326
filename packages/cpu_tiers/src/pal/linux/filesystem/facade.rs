use std::fmt::Debug;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::linux::MockFilesystem;
use crate::pal::linux::{BuildTargetFilesystem, Filesystem};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum FilesystemFacade {
    Real(&'static BuildTargetFilesystem),

    #[cfg(test)]
    Mock(Arc<MockFilesystem>),
}

impl FilesystemFacade {
    pub(crate) const fn real() -> Self {
        Self::Real(&BuildTargetFilesystem)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockFilesystem) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Filesystem for FilesystemFacade {
    fn get_possible_cpus_contents(&self) -> Option<String> {
        match self {
            Self::Real(fs) => fs.get_possible_cpus_contents(),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_possible_cpus_contents(),
        }
    }

    fn get_cpu_online_contents(&self, cpu_index: u32) -> Option<String> {
        match self {
            Self::Real(fs) => fs.get_cpu_online_contents(cpu_index),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_cpu_online_contents(cpu_index),
        }
    }

    fn get_cpu_max_frequency_contents(&self, cpu_index: u32) -> Option<String> {
        match self {
            Self::Real(fs) => fs.get_cpu_max_frequency_contents(cpu_index),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_cpu_max_frequency_contents(cpu_index),
        }
    }
}

impl Debug for FilesystemFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
