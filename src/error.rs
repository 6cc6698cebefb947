//! Error types returned by `ColumnHashMap` mutations.

use thiserror::Error;

/// Growing the backing storage failed. The map is left at its prior capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("capacity overflow while growing to {requested} slots")]
    Overflow { requested: usize },
    #[error("allocation failed while growing to {requested} slots")]
    AllocFailed { requested: usize },
}

impl CapacityError {
    pub(crate) fn from_reserve(err: hashbrown::TryReserveError, requested: usize) -> Self {
        match err {
            hashbrown::TryReserveError::CapacityOverflow => CapacityError::Overflow { requested },
            hashbrown::TryReserveError::AllocError { .. } => {
                CapacityError::AllocFailed { requested }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("key is already present")]
    DuplicateKey,
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplaceError {
    #[error("key is not present")]
    MissingKey,
}
