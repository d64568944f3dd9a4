// kestrel_core/src/error.rs

use thiserror::Error;

use crate::types::{TimeIndex, VectorKind};

/// Everything that can go wrong when talking to a `ZeroDelayObserver` or
/// building one of the core models.
///
/// Every failure is reported by the call that caused it and leaves the
/// observer exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// An estimate was requested at or before the current time `k0`. The
    /// observer keeps no past states and never re-estimates them.
    #[error("cannot estimate the state at k={requested}: current time is already k0={current}")]
    Causality {
        requested: TimeIndex,
        current: TimeIndex,
    },

    /// A measurement or input needed to bridge `k0` to the requested time is
    /// not buffered yet. Feed the missing sample and retry.
    #[error("insufficient data to reach k={requested}: missing {kind} at k={missing}")]
    InsufficientData {
        kind: VectorKind,
        missing: TimeIndex,
        requested: TimeIndex,
    },

    /// A measurement or input was appended out of order or with a gap.
    #[error("{kind} appended at k={got}, expected k={expected}: samples must be contiguous")]
    Ordering {
        kind: VectorKind,
        expected: TimeIndex,
        got: TimeIndex,
    },

    /// A vector (or matrix side) does not have the configured length.
    #[error("{kind} has dimension {got}, expected {expected}")]
    DimensionMismatch {
        kind: VectorKind,
        expected: usize,
        got: usize,
    },

    /// `get_estimate_state` was called before any state was set.
    #[error("no state has been set; call set_state before estimating")]
    StateNotSet,
}

pub type ObserverResult<T> = Result<T, ObserverError>;
