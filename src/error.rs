use std::fmt;

use thiserror::Error;

/// The concrete structure behind a [`Clusterer`](crate::Clusterer).
///
/// Used as the tag that keeps set operations from mixing implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClustererKind {
    MergeTree,
    GreedyMerge,
}

impl fmt::Display for ClustererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClustererKind::MergeTree => write!(f, "merge tree"),
            ClustererKind::GreedyMerge => write!(f, "greedy merge"),
        }
    }
}

/// Errors reported by the box clustering structures.
///
/// All of them are contract violations by the caller; none are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// A set operation was invoked across two different implementations.
    #[error("cannot combine a {expected} clusterer with a {found} clusterer")]
    MismatchedClusterer {
        expected: ClustererKind,
        found: ClustererKind,
    },

    /// A box with NaN coordinates or `min > max` on some axis.
    #[error("invalid bounding box: min {min:?}, max {max:?}")]
    InvalidBox { min: Vec<f64>, max: Vec<f64> },

    /// A merge threshold outside its admissible range.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, ClusterError>;
