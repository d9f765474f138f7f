//! Error types shared by the tree, the sample index and the distance code.

use thiserror::Error;

/// Errors raised by tree construction, lookups and distance computation.
///
/// None of these are transient: every variant describes either malformed input
/// or a caller bug, so nothing in the crate retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhyloError {
    /// Topology does not encode exactly one balanced tree.
    #[error("malformed topology at position {position}: {reason}")]
    MalformedTopology { position: usize, reason: String },

    /// Rank argument outside `[1, size]`.
    #[error("index {index} out of range [1, {size}]")]
    IndexOutOfRange { index: usize, size: usize },

    /// Position is not the open parenthesis of a node.
    #[error("position {0} is not a node position")]
    UnknownPosition(usize),

    /// Sample id absent from the observation table.
    #[error("unknown sample '{0}'")]
    UnknownSample(String),

    /// Neither group touches a branch with positive length.
    #[error("total branch length is zero, distance is undefined")]
    ZeroTotalLength,

    /// Auxiliary per-position array does not match the topology.
    #[error("{what}: expected {expected} entries, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Branch length is negative or not finite.
    #[error("invalid branch length {length} at position {position}")]
    InvalidBranchLength { position: usize, length: f64 },

    /// Sample has observations but no metadata row.
    #[error("sample '{0}' has no metadata")]
    MissingMetadata(String),

    /// Newick text could not be parsed.
    #[error("newick parse error: {0}")]
    Newick(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PhyloError>;
