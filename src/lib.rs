//! Succinct phylogenetic trees and the sample statistics computed over them.
//!
//! - [`tree::SuccinctTree`]: balanced-parenthesis tree with O(1) positional queries.
//! - [`tree::occurrence`]: running-count helpers used to build rank/select tables.
//! - [`table::SampleObservationIndex`]: sample to observation mapping with metadata grouping.
//! - [`dist::UniFrac`]: unweighted UniFrac between two sample groups.

pub mod dist;
pub mod error;
pub mod table;
pub mod tree;

pub use error::{PhyloError, Result};
