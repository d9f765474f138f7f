//! Core trait for distances between groups of samples.
//!
//! A group is a list of sample ids; an implementation resolves the ids against
//! whatever data it holds and returns a single dissimilarity.

use crate::error::Result;

/// Distance between two sample groups.
///
/// The trait is object safe so callers can hold a `&dyn GroupDistance`.
///
/// # Example
///
/// ```rust,no_run
/// use phylo_bp::dist::GroupDistance;
/// use phylo_bp::error::Result;
///
/// pub struct SameSize;
///
/// impl GroupDistance for SameSize {
///     fn distance(&self, group1: &[&str], group2: &[&str]) -> Result<f64> {
///         Ok(if group1.len() == group2.len() { 0. } else { 1. })
///     }
/// }
/// ```
pub trait GroupDistance {
    /// Compute the distance between `group1` and `group2`.
    ///
    /// # Errors
    /// Implementation dependent; unknown sample ids are expected to fail
    /// rather than be skipped.
    fn distance(&self, group1: &[&str], group2: &[&str]) -> Result<f64>;
}
