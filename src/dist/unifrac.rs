//! Unweighted UniFrac between two groups of samples.

use std::collections::HashSet;

use log::{debug, trace, warn};

use super::traits::GroupDistance;
use crate::error::{PhyloError, Result};
use crate::table::SampleObservationIndex;
use crate::tree::SuccinctTree;

/// Branch-length sums accumulated before the final division.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniFracParts {
    /// length of branches observed by exactly one group
    pub unique_length: f64,
    /// length of branches observed by at least one group
    pub total_length: f64,
}

impl UniFracParts {
    /// `unique_length / total_length`, or `ZeroTotalLength` when the
    /// denominator is 0 so that "no signal" is never reported as distance 0.
    pub fn distance(&self) -> Result<f64> {
        if self.total_length > 0. {
            Ok(self.unique_length / self.total_length)
        } else {
            Err(PhyloError::ZeroTotalLength)
        }
    }
}

/// Unweighted UniFrac over a tree and a sample index.
///
/// A node's branch counts for a group when the node's label is one of the
/// group's observation ids. This holds for internal nodes as well as tips: an
/// internal branch only contributes if it carries an observed label. The root
/// branch never contributes.
///
/// Both inputs are borrowed read-only, so one tree and one index can serve any
/// number of calculators, on any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct UniFrac<'a> {
    tree: &'a SuccinctTree,
    index: &'a SampleObservationIndex,
}

impl<'a> UniFrac<'a> {
    pub fn new(tree: &'a SuccinctTree, index: &'a SampleObservationIndex) -> Self {
        UniFrac { tree, index }
    }

    /// Unique and total branch length for the two groups.
    pub fn compute_parts<S: AsRef<str>>(&self, group1: &[S], group2: &[S]) -> Result<UniFracParts> {
        let obs1 = self.index.union_for_samples(group1)?;
        let obs2 = self.index.union_for_samples(group2)?;
        self.parts_from_sets(&obs1, &obs2)
    }

    // one postorder scan over already merged observation sets
    fn parts_from_sets(&self, obs1: &HashSet<&str>, obs2: &HashSet<&str>) -> Result<UniFracParts> {
        let root = self.tree.root();
        let mut parts = UniFracParts::default();
        for k in 1..=self.tree.size() {
            let pos = self.tree.postorderselect(k)?;
            if pos == root {
                continue;
            }
            let name = self.tree.name(pos)?;
            let in1 = obs1.contains(name);
            let in2 = obs2.contains(name);
            if !(in1 || in2) {
                continue;
            }
            let length = self.tree.length(pos)?;
            trace!("node {} '{}' len={} in1={} in2={}", pos, name, length, in1, in2);
            if in1 != in2 {
                parts.unique_length += length;
            }
            parts.total_length += length;
        }
        debug!(
            "UniFrac parts: unique={} total={} ({} vs {} observations)",
            parts.unique_length,
            parts.total_length,
            obs1.len(),
            obs2.len()
        );
        if parts.total_length == 0. {
            warn!("UniFrac: no observed branch with positive length in either group");
        }
        Ok(parts)
    }

    /// UniFrac distance in `[0, 1]`.
    ///
    /// # Errors
    /// `UnknownSample` for an id absent from the index, `ZeroTotalLength` when
    /// neither group reaches a branch of positive length.
    pub fn compute<S: AsRef<str>>(&self, group1: &[S], group2: &[S]) -> Result<f64> {
        self.compute_parts(group1, group2)?.distance()
    }

    /// Condensed distance matrix over `groups`.
    ///
    /// The result holds `d(i, j)` for every `i < j`, row by row, i.e.
    /// `n * (n - 1) / 2` entries. A pair with zero total length is stored as
    /// `NaN`; any other error aborts the whole matrix. Rows are computed in
    /// parallel when the `parallel` feature is enabled.
    pub fn pairwise<S: AsRef<str> + Sync>(&self, groups: &[Vec<S>]) -> Result<Vec<f64>> {
        let n = groups.len();
        debug!("UniFrac pairwise over {} groups", n);
        // each group is merged once, not once per pair
        let unions = groups
            .iter()
            .map(|g| self.index.union_for_samples(g))
            .collect::<Result<Vec<_>>>()?;
        cfg_if::cfg_if! {
            if #[cfg(feature = "parallel")] {
                use rayon::prelude::*;
                let rows = (0..n)
                    .into_par_iter()
                    .map(|i| self.matrix_row(&unions, i))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(rows.into_iter().flatten().collect());
            }
            else {
                let rows = (0..n)
                    .map(|i| self.matrix_row(&unions, i))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(rows.into_iter().flatten().collect());
            }
        }
    }

    fn matrix_row(&self, unions: &[HashSet<&str>], i: usize) -> Result<Vec<f64>> {
        let mut row = Vec::with_capacity(unions.len().saturating_sub(i + 1));
        for j in (i + 1)..unions.len() {
            let d = match self.parts_from_sets(&unions[i], &unions[j])?.distance() {
                Ok(d) => d,
                Err(PhyloError::ZeroTotalLength) => f64::NAN,
                Err(e) => return Err(e),
            };
            row.push(d);
        }
        Ok(row)
    }
}

impl GroupDistance for UniFrac<'_> {
    fn distance(&self, group1: &[&str], group2: &[&str]) -> Result<f64> {
        self.compute(group1, group2)
    }
}
