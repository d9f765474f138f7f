//! Test module for the group distances.
//!
//! Re-exports the distance implementations and checks them end to end against
//! trees built from parentheses or Newick and a sample index.

pub use super::traits::GroupDistance;
pub use super::unifrac::*;

//=======================================================================================
