//! Succinct tree representation and the counting helpers it is built from.

pub mod bp;
pub use bp::{topology_from_str, SuccinctTree};

pub mod occurrence;

mod nwk;
