//! module for group distance implementation

// Core trait
pub mod traits;
pub use traits::GroupDistance;

// Unweighted UniFrac
pub mod unifrac;
pub use unifrac::{UniFrac, UniFracParts};

pub mod distances;
