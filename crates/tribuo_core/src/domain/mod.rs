//! The serializable domain types: feature and output domains, models,
//! and value transforms.

pub mod feature;
pub mod model;
pub mod output;
pub mod transform;
