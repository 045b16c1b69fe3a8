//! Domain layer types and invariants.

pub mod fields;
pub mod validation;
