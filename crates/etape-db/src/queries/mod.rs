//! Query functions, one module per table family.

pub mod activities;
pub mod destinations;
pub mod steps;
