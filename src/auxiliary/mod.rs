//! Auxiliary routines used across the crate.

pub mod linalg;
