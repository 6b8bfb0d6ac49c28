//! Kohn–Sham quantities consumed by the projection pipeline.

pub mod kohn_sham;
