//! # plodmft: Projection on Localised Orbitals for DMFT
//!
//! `plodmft` transforms raw projector amplitudes produced by a plane-wave
//! density-functional-theory engine into a set of orthonormal, site-local,
//! correlated-subspace projectors consumable by a downstream
//! dynamical-mean-field-theory engine. The crate provides:
//! - configuration-driven resolution of projector groups (site, angular
//!   momentum, shell, correlation flag, sub-basis transformation),
//! - momentum- and spin-resolved band/energy windowing,
//! - rotation and window filtering of the raw amplitudes,
//! - Löwdin orthonormalisation, per group or jointly across groups, and
//! - optional diagnostics: overlap, density matrix, local and k-resolved
//!   Hamiltonians, and the analytic-tetrahedron partial density of states.
//!
//! The crate is a library only; it is driven by an embedding application
//! that supplies the parsed Kohn–Sham data and the projection parameters
//! (see [`drivers::projection`]).
//!
//! ## Linear algebra backend
//!
//! There are six features defining six different ways a linear algebra
//! backend can be configured. These are inherited from the
//! [`ndarray-linalg`](https://docs.rs/ndarray-linalg/latest/ndarray_linalg/)
//! crate. One (and only one) of these must be enabled:
//! - `openblas-static`: Downloads, builds OpenBLAS, and links statically
//! - `openblas-system`: Finds and links existing OpenBLAS in the system
//! - `netlib-static`: Downloads, builds LAPACK, and links statically
//! - `netlib-system`: Finds and links existing LAPACK in the system
//! - `intel-mkl-static`: Finds and links existing static Intel MKL in the
//!   system, or downloads and links statically if not found
//! - `intel-mkl-system`: Finds and links existing shared Intel MKL in the
//!   system
//!
//! ## Logging
//!
//! All human-readable output is emitted through the [`log`] facade under the
//! `plodmft-output` target. Configuring appenders for that target is the
//! embedding application's responsibility.

pub mod analysis;
pub mod auxiliary;
pub mod dos;
pub mod drivers;
pub mod io;
pub mod projection;
pub mod target;
