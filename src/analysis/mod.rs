//! Diagnostic matrices over orthonormalised projectors.
//!
//! All Brillouin-zone reductions here iterate spin outer and k-point inner in
//! ascending index order, which keeps the summation order fixed and the
//! results bit-reproducible across runs.

use std::fmt;

use ndarray::{s, Array1, Array2, Array3, Array4};

use crate::auxiliary::linalg::C128;
use crate::projection::window::ProjectorWindow;


// =========
// Functions
// =========

/// Conjugate-transposes a filtered `(k, s)` slice.
fn slice_dagger(amplitudes: &ndarray::ArrayView2<C128>) -> Array2<C128> {
    amplitudes.t().mapv(|x| x.conj())
}

/// Computes the k-summed overlap matrix of one group.
///
/// $`O[s] = \sum_k \omega_k\, \mathrm{Re}(A\,A^{\dagger})`$ with
/// $`\omega_k = w_k / n_{\mathbf{k}}`$ and `A` the group's filtered
/// amplitudes at `(k, s)`.
///
/// # Arguments
///
/// * `fchipsi` - The group's filtered amplitudes `[d, nbnd, nkpt, nspin]`.
/// * `weight` - The normalised k-point weights.
///
/// # Returns
///
/// The overlap matrix, indexed as `[d, d, nspin]`.
pub fn calc_ovlp(fchipsi: &Array4<C128>, weight: &Array1<f64>) -> Array3<f64> {
    let (ndim, _nbnd, nkpt, nspin) = fchipsi.dim();
    let mut ovlp = Array3::<f64>::zeros((ndim, ndim, nspin));
    for spin in 0..nspin {
        let mut acc = Array2::<f64>::zeros((ndim, ndim));
        for k in 0..nkpt {
            let wght = weight[k] / nkpt as f64;
            let amplitudes = fchipsi.slice(s![.., .., k, spin]);
            let prod = amplitudes.dot(&slice_dagger(&amplitudes));
            acc.zip_mut_with(&prod, |a, p| *a += wght * p.re);
        }
        ovlp.slice_mut(s![.., .., spin]).assign(&acc);
    }
    ovlp
}

/// Computes the k-summed density matrix of one group.
///
/// $`n[s] = \sum_k \omega_k \sigma\,
/// \mathrm{Re}(A\,\mathrm{diag}(f_{b_{\min}..b_{\max}, k, s})\,A^{\dagger})`$
/// with the spin degeneracy $`\sigma = 2/n_\sigma`$.
///
/// # Arguments
///
/// * `fchipsi` - The group's filtered amplitudes `[d, nbnd, nkpt, nspin]`.
/// * `weight` - The normalised k-point weights.
/// * `occupy` - The band occupation numbers `[nband, nkpt, nspin]`.
/// * `window` - The group's resolved window.
///
/// # Returns
///
/// The density matrix, indexed as `[d, d, nspin]`.
pub fn calc_dm(
    fchipsi: &Array4<C128>,
    weight: &Array1<f64>,
    occupy: &Array3<f64>,
    window: &ProjectorWindow,
) -> Array3<f64> {
    let (ndim, _nbnd, nkpt, nspin) = fchipsi.dim();
    let degeneracy = 2.0 / nspin as f64;
    let mut dm = Array3::<f64>::zeros((ndim, ndim, nspin));
    for spin in 0..nspin {
        let mut acc = Array2::<f64>::zeros((ndim, ndim));
        for k in 0..nkpt {
            let wght = weight[k] / nkpt as f64 * degeneracy;
            let amplitudes = fchipsi.slice(s![.., .., k, spin]);
            let occs = occupy
                .slice(s![window.bmin()..=window.bmax(), k, spin])
                .mapv(|o| C128::new(o, 0.0));
            let scaled = &amplitudes * &occs;
            let prod = scaled.dot(&slice_dagger(&amplitudes));
            acc.zip_mut_with(&prod, |a, p| *a += wght * p.re);
        }
        dm.slice_mut(s![.., .., spin]).assign(&acc);
    }
    dm
}

/// Computes the k-summed local Hamiltonian of one group.
///
/// $`H[s] = \sum_k \omega_k\,
/// A\,\mathrm{diag}(\epsilon_{b_{\min}..b_{\max}, k, s})\,A^{\dagger}`$,
/// kept complex.
///
/// # Arguments
///
/// * `fchipsi` - The group's filtered amplitudes `[d, nbnd, nkpt, nspin]`.
/// * `weight` - The normalised k-point weights.
/// * `enk` - The Fermi-calibrated band energies `[nband, nkpt, nspin]`.
/// * `window` - The group's resolved window.
///
/// # Returns
///
/// The local Hamiltonian, indexed as `[d, d, nspin]`.
pub fn calc_hloc(
    fchipsi: &Array4<C128>,
    weight: &Array1<f64>,
    enk: &Array3<f64>,
    window: &ProjectorWindow,
) -> Array3<C128> {
    let (ndim, _nbnd, nkpt, nspin) = fchipsi.dim();
    let mut hloc = Array3::<C128>::zeros((ndim, ndim, nspin));
    for spin in 0..nspin {
        let mut acc = Array2::<C128>::zeros((ndim, ndim));
        for k in 0..nkpt {
            let wght = C128::new(weight[k] / nkpt as f64, 0.0);
            let amplitudes = fchipsi.slice(s![.., .., k, spin]);
            let eigs = enk
                .slice(s![window.bmin()..=window.bmax(), k, spin])
                .mapv(|e| C128::new(e, 0.0));
            let scaled = &amplitudes * &eigs;
            let prod = scaled.dot(&slice_dagger(&amplitudes));
            acc.zip_mut_with(&prod, |a, p| *a += wght * p);
        }
        hloc.slice_mut(s![.., .., spin]).assign(&acc);
    }
    hloc
}

/// Computes the k-resolved Hamiltonian projected onto the joint stacked
/// basis of all groups, without summing over k.
///
/// # Arguments
///
/// * `filtered` - One filtered array per group, all resolved from the same
///   shared window.
/// * `enk` - The Fermi-calibrated band energies `[nband, nkpt, nspin]`.
/// * `window` - The shared window.
///
/// # Returns
///
/// The projected Hamiltonian, indexed as `[D, D, nkpt, nspin]` with
/// `D = Σ d_g`.
pub fn calc_hamk(
    filtered: &[Array4<C128>],
    enk: &Array3<f64>,
    window: &ProjectorWindow,
) -> Array4<C128> {
    let dims = filtered
        .iter()
        .map(|fchipsi| fchipsi.dim().0)
        .collect::<Vec<_>>();
    let dtot: usize = dims.iter().sum();
    let (nkpt, nspin) = filtered
        .first()
        .map(|fchipsi| (fchipsi.dim().2, fchipsi.dim().3))
        .unwrap_or((0, 0));
    let nbnd = window.nbnd();

    let mut hamk = Array4::<C128>::zeros((dtot, dtot, nkpt, nspin));
    for spin in 0..nspin {
        for k in 0..nkpt {
            let mut stacked = Array2::<C128>::zeros((dtot, nbnd));
            let mut offset = 0;
            for (fchipsi, &ndim) in filtered.iter().zip(dims.iter()) {
                stacked
                    .slice_mut(s![offset..offset + ndim, ..])
                    .assign(&fchipsi.slice(s![.., .., k, spin]));
                offset += ndim;
            }
            let eigs = enk
                .slice(s![window.bmin()..=window.bmax(), k, spin])
                .mapv(|e| C128::new(e, 0.0));
            let scaled = &stacked * &eigs;
            let prod = scaled.dot(&slice_dagger(&stacked.view()));
            hamk.slice_mut(s![.., .., k, spin]).assign(&prod);
        }
    }
    hamk
}

// =================
// Struct definition
// =================

/// A structure collecting the diagnostic matrices of one projector group.
#[derive(Clone, Debug)]
pub struct GroupDiagnostics {
    /// The k-summed overlap matrix `[d, d, nspin]`.
    ovlp: Array3<f64>,

    /// The k-summed density matrix `[d, d, nspin]`.
    dm: Array3<f64>,

    /// The k-summed local Hamiltonian `[d, d, nspin]`.
    hloc: Array3<C128>,
}

impl GroupDiagnostics {
    /// Assembles the diagnostic matrices of one group.
    pub fn new(ovlp: Array3<f64>, dm: Array3<f64>, hloc: Array3<C128>) -> Self {
        Self { ovlp, dm, hloc }
    }

    /// Returns the overlap matrix.
    pub fn ovlp(&self) -> &Array3<f64> {
        &self.ovlp
    }

    /// Returns the density matrix.
    pub fn dm(&self) -> &Array3<f64> {
        &self.dm
    }

    /// Returns the local Hamiltonian.
    pub fn hloc(&self) -> &Array3<C128> {
        &self.hloc
    }
}

impl fmt::Display for GroupDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (ndim, _, nspin) = self.ovlp.dim();
        for spin in 0..nspin {
            writeln!(f, "> Spin channel {spin}")?;
            writeln!(f, "  Overlap:")?;
            for i in 0..ndim {
                write!(f, "   ")?;
                for j in 0..ndim {
                    write!(f, " {:>12.6}", self.ovlp[[i, j, spin]])?;
                }
                writeln!(f)?;
            }
            writeln!(f, "  Density matrix:")?;
            for i in 0..ndim {
                write!(f, "   ")?;
                for j in 0..ndim {
                    write!(f, " {:>12.6}", self.dm[[i, j, spin]])?;
                }
                writeln!(f)?;
            }
            writeln!(f, "  Local Hamiltonian:")?;
            for i in 0..ndim {
                write!(f, "   ")?;
                for j in 0..ndim {
                    let h = self.hloc[[i, j, spin]];
                    write!(f, " {:>12.6}{:>+10.6}i", h.re, h.im)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
