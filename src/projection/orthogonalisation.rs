//! Löwdin orthonormalisation of windowed projector amplitudes.

use anyhow::{self, ensure};
use ndarray::{s, Array2, Array4};
use rayon::prelude::*;

use crate::auxiliary::linalg::{loewdin, C128};
use crate::projection::window::ProjectorWindow;

#[cfg(test)]
#[path = "orthogonalisation_tests.rs"]
mod orthogonalisation_tests;

/// Löwdin-orthonormalises each group independently within its own window.
///
/// At every `(k, s)` slot the usable slice `[d, ib3]` of the group's filtered
/// amplitudes is replaced by its Löwdin-orthonormalised counterpart in place.
/// Groups are processed in parallel.
///
/// # Arguments
///
/// * `filtered` - One filtered array per group, mutated in place.
/// * `windows` - One resolved window per group, in group order.
///
/// # Returns
///
/// A `Result` indicating success. A window slot carrying fewer bands than the
/// group dimension, or a rank-deficient usable slice, is fatal.
pub fn orthogonalise_each(
    filtered: &mut [Array4<C128>],
    windows: &[ProjectorWindow],
) -> Result<(), anyhow::Error> {
    ensure!(
        filtered.len() == windows.len(),
        "Shape mismatch: {} filtered groups but {} windows.",
        filtered.len(),
        windows.len()
    );
    filtered
        .par_iter_mut()
        .zip(windows.par_iter())
        .try_for_each(|(fchipsi, window)| {
            let (ndim, _nbnd, nkpt, nspin) = fchipsi.dim();
            for spin in 0..nspin {
                for k in 0..nkpt {
                    let ib3 = window.ib3(k, spin);
                    ensure!(
                        ib3 >= ndim,
                        "Insufficient bands: the window at k-point {k}, spin {spin} holds \
                        {ib3} bands for a {ndim}-dimensional group."
                    );
                    let mut slice = fchipsi.slice_mut(s![.., 0..ib3, k, spin]);
                    loewdin(&mut slice)?;
                }
            }
            Ok(())
        })
}

/// Löwdin-orthonormalises all groups jointly within one shared window.
///
/// At every `(k, s)` slot the groups' usable slices are stacked into a
/// working matrix of `D = Σ d_g` rows, orthonormalised as a whole, and
/// scattered back, so that projectors of different groups end up mutually
/// orthonormal.
///
/// # Arguments
///
/// * `filtered` - One filtered array per group, all resolved from the same
///   shared window, mutated in place.
/// * `window` - The shared window.
///
/// # Returns
///
/// A `Result` indicating success. A window slot carrying fewer bands than
/// the stacked dimension, or a rank-deficient stacked slice, is fatal.
pub fn orthogonalise_joint(
    filtered: &mut [Array4<C128>],
    window: &ProjectorWindow,
) -> Result<(), anyhow::Error> {
    ensure!(
        filtered
            .iter()
            .all(|fchipsi| fchipsi.dim().1 == window.nbnd()),
        "Shape mismatch: the groups do not share the joint window."
    );
    let dims = filtered
        .iter()
        .map(|fchipsi| fchipsi.dim().0)
        .collect::<Vec<_>>();
    let dtot: usize = dims.iter().sum();
    let (nkpt, nspin) = filtered
        .first()
        .map(|fchipsi| (fchipsi.dim().2, fchipsi.dim().3))
        .unwrap_or((0, 0));

    for spin in 0..nspin {
        for k in 0..nkpt {
            let ib3 = window.ib3(k, spin);
            ensure!(
                ib3 >= dtot,
                "Insufficient bands: the shared window at k-point {k}, spin {spin} holds \
                {ib3} bands for {dtot} stacked projectors."
            );
            let mut stacked = Array2::<C128>::zeros((dtot, ib3));
            let mut offset = 0;
            for (fchipsi, &ndim) in filtered.iter().zip(dims.iter()) {
                stacked
                    .slice_mut(s![offset..offset + ndim, ..])
                    .assign(&fchipsi.slice(s![.., 0..ib3, k, spin]));
                offset += ndim;
            }
            loewdin(&mut stacked.view_mut())?;
            let mut offset = 0;
            for (fchipsi, &ndim) in filtered.iter_mut().zip(dims.iter()) {
                fchipsi
                    .slice_mut(s![.., 0..ib3, k, spin])
                    .assign(&stacked.slice(s![offset..offset + ndim, ..]));
                offset += ndim;
            }
        }
    }
    Ok(())
}

/// Probes how far a group's usable slices deviate from row-orthonormality.
///
/// # Returns
///
/// The largest absolute deviation of any usable-slice row overlap from the
/// identity, over all `(k, s)` slots.
pub fn orthonormality_residual(fchipsi: &Array4<C128>, window: &ProjectorWindow) -> f64 {
    let (ndim, _nbnd, nkpt, nspin) = fchipsi.dim();
    let mut residual: f64 = 0.0;
    for spin in 0..nspin {
        for k in 0..nkpt {
            let ib3 = window.ib3(k, spin);
            let slice = fchipsi.slice(s![.., 0..ib3, k, spin]);
            let slice_h = slice.t().mapv(|x| x.conj());
            let ovlp = slice.dot(&slice_h);
            for i in 0..ndim {
                for j in 0..ndim {
                    let expected = if i == j {
                        C128::new(1.0, 0.0)
                    } else {
                        C128::new(0.0, 0.0)
                    };
                    residual = residual.max((ovlp[[i, j]] - expected).norm());
                }
            }
        }
    }
    residual
}
