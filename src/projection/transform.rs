//! Rotation and window filtering of raw projector amplitudes.

use anyhow::{self, ensure};
use ndarray::{s, Array4, Axis};
use rayon::prelude::*;

use crate::auxiliary::linalg::C128;
use crate::projection::window::ProjectorWindow;
use crate::projection::ProjectorGroup;

#[cfg(test)]
#[path = "transform_tests.rs"]
mod transform_tests;

/// Applies each group's shell transformation to the raw projector
/// amplitudes, reducing the projector axis to the group's sub-basis.
///
/// For a group with transformation $`\mathbf{T} \in \mathbb{C}^{d \times N}`$
/// over raw projectors $`p_1 \ldots p_N`$, the rotated amplitudes are
/// $`R[:, b, k, s] = \mathbf{T} \cdot \chi\psi[p_1..p_N, b, k, s]`$. Groups
/// are processed in parallel; each owns its output array.
///
/// # Arguments
///
/// * `groups` - The resolved projector groups.
/// * `chipsi` - The raw projector amplitudes `[nproj, nband, nkpt, nspin]`.
///
/// # Returns
///
/// A `Result` containing one rotated array `[d, nband, nkpt, nspin]` per
/// group, in group order.
pub fn rotate(
    groups: &[ProjectorGroup],
    chipsi: &Array4<C128>,
) -> Result<Vec<Array4<C128>>, anyhow::Error> {
    let (nproj, nband, nkpt, nspin) = chipsi.dim();
    groups
        .par_iter()
        .map(|group| {
            let ndim = group.ndim();
            ensure!(
                nband >= ndim,
                "Insufficient bands: a {}-dimensional sub-basis cannot be carried by \
                {nband} bands.",
                ndim
            );
            ensure!(
                group.projectors().iter().all(|&p| p < nproj),
                "Shape mismatch: a projector index of group (site {}, l = {}) exceeds the \
                raw projector count {nproj}.",
                group.site(),
                group.l()
            );
            let raw = chipsi.select(Axis(0), group.projectors());
            let mut rotated = Array4::<C128>::zeros((ndim, nband, nkpt, nspin));
            for s in 0..nspin {
                for k in 0..nkpt {
                    let block = raw.slice(s![.., .., k, s]);
                    rotated
                        .slice_mut(s![.., .., k, s])
                        .assign(&group.transformation().dot(&block));
                }
            }
            Ok(rotated)
        })
        .collect()
}

/// Copies each group's rotated amplitudes, restricted to its band window,
/// into a zero-padded window-sized array.
///
/// At every `(k, s)` slot the bands `ib1..=ib2` of the rotated array land in
/// columns `0..ib3` of the filtered array; columns beyond `ib3` stay zero.
///
/// # Arguments
///
/// * `rotated` - One rotated array per group, in group order.
/// * `windows` - One resolved window per group, in group order.
///
/// # Returns
///
/// A `Result` containing one filtered array `[d, nbnd, nkpt, nspin]` per
/// group.
pub fn filter(
    rotated: &[Array4<C128>],
    windows: &[ProjectorWindow],
) -> Result<Vec<Array4<C128>>, anyhow::Error> {
    ensure!(
        rotated.len() == windows.len(),
        "Shape mismatch: {} rotated groups but {} windows.",
        rotated.len(),
        windows.len()
    );
    rotated
        .par_iter()
        .zip(windows.par_iter())
        .map(|(rot, window)| {
            let (ndim, _nband, nkpt, nspin) = rot.dim();
            let nbnd = window.nbnd();
            let mut filtered = Array4::<C128>::zeros((ndim, nbnd, nkpt, nspin));
            for s in 0..nspin {
                for k in 0..nkpt {
                    let ib1 = window.ib1(k, s);
                    let ib2 = window.ib2(k, s);
                    let ib3 = window.ib3(k, s);
                    filtered
                        .slice_mut(s![.., 0..ib3, k, s])
                        .assign(&rot.slice(s![.., ib1..=ib2, k, s]));
                }
            }
            Ok(filtered)
        })
        .collect()
}
