//! Analytic-tetrahedron partial density of states over projector groups.

use anyhow::{self, ensure};
use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView3};

use crate::auxiliary::linalg::C128;
use crate::projection::window::{BandWindow, ProjectorWindow};
use crate::target::kohn_sham::TetrahedronMesh;

pub mod tetrahedron;


/// The energy mesh spacing of the density of states.
const DOS_MESH_STEP: f64 = 0.01;

// =================
// Struct definition
// =================

/// A structure holding the partial density of states of one projector group.
#[derive(Clone, Debug)]
pub struct PartialDos {
    /// The energy mesh.
    mesh: Array1<f64>,

    /// The density values, indexed as `[orbital, spin, mesh point]`.
    values: Array3<f64>,
}

impl PartialDos {
    /// Returns the energy mesh.
    pub fn mesh(&self) -> &Array1<f64> {
        &self.mesh
    }

    /// Returns the density values, indexed as `[orbital, spin, mesh point]`.
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Integrates the density over the mesh for every orbital and spin.
    ///
    /// # Returns
    ///
    /// The integrated weights `[orbital, spin]`; each approaches one per
    /// orbital per spin when the mesh covers the group's window.
    pub fn integrated(&self) -> Array2<f64> {
        let (ndim, nspin, nmesh) = self.values.dim();
        let mut integral = Array2::<f64>::zeros((ndim, nspin));
        for spin in 0..nspin {
            for q in 0..ndim {
                let mut acc = 0.0;
                for m in 0..nmesh {
                    acc += self.values[[q, spin, m]];
                }
                integral[[q, spin]] = acc * DOS_MESH_STEP;
            }
        }
        integral
    }
}

// =========
// Functions
// =========

/// Builds the energy mesh of one group's density of states.
///
/// Integer windows span the windowed band energies rounded outwards to whole
/// numbers; energy windows span the configured interval itself.
fn dos_mesh(bwin: BandWindow, enk_win: &ArrayView3<f64>) -> Array1<f64> {
    let (emin, emax) = match bwin {
        BandWindow::Indices(_, _) => {
            let emin = enk_win.iter().copied().fold(f64::INFINITY, f64::min);
            let emax = enk_win.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (emin.floor(), emax.ceil())
        }
        BandWindow::Energies(lo, hi) => (lo, hi),
    };
    let nmesh = ((emax - emin) / DOS_MESH_STEP).round() as usize + 1;
    Array1::from_iter((0..nmesh).map(|m| emin + m as f64 * DOS_MESH_STEP))
}

/// Computes the per-band Brillouin-zone integration weights at one target
/// energy.
///
/// Every tetrahedron distributes its density-of-states weight equally to its
/// four corner k-points, scaled by its multiplicity and the volume factor;
/// the result is normalised by the total tetrahedron weight.
///
/// # Arguments
///
/// * `energy` - The target energy.
/// * `enk_win` - The windowed band energies `[nbnd, nkpt, nspin]`.
/// * `tetra` - The tetrahedron mesh.
///
/// # Returns
///
/// The integration weights, with the same shape as `enk_win`.
pub fn integration_weights(
    energy: f64,
    enk_win: &ArrayView3<f64>,
    tetra: &TetrahedronMesh,
) -> Array3<f64> {
    let (nbnd, _nkpt, nspin) = enk_win.dim();
    let mut weights = Array3::<f64>::zeros(enk_win.dim());
    for row in tetra.itet().rows() {
        let mult = row[0] as f64;
        let corners = [
            row[1] as usize,
            row[2] as usize,
            row[3] as usize,
            row[4] as usize,
        ];
        for spin in 0..nspin {
            for b in 0..nbnd {
                let corner_energies = [
                    enk_win[[b, corners[0], spin]],
                    enk_win[[b, corners[1], spin]],
                    enk_win[[b, corners[2], spin]],
                    enk_win[[b, corners[3], spin]],
                ];
                let delta = tetrahedron::delta_weight(energy, corner_energies);
                if delta != 0.0 {
                    let contribution = mult * tetra.volt() * delta / 4.0;
                    for &kc in &corners {
                        weights[[b, kc, spin]] += contribution;
                    }
                }
            }
        }
    }
    weights /= tetra.total_weight();
    weights
}

/// Computes the partial density of states of one projector group over its
/// window.
///
/// # Arguments
///
/// * `fchipsi` - The group's orthonormalised amplitudes
///   `[d, nbnd, nkpt, nspin]`.
/// * `window` - The group's resolved window.
/// * `enk` - The Fermi-calibrated band energies `[nband, nkpt, nspin]`.
/// * `tetra` - The tetrahedron mesh.
///
/// # Returns
///
/// A `Result` containing the partial density of states.
pub fn calc_dos(
    fchipsi: &Array4<C128>,
    window: &ProjectorWindow,
    enk: &Array3<f64>,
    tetra: &TetrahedronMesh,
) -> Result<PartialDos, anyhow::Error> {
    let (ndim, _nbnd, nkpt, nspin) = fchipsi.dim();
    let corner_max = tetra
        .itet()
        .slice(s![.., 1..])
        .iter()
        .copied()
        .max()
        .unwrap_or(0);
    ensure!(
        corner_max < nkpt as i64,
        "Tetrahedron corner index {corner_max} exceeds the k-point count {nkpt}."
    );

    let enk_win = enk.slice(s![window.bmin()..=window.bmax(), .., ..]);
    let mesh = dos_mesh(window.bwin(), &enk_win);
    let nmesh = mesh.len();

    let mut values = Array3::<f64>::zeros((ndim, nspin, nmesh));
    for (m, &energy) in mesh.iter().enumerate() {
        let weights = integration_weights(energy, &enk_win, tetra);
        for spin in 0..nspin {
            for k in 0..nkpt {
                let offset = window.ib1(k, spin) - window.bmin();
                for j in 0..window.ib3(k, spin) {
                    let wght = weights[[offset + j, k, spin]];
                    if wght == 0.0 {
                        continue;
                    }
                    for q in 0..ndim {
                        values[[q, spin, m]] += wght * fchipsi[[q, j, k, spin]].norm_sqr();
                    }
                }
            }
        }
    }

    Ok(PartialDos { mesh, values })
}
