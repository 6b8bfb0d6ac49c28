//! Immutable Kohn–Sham inputs handed over by the DFT engine adaptor.

use anyhow::{self, ensure};
use derive_builder::Builder;
use ndarray::{Array1, Array2, Array3, Array4};

use crate::auxiliary::linalg::C128;

#[cfg(test)]
#[path = "kohn_sham_tests.rs"]
mod kohn_sham_tests;

// ==================
// Struct definitions
// ==================

// ---------------
// TetrahedronMesh
// ---------------

/// A structure holding the analytic-tetrahedron decomposition of the
/// Brillouin zone.
#[derive(Clone, Debug)]
pub struct TetrahedronMesh {
    /// Tetrahedron table of shape `[ntet, 5]`: column 0 carries the
    /// multiplicity of the tetrahedron, columns 1–4 the zero-based indices of
    /// its four corner k-points.
    itet: Array2<i64>,

    /// The volume factor of a single tetrahedron.
    volt: f64,
}

impl TetrahedronMesh {
    /// Constructs a validated tetrahedron mesh.
    ///
    /// # Arguments
    ///
    /// * `itet` - The tetrahedron table, `[ntet, 5]` with multiplicities in
    ///   column 0 and corner k-point indices in columns 1–4.
    /// * `volt` - The volume factor of a single tetrahedron.
    ///
    /// # Returns
    ///
    /// A `Result` containing the mesh, or an error if the table shape, a
    /// multiplicity, a corner index, or the volume factor is invalid.
    pub fn new(itet: Array2<i64>, volt: f64) -> Result<Self, anyhow::Error> {
        ensure!(
            itet.ncols() == 5,
            "Shape mismatch: the tetrahedron table must have five columns, but has {}.",
            itet.ncols()
        );
        ensure!(
            itet.column(0).iter().all(|&m| m >= 1),
            "Every tetrahedron multiplicity must be at least one."
        );
        ensure!(
            itet.iter().all(|&i| i >= 0),
            "Negative entries found in the tetrahedron table."
        );
        ensure!(volt > 0.0, "The tetrahedron volume factor must be positive.");
        Ok(Self { itet, volt })
    }

    /// Returns the tetrahedron table.
    pub fn itet(&self) -> &Array2<i64> {
        &self.itet
    }

    /// Returns the volume factor of a single tetrahedron.
    pub fn volt(&self) -> f64 {
        self.volt
    }

    /// Returns the number of tetrahedra.
    pub fn ntet(&self) -> usize {
        self.itet.nrows()
    }

    /// Returns the sum of all tetrahedron multiplicities scaled by the volume
    /// factor, which normalises the Brillouin-zone integration weights.
    pub fn total_weight(&self) -> f64 {
        self.itet.column(0).iter().map(|&m| m as f64).sum::<f64>() * self.volt
    }
}

// -----------
// KohnShamData
// -----------

/// A structure holding the Kohn–Sham data set produced by the DFT engine
/// adaptor. All arrays are indexed band-major as `[band, k, spin]` (or
/// `[projector, band, k, spin]` for the amplitudes), with zero-based indices
/// throughout.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct KohnShamData {
    /// Kohn–Sham band energies `enk[b, k, s]`.
    enk: Array3<f64>,

    /// Raw projector amplitudes
    /// $`\langle \chi_{I l m} | \psi_{b \mathbf{k} s} \rangle`$, indexed as
    /// `chipsi[p, b, k, s]`.
    chipsi: Array4<C128>,

    /// Normalised k-point weights summing to one.
    weight: Array1<f64>,

    /// Band occupation numbers `occupy[b, k, s]`, each within
    /// `[0, 2/nspin]`. Required only by the diagnostic density matrix.
    #[builder(default = "None")]
    occupy: Option<Array3<f64>>,

    /// Analytic-tetrahedron decomposition of the Brillouin zone. Required
    /// only by the tetrahedron density of states.
    #[builder(default = "None")]
    tetra: Option<TetrahedronMesh>,

    /// The Fermi level of the Kohn–Sham solution.
    fermi: f64,
}

impl KohnShamDataBuilder {
    fn validate(&self) -> Result<(), String> {
        let enk = self.enk.as_ref().ok_or("No band energies found.")?;
        let chipsi = self
            .chipsi
            .as_ref()
            .ok_or("No projector amplitudes found.")?;
        let weight = self.weight.as_ref().ok_or("No k-point weights found.")?;

        let (nband, nkpt, nspin) = enk.dim();
        if nband == 0 || nkpt == 0 {
            return Err(format!(
                "Shape mismatch: empty band or k-point axis ({nband}, {nkpt})."
            ));
        }
        let (nproj, nband_c, nkpt_c, nspin_c) = chipsi.dim();
        if nproj == 0 {
            return Err("Shape mismatch: empty projector axis.".to_string());
        }
        if (nband_c, nkpt_c, nspin_c) != (nband, nkpt, nspin) {
            return Err(format!(
                "Shape mismatch: `chipsi` has band/k/spin dimensions \
                ({nband_c}, {nkpt_c}, {nspin_c}) but `enk` has ({nband}, {nkpt}, {nspin})."
            ));
        }
        if weight.len() != nkpt {
            return Err(format!(
                "Shape mismatch: {} k-point weights found for {nkpt} k-points.",
                weight.len()
            ));
        }
        if weight.iter().any(|&w| w < 0.0) {
            return Err("Negative k-point weight found.".to_string());
        }
        let wsum = weight.sum();
        if (wsum - 1.0).abs() > 1e-8 {
            return Err(format!(
                "The k-point weights must sum to one, but sum to {wsum:.10}."
            ));
        }
        if !(1..=2).contains(&nspin) {
            return Err(format!("Unsupported number of spin channels: {nspin}."));
        }

        if let Some(Some(occupy)) = self.occupy.as_ref() {
            if occupy.dim() != (nband, nkpt, nspin) {
                return Err(format!(
                    "Shape mismatch: `occupy` has dimensions {:?} but `enk` has \
                    ({nband}, {nkpt}, {nspin}).",
                    occupy.dim()
                ));
            }
            let occ_max = 2.0 / nspin as f64;
            if occupy
                .iter()
                .any(|&o| o < -1e-8 || o > occ_max + 1e-8)
            {
                return Err(format!(
                    "Occupation numbers must lie within [0, {occ_max}]."
                ));
            }
        }

        if let Some(Some(tetra)) = self.tetra.as_ref() {
            let corner_max = tetra
                .itet
                .slice(ndarray::s![.., 1..])
                .iter()
                .copied()
                .max()
                .unwrap_or(0);
            if corner_max >= nkpt as i64 {
                return Err(format!(
                    "Tetrahedron corner index {corner_max} exceeds the k-point count {nkpt}."
                ));
            }
        }

        Ok(())
    }
}

impl KohnShamData {
    /// Returns a builder to construct a [`KohnShamData`] structure.
    pub fn builder() -> KohnShamDataBuilder {
        KohnShamDataBuilder::default()
    }

    /// Returns the number of bands.
    pub fn nband(&self) -> usize {
        self.enk.dim().0
    }

    /// Returns the number of k-points.
    pub fn nkpt(&self) -> usize {
        self.enk.dim().1
    }

    /// Returns the number of spin channels.
    pub fn nspin(&self) -> usize {
        self.enk.dim().2
    }

    /// Returns the number of raw projectors.
    pub fn nproj(&self) -> usize {
        self.chipsi.dim().0
    }

    /// Returns the band energies.
    pub fn enk(&self) -> &Array3<f64> {
        &self.enk
    }

    /// Returns the raw projector amplitudes.
    pub fn chipsi(&self) -> &Array4<C128> {
        &self.chipsi
    }

    /// Returns the k-point weights.
    pub fn weight(&self) -> &Array1<f64> {
        &self.weight
    }

    /// Returns the band occupation numbers, if present.
    pub fn occupy(&self) -> Option<&Array3<f64>> {
        self.occupy.as_ref()
    }

    /// Returns the tetrahedron mesh, if present.
    pub fn tetra(&self) -> Option<&TetrahedronMesh> {
        self.tetra.as_ref()
    }

    /// Returns the Fermi level.
    pub fn fermi(&self) -> f64 {
        self.fermi
    }

    /// Shifts all band energies so that the Fermi level sits at zero, then
    /// zeroes the stored Fermi level. Idempotent once applied.
    pub fn calibrate_fermi(&mut self) {
        let fermi = self.fermi;
        self.enk.mapv_inplace(|e| e - fermi);
        self.fermi = 0.0;
    }
}
