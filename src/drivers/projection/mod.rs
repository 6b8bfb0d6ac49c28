//! Driver for the projection-on-localised-orbitals pipeline.
//!
//! The driver consumes the Kohn–Sham data handed over by the DFT engine
//! adaptor together with the projection parameters, and produces the
//! orthonormal, site-local projector set consumed by the downstream DMFT
//! engine, optionally accompanied by diagnostic matrices, check files and
//! the tetrahedron partial density of states.

use std::fmt;
use std::path::PathBuf;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::analysis::{calc_dm, calc_hamk, calc_hloc, calc_ovlp, GroupDiagnostics};
use crate::auxiliary::linalg::C128;
use crate::dos::{calc_dos, PartialDos};
use crate::drivers::PlodmftDriver;
use crate::io::format::{
    log_stage_begin, log_stage_end, log_subtitle, log_title, nice_bool, plodmft_error,
    plodmft_output, plodmft_warn, write_subtitle, PlodmftOutput,
};
use crate::io::{write_dos, write_hamk};
use crate::projection::orthogonalisation::{
    orthogonalise_each, orthogonalise_joint, orthonormality_residual,
};
use crate::projection::transform::{filter, rotate};
use crate::projection::window::{resolve_windows, ProjectorWindow, WindowBound};
use crate::projection::{resolve_groups, ProjectorGroup};
use crate::target::kohn_sham::KohnShamData;

#[cfg(test)]
#[path = "projection_driver_tests.rs"]
mod projection_driver_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// An enumerated type for the smearing scheme the DFT engine was run with.
/// The analytic-tetrahedron density of states is available only for
/// [`SmearingScheme::Tetra`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmearingScheme {
    /// Variant for the analytic-tetrahedron method.
    #[serde(rename = "tetra")]
    Tetra,

    /// Variant for Methfessel–Paxton smearing.
    #[serde(rename = "m-p")]
    MethfesselPaxton,

    /// Variant for Gaussian smearing.
    #[default]
    #[serde(rename = "gauss")]
    Gauss,
}

impl fmt::Display for SmearingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SmearingScheme::Tetra => "tetra",
            SmearingScheme::MethfesselPaxton => "m-p",
            SmearingScheme::Gauss => "gauss",
        };
        write!(f, "{label}")
    }
}

/// A structure containing control parameters for the projection pipeline.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// One entry per correlated site, each containing a parseable one-based
    /// site index (`element : index` convention).
    pub atoms: Vec<String>,

    /// The shell label configured for each entry of `atoms`; one of `s`,
    /// `p`, `d`, `f`, `d_t2g` or `d_eg`.
    pub shells: Vec<String>,

    /// The declared number of correlated sites; must equal the lengths of
    /// both `atoms` and `shells`.
    pub nsite: usize,

    /// Flat list of window bounds: one shared pair, or one pair per
    /// projector group in group order. Each pair is either two one-based
    /// band indices or two energies relative to the Fermi level.
    pub window: Vec<WindowBound>,

    /// The smearing scheme the DFT engine was run with; gates the
    /// tetrahedron density of states.
    #[builder(default)]
    #[serde(default)]
    pub smear: SmearingScheme,

    /// Boolean indicating if the diagnostic matrices, check files and
    /// density of states are to be computed.
    #[builder(default = "false")]
    #[serde(default)]
    pub diagnostics: bool,

    /// Directory receiving the diagnostic check files; the working directory
    /// when absent.
    #[builder(default = "None")]
    #[serde(default)]
    pub output_prefix: Option<PathBuf>,
}

impl ProjectionParams {
    /// Returns a builder to construct a [`ProjectionParams`] structure.
    pub fn builder() -> ProjectionParamsBuilder {
        ProjectionParamsBuilder::default()
    }
}

impl fmt::Display for ProjectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Correlated sites: {}", self.atoms.iter().join("; "))?;
        writeln!(f, "Configured shells: {}", self.shells.iter().join("; "))?;
        writeln!(f, "Number of correlated sites: {}", self.nsite)?;
        writeln!(
            f,
            "Window bounds: {}",
            self.window
                .iter()
                .map(|bound| match bound {
                    WindowBound::Index(i) => i.to_string(),
                    WindowBound::Energy(e) => format!("{e:.4}"),
                })
                .join(", ")
        )?;
        writeln!(f, "Smearing scheme: {}", self.smear)?;
        writeln!(f, "Compute diagnostics: {}", nice_bool(self.diagnostics))?;
        writeln!(
            f,
            "Check-file directory: {}",
            self.output_prefix
                .as_ref()
                .map(|prefix| prefix.display().to_string())
                .unwrap_or_else(|| "(working directory)".to_string())
        )?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure collecting the diagnostic outputs of one projection run.
#[derive(Clone, Debug)]
pub struct ProjectionDiagnostics {
    /// The per-group overlap, density and local-Hamiltonian matrices.
    groups: Vec<GroupDiagnostics>,

    /// The k-resolved Hamiltonian projected onto the joint stacked basis;
    /// present only in joint mode.
    hamk: Option<Array4<C128>>,

    /// The per-group tetrahedron partial density of states; present only
    /// with tetrahedron smearing.
    dos: Option<Vec<PartialDos>>,
}

impl ProjectionDiagnostics {
    /// Returns the per-group diagnostic matrices.
    pub fn groups(&self) -> &[GroupDiagnostics] {
        &self.groups
    }

    /// Returns the k-resolved projected Hamiltonian, if present.
    pub fn hamk(&self) -> Option<&Array4<C128>> {
        self.hamk.as_ref()
    }

    /// Returns the per-group partial density of states, if present.
    pub fn dos(&self) -> Option<&[PartialDos]> {
        self.dos.as_deref()
    }
}

/// A structure to contain the result of the projection pipeline.
#[derive(Clone, Debug)]
pub struct ProjectionResult {
    /// The resolved projector groups.
    groups: Vec<ProjectorGroup>,

    /// The resolved window of each group, in group order.
    windows: Vec<ProjectorWindow>,

    /// The orthonormalised projector amplitudes of each group, indexed as
    /// `[d, nbnd, nkpt, nspin]`, in group order.
    projectors: Vec<Array4<C128>>,

    /// The diagnostic outputs, when requested.
    diagnostics: Option<ProjectionDiagnostics>,
}

impl ProjectionResult {
    /// Returns the resolved projector groups.
    pub fn groups(&self) -> &[ProjectorGroup] {
        &self.groups
    }

    /// Returns the resolved window of each group.
    pub fn windows(&self) -> &[ProjectorWindow] {
        &self.windows
    }

    /// Returns the orthonormalised projector amplitudes of each group.
    pub fn projectors(&self) -> &[Array4<C128>] {
        &self.projectors
    }

    /// Returns the diagnostic outputs, when requested.
    pub fn diagnostics(&self) -> Option<&ProjectionDiagnostics> {
        self.diagnostics.as_ref()
    }
}

impl fmt::Display for ProjectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Projector group summary")?;
        writeln!(f)?;
        writeln!(
            f,
            " {:>5}  {:>4}  {:>2}  {:<6}  {:>4}  {:>3}  {:>11}  {:>4}",
            "Group", "Site", "l", "Shell", "Corr", "Dim", "Bands", "nbnd"
        )?;
        writeln!(f, "{}", "┈".repeat(56))?;
        for (g, (group, window)) in self.groups.iter().zip(self.windows.iter()).enumerate() {
            writeln!(
                f,
                " {:>5}  {:>4}  {:>2}  {:<6}  {:>4}  {:>3}  {:>4} – {:>4}  {:>4}",
                g + 1,
                group.site(),
                group.l(),
                group.shell().to_string(),
                nice_bool(group.corr()),
                group.ndim(),
                window.bmin() + 1,
                window.bmax() + 1,
                window.nbnd()
            )?;
        }
        writeln!(f, "{}", "┈".repeat(56))?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver structure for running the projection-on-localised-orbitals
/// pipeline.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ProjectionDriver<'a> {
    /// The control parameters for the projection pipeline.
    parameters: &'a ProjectionParams,

    /// The Kohn–Sham data handed over by the DFT engine adaptor. The driver
    /// owns the data set; its band energies are Fermi-calibrated in place
    /// during the run.
    kohn_sham: KohnShamData,

    /// The raw projector groups handed over by the DFT engine adaptor.
    groups: Vec<ProjectorGroup>,

    /// The result of the projection pipeline.
    #[builder(setter(skip), default = "None")]
    result: Option<ProjectionResult>,
}

impl<'a> ProjectionDriverBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        let params = self.parameters.ok_or("No projection parameters found.")?;
        let kohn_sham = self.kohn_sham.as_ref().ok_or("No Kohn–Sham data found.")?;
        let groups = self
            .groups
            .as_ref()
            .ok_or("No raw projector groups found.")?;

        if groups.is_empty() {
            return Err("The raw projector group list is empty.".to_string());
        }
        let nproj = kohn_sham.nproj();
        if groups
            .iter()
            .any(|group| group.projectors().iter().any(|&p| p >= nproj))
        {
            return Err(format!(
                "A projector index exceeds the raw projector count {nproj}."
            ));
        }
        if params.diagnostics && kohn_sham.occupy().is_none() {
            return Err(
                "Diagnostics requested, but no occupation numbers are present.".to_string(),
            );
        }
        if params.diagnostics
            && params.smear == SmearingScheme::Tetra
            && kohn_sham.tetra().is_none()
        {
            return Err(
                "Tetrahedron smearing configured, but no tetrahedron mesh is present.".to_string(),
            );
        }
        Ok(())
    }
}

impl<'a> ProjectionDriver<'a> {
    /// Returns a builder to construct a [`ProjectionDriver`] structure.
    pub fn builder() -> ProjectionDriverBuilder<'a> {
        ProjectionDriverBuilder::default()
    }

    /// Executes the projection pipeline and stores the result.
    fn project(&mut self) -> Result<(), anyhow::Error> {
        log_title("Projection on Localised Orbitals");
        plodmft_output!("");
        self.parameters.log_output_display();
        plodmft_output!("");

        log_stage_begin("Fermi calibration");
        let fermi = self.kohn_sham.fermi();
        self.kohn_sham.calibrate_fermi();
        plodmft_output!("Band energies shifted by {:+.6}; the Fermi level now sits at zero.", -fermi);
        log_stage_end("Fermi calibration");

        log_stage_begin("Group resolution");
        let mut groups = self.groups.clone();
        resolve_groups(
            &mut groups,
            &self.parameters.atoms,
            &self.parameters.shells,
            self.parameters.nsite,
        )?;
        plodmft_output!(
            "{} of {} groups flagged as correlated.",
            groups.iter().filter(|group| group.corr()).count(),
            groups.len()
        );
        log_stage_end("Group resolution");

        log_stage_begin("Window resolution");
        let windows = resolve_windows(
            &self.parameters.window,
            groups.len(),
            self.kohn_sham.enk(),
        )?;
        for (g, window) in windows.iter().enumerate() {
            plodmft_output!(
                "Group {}: {} resolved into bands {} – {} (padded size {}).",
                g + 1,
                window.bwin(),
                window.bmin() + 1,
                window.bmax() + 1,
                window.nbnd()
            );
        }
        log_stage_end("Window resolution");

        log_stage_begin("Rotation and filtering");
        let rotated = rotate(&groups, self.kohn_sham.chipsi())?;
        let mut projectors = filter(&rotated, &windows)?;
        drop(rotated);
        log_stage_end("Rotation and filtering");

        log_stage_begin("Löwdin orthonormalisation");
        let joint = self.parameters.window.len() == 2;
        if joint {
            plodmft_output!("Joint mode: all groups share one window.");
            orthogonalise_joint(&mut projectors, &windows[0])?;
        } else {
            plodmft_output!("Per-group mode: each group is orthonormalised in its own window.");
            orthogonalise_each(&mut projectors, &windows)?;
        }
        for (g, (fchipsi, window)) in projectors.iter().zip(windows.iter()).enumerate() {
            plodmft_output!(
                "Group {}: orthonormality residual {:.3e}.",
                g + 1,
                orthonormality_residual(fchipsi, window)
            );
        }
        log_stage_end("Löwdin orthonormalisation");

        let diagnostics = if self.parameters.diagnostics {
            log_stage_begin("Diagnostics");
            let diagnostics = self.calc_diagnostics(&windows, &projectors, joint)?;
            log_stage_end("Diagnostics");
            Some(diagnostics)
        } else {
            None
        };

        let result = ProjectionResult {
            groups,
            windows,
            projectors,
            diagnostics,
        };
        result.log_output_display();
        self.result = Some(result);
        Ok(())
    }

    /// Computes the diagnostic matrices, writes the check files, and, with
    /// tetrahedron smearing, computes the partial density of states.
    fn calc_diagnostics(
        &self,
        windows: &[ProjectorWindow],
        projectors: &[Array4<C128>],
        joint: bool,
    ) -> Result<ProjectionDiagnostics, anyhow::Error> {
        let kohn_sham = &self.kohn_sham;
        let occupy = kohn_sham
            .occupy()
            .ok_or_else(|| format_err!("No occupation numbers are present."))?;
        let prefix = self
            .parameters
            .output_prefix
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let mut group_diagnostics = Vec::with_capacity(projectors.len());
        for (g, (fchipsi, window)) in projectors.iter().zip(windows.iter()).enumerate() {
            let ovlp = calc_ovlp(fchipsi, kohn_sham.weight());
            let dm = calc_dm(fchipsi, kohn_sham.weight(), occupy, window);
            let hloc = calc_hloc(fchipsi, kohn_sham.weight(), kohn_sham.enk(), window);
            let diagnostics = GroupDiagnostics::new(ovlp, dm, hloc);
            log_subtitle(&format!("Diagnostic matrices of group {}", g + 1));
            diagnostics.log_output_display();
            group_diagnostics.push(diagnostics);
        }

        let hamk = if joint {
            let hamk = calc_hamk(projectors, kohn_sham.enk(), &windows[0]);
            write_hamk(prefix.join("hamk.chk"), &hamk.view())?;
            plodmft_output!("k-resolved projected Hamiltonian written to `hamk.chk`.");
            Some(hamk)
        } else {
            None
        };

        let dos = if self.parameters.smear == SmearingScheme::Tetra {
            let tetra = kohn_sham
                .tetra()
                .ok_or_else(|| format_err!("No tetrahedron mesh is present."))?;
            let mut group_dos = Vec::with_capacity(projectors.len());
            for (g, (fchipsi, window)) in projectors.iter().zip(windows.iter()).enumerate() {
                let dos = calc_dos(fchipsi, window, kohn_sham.enk(), tetra)?;
                write_dos(prefix.join(format!("dos.chk.{}", g + 1)), &dos)?;
                let integrated = dos.integrated();
                plodmft_output!(
                    "Group {}: density of states written to `dos.chk.{}`; integrated weights \
                    per orbital and spin: {} (one expected each).",
                    g + 1,
                    g + 1,
                    integrated.iter().map(|w| format!("{w:.4}")).join(", ")
                );
                let deviation = integrated
                    .iter()
                    .map(|w| (w - 1.0).abs())
                    .fold(0.0, f64::max);
                if deviation > 0.1 {
                    plodmft_warn!(
                        "Group {}: the integrated density of states deviates from the sum rule \
                        by {deviation:.3}; the window may be cutting through dispersing bands.",
                        g + 1
                    );
                }
                group_dos.push(dos);
            }
            Some(group_dos)
        } else {
            None
        };

        Ok(ProjectionDiagnostics {
            groups: group_diagnostics,
            hamk,
            dos,
        })
    }
}

impl<'a> PlodmftDriver for ProjectionDriver<'a> {
    type Outcome = ProjectionResult;

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.project().map_err(|err| {
            plodmft_error!("{err}");
            err
        })
    }

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No projection result found."))
    }
}
