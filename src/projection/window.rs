//! Momentum- and spin-resolved band windows over the Kohn–Sham spectrum.

use std::fmt;

use anyhow::{self, bail, ensure};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "window_tests.rs"]
mod window_tests;

// ================
// Enum definitions
// ================

// -----------
// WindowBound
// -----------

/// A single configured window bound: either a one-based band index or an
/// energy relative to the Fermi level. The configuration supplies these as a
/// flat list of scalars; consecutive pairs must be kind-homogeneous.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowBound {
    /// Variant for a one-based band index.
    Index(i64),

    /// Variant for an energy relative to the Fermi level.
    Energy(f64),
}

// ----------
// BandWindow
// ----------

/// An enumerated type for a validated window pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BandWindow {
    /// Variant for a pair of one-based, inclusive band indices applied
    /// uniformly at every k-point and spin.
    Indices(usize, usize),

    /// Variant for an energy interval resolved into band indices separately
    /// at every k-point and spin.
    Energies(f64, f64),
}

impl BandWindow {
    /// Constructs a validated window pair out of two configured bounds.
    ///
    /// Band pairs are inclusive, so a single-band window `(b, b)` is legal;
    /// energy pairs must be strictly ordered.
    ///
    /// # Arguments
    ///
    /// * `lo`, `hi` - Two bounds of the same scalar kind.
    pub fn new(lo: WindowBound, hi: WindowBound) -> Result<Self, anyhow::Error> {
        match (lo, hi) {
            (WindowBound::Index(lo), WindowBound::Index(hi)) => {
                ensure!(
                    hi >= lo,
                    "Bad window: the band pair ({lo}, {hi}) is not ordered."
                );
                ensure!(lo >= 1, "Bad window: band indices are one-based, but {lo} found.");
                Ok(BandWindow::Indices(lo as usize, hi as usize))
            }
            (WindowBound::Energy(lo), WindowBound::Energy(hi)) => {
                ensure!(
                    hi > lo,
                    "Bad window: the energy pair ({lo}, {hi}) is not ordered."
                );
                Ok(BandWindow::Energies(lo, hi))
            }
            _ => bail!(
                "Bad window: a pair must be either two band indices or two energies, \
                not a mixture."
            ),
        }
    }
}

impl fmt::Display for BandWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandWindow::Indices(lo, hi) => write!(f, "bands [{lo}, {hi}]"),
            BandWindow::Energies(lo, hi) => write!(f, "energies [{lo:.4}, {hi:.4}]"),
        }
    }
}

// =================
// Struct definition
// =================

/// A structure holding the resolved band window of one projector group.
#[derive(Clone, Debug)]
pub struct ProjectorWindow {
    /// The configured window pair this window was resolved from.
    bwin: BandWindow,

    /// Per-k-point, per-spin inclusive band bounds, indexed as
    /// `kwin[[k, s, 0..=1]]` with zero-based band indices.
    kwin: Array3<usize>,

    /// The smallest lower bound over all `(k, s)`.
    bmin: usize,

    /// The largest upper bound over all `(k, s)`.
    bmax: usize,

    /// The padded window size `bmax - bmin + 1`.
    nbnd: usize,
}

impl ProjectorWindow {
    /// Returns the configured window pair.
    pub fn bwin(&self) -> BandWindow {
        self.bwin
    }

    /// Returns the per-k-point, per-spin band bounds.
    pub fn kwin(&self) -> &Array3<usize> {
        &self.kwin
    }

    /// Returns the smallest zero-based lower band bound.
    pub fn bmin(&self) -> usize {
        self.bmin
    }

    /// Returns the largest zero-based upper band bound.
    pub fn bmax(&self) -> usize {
        self.bmax
    }

    /// Returns the padded window size.
    pub fn nbnd(&self) -> usize {
        self.nbnd
    }

    /// Returns the zero-based lower band bound at one `(k, s)` slot.
    pub fn ib1(&self, k: usize, s: usize) -> usize {
        self.kwin[[k, s, 0]]
    }

    /// Returns the zero-based upper band bound at one `(k, s)` slot.
    pub fn ib2(&self, k: usize, s: usize) -> usize {
        self.kwin[[k, s, 1]]
    }

    /// Returns the number of usable bands at one `(k, s)` slot.
    pub fn ib3(&self, k: usize, s: usize) -> usize {
        self.ib2(k, s) - self.ib1(k, s) + 1
    }
}

// =========
// Functions
// =========

/// Resolves one validated window pair against the band energies.
fn resolve_window(bwin: BandWindow, enk: &Array3<f64>) -> Result<ProjectorWindow, anyhow::Error> {
    let (nband, nkpt, nspin) = enk.dim();
    ensure!(
        nband > 0 && nkpt > 0 && nspin > 0,
        "Shape mismatch: empty band-energy array."
    );
    let mut kwin = Array3::<usize>::zeros((nkpt, nspin, 2));

    match bwin {
        BandWindow::Indices(lo, hi) => {
            ensure!(
                hi <= nband,
                "Bad window: band {hi} requested, but only {nband} bands are available."
            );
            for s in 0..nspin {
                for k in 0..nkpt {
                    kwin[[k, s, 0]] = lo - 1;
                    kwin[[k, s, 1]] = hi - 1;
                }
            }
        }
        BandWindow::Energies(lo, hi) => {
            let emin = enk.iter().copied().fold(f64::INFINITY, f64::min);
            let emax = enk.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            ensure!(
                lo <= emax && hi >= emin,
                "Bad window: the energy interval [{lo:.4}, {hi:.4}] misses the band range \
                [{emin:.4}, {emax:.4}] entirely."
            );
            for s in 0..nspin {
                for k in 0..nkpt {
                    let ib1 = (0..nband).find(|&b| enk[[b, k, s]] >= lo);
                    let ib2 = (0..nband).rev().find(|&b| enk[[b, k, s]] <= hi);
                    match (ib1, ib2) {
                        (Some(ib1), Some(ib2)) if ib2 >= ib1 => {
                            kwin[[k, s, 0]] = ib1;
                            kwin[[k, s, 1]] = ib2;
                        }
                        _ => bail!(
                            "Bad window: no band at k-point {k}, spin {s} falls inside the \
                            energy interval [{lo:.4}, {hi:.4}]."
                        ),
                    }
                }
            }
        }
    }

    let bmin = kwin
        .slice(ndarray::s![.., .., 0])
        .iter()
        .copied()
        .min()
        .expect("The band-bound array cannot be empty.");
    let bmax = kwin
        .slice(ndarray::s![.., .., 1])
        .iter()
        .copied()
        .max()
        .expect("The band-bound array cannot be empty.");
    Ok(ProjectorWindow {
        bwin,
        kwin,
        bmin,
        bmax,
        nbnd: bmax - bmin + 1,
    })
}

/// Resolves the configured window list into one [`ProjectorWindow`] per
/// projector group.
///
/// The flat list must hold either a single pair, shared by every group, or
/// one pair per group in group order. Integer pairs are applied uniformly;
/// energy pairs are resolved at every `(k, s)` slot into the smallest band at
/// or above the lower bound and the largest band at or below the upper bound.
///
/// # Arguments
///
/// * `window` - The flat configured bound list.
/// * `ngroups` - The number of projector groups.
/// * `enk` - The Fermi-calibrated band energies.
///
/// # Returns
///
/// A `Result` containing one window per group. Unordered or kind-mixed
/// pairs, out-of-range band indices and empty energy intersections are
/// fatal.
pub fn resolve_windows(
    window: &[WindowBound],
    ngroups: usize,
    enk: &Array3<f64>,
) -> Result<Vec<ProjectorWindow>, anyhow::Error> {
    ensure!(
        !window.is_empty() && window.len() % 2 == 0,
        "Bad window: the bound list must hold an even, positive number of scalars, \
        but holds {}.",
        window.len()
    );
    let nwin = window.len() / 2;
    ensure!(
        nwin == 1 || nwin == ngroups,
        "Bad window: {nwin} pairs configured for {ngroups} groups; \
        expected one shared pair or one pair per group."
    );

    if nwin == 1 {
        let resolved = resolve_window(BandWindow::new(window[0], window[1])?, enk)?;
        Ok(vec![resolved; ngroups])
    } else {
        (0..ngroups)
            .map(|g| {
                let bwin = BandWindow::new(window[2 * g], window[2 * g + 1])?;
                resolve_window(bwin, enk)
            })
            .collect()
    }
}
