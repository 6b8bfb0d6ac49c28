//! Projector groups over localised orbitals.
//!
//! A *projector group* collects the raw projectors of one site and one
//! angular momentum channel and carries the rectangular transformation that
//! reduces them to the requested shell sub-basis. Groups are plain values:
//! they own their trait list and transformation, and windows refer to them by
//! ordinal position only.

use std::fmt;
use std::str::FromStr;

use anyhow::{self, bail, ensure, format_err};
use itertools::Itertools;
use ndarray::Array2;

use crate::auxiliary::linalg::C128;

pub mod orthogonalisation;
pub mod transform;
pub mod window;

#[cfg(test)]
#[path = "projection_tests.rs"]
mod projection_tests;

// ==================
// Enum definitions
// ==================

// -----
// Shell
// -----

/// An enumerated type for the supported correlated shells.
///
/// The full shells select every orbital of their angular momentum channel;
/// the cubic-field split shells `d_t2g` and `d_eg` select sub-bases of the
/// `d` channel, assuming the raw projector ordering
/// (`dxy`, `dyz`, `dz2`, `dxz`, `dx2-y2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    /// Variant for a full `s` shell.
    S,

    /// Variant for a full `p` shell.
    P,

    /// Variant for a full `d` shell.
    D,

    /// Variant for a full `f` shell.
    F,

    /// Variant for the `t2g` triplet of a `d` shell.
    Dt2g,

    /// Variant for the `eg` doublet of a `d` shell.
    Deg,
}

impl Shell {
    /// Returns the angular momentum of the shell.
    pub fn l(&self) -> usize {
        match self {
            Shell::S => 0,
            Shell::P => 1,
            Shell::D | Shell::Dt2g | Shell::Deg => 2,
            Shell::F => 3,
        }
    }

    /// Returns the dimension of the shell sub-basis.
    pub fn ndim(&self) -> usize {
        match self {
            Shell::S => 1,
            Shell::P => 3,
            Shell::D => 5,
            Shell::F => 7,
            Shell::Dt2g => 3,
            Shell::Deg => 2,
        }
    }

    /// Returns the full shell of an angular momentum channel.
    ///
    /// # Arguments
    ///
    /// * `l` - An angular momentum within `0..=3`.
    pub fn default_for_l(l: usize) -> Result<Self, anyhow::Error> {
        match l {
            0 => Ok(Shell::S),
            1 => Ok(Shell::P),
            2 => Ok(Shell::D),
            3 => Ok(Shell::F),
            _ => bail!("Unsupported angular momentum: {l}."),
        }
    }

    /// Materialises the rectangular transformation
    /// $`\mathbf{T} \in \mathbb{C}^{d \times (2l+1)}`$ reducing the raw
    /// projectors of the channel to this shell's sub-basis.
    pub fn transformation(&self) -> Array2<C128> {
        let one = C128::new(1.0, 0.0);
        match self {
            Shell::S | Shell::P | Shell::D | Shell::F => Array2::eye(self.ndim()),
            Shell::Dt2g => {
                let mut tmat = Array2::zeros((3, 5));
                tmat[[0, 0]] = one;
                tmat[[1, 1]] = one;
                tmat[[2, 3]] = one;
                tmat
            }
            Shell::Deg => {
                let mut tmat = Array2::zeros((2, 5));
                tmat[[0, 2]] = one;
                tmat[[1, 4]] = one;
                tmat
            }
        }
    }
}

impl FromStr for Shell {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(Shell::S),
            "p" => Ok(Shell::P),
            "d" => Ok(Shell::D),
            "f" => Ok(Shell::F),
            "d_t2g" => Ok(Shell::Dt2g),
            "d_eg" => Ok(Shell::Deg),
            _ => bail!("Unknown shell label: `{s}`."),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Shell::S => "s",
            Shell::P => "p",
            Shell::D => "d",
            Shell::F => "f",
            Shell::Dt2g => "d_t2g",
            Shell::Deg => "d_eg",
        };
        write!(f, "{label}")
    }
}

// ==================
// Struct definitions
// ==================

// --------------
// ProjectorTrait
// --------------

/// The known cubic-harmonic labels, in order of their one-based
/// orbital-character index.
const ORBITAL_LABELS: [&str; 16] = [
    "s",
    "py",
    "pz",
    "px",
    "dxy",
    "dyz",
    "dz2",
    "dxz",
    "dx2-y2",
    "fy(3x2-y2)",
    "fxyz",
    "fyz2",
    "fz3",
    "fxz2",
    "fz(x2-y2)",
    "fx(x2-3y2)",
];

/// A structure describing one raw projector: its site, angular momentum,
/// magnetic quantum number and cubic-harmonic label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectorTrait {
    /// One-based index of the site the projector is centred on.
    site: usize,

    /// Angular momentum of the projector.
    l: usize,

    /// Zero-based magnetic quantum number within the channel.
    m: usize,

    /// Cubic-harmonic label of the projector.
    desc: String,
}

impl ProjectorTrait {
    /// Constructs a projector trait from a site index and a cubic-harmonic
    /// label.
    ///
    /// # Arguments
    ///
    /// * `site` - A one-based site index.
    /// * `desc` - A cubic-harmonic label from the known set.
    ///
    /// # Returns
    ///
    /// A `Result` containing the trait with its `l` and `m` quantum numbers
    /// deduced from the label's orbital-character index.
    pub fn new(site: usize, desc: &str) -> Result<Self, anyhow::Error> {
        ensure!(site >= 1, "Site indices are one-based, but {site} found.");
        let lm = ORBITAL_LABELS
            .iter()
            .position(|&label| label == desc)
            .map(|pos| pos + 1)
            .ok_or_else(|| format_err!("Unknown orbital label: `{desc}`."))?;
        let l = (0..=3)
            .find(|l| lm <= (l + 1) * (l + 1))
            .ok_or_else(|| format_err!("Orbital-character index {lm} out of range."))?;
        let m = lm - l * l - 1;
        Ok(Self {
            site,
            l,
            m,
            desc: desc.to_string(),
        })
    }

    /// Returns the one-based site index.
    pub fn site(&self) -> usize {
        self.site
    }

    /// Returns the angular momentum.
    pub fn l(&self) -> usize {
        self.l
    }

    /// Returns the zero-based magnetic quantum number.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Returns the cubic-harmonic label.
    pub fn desc(&self) -> &str {
        &self.desc
    }
}

// --------------
// ProjectorGroup
// --------------

/// A structure collecting the raw projectors of one site and one angular
/// momentum channel, together with the transformation that reduces them to
/// the requested shell sub-basis.
#[derive(Clone, Debug)]
pub struct ProjectorGroup {
    /// One-based index of the site the group is centred on.
    site: usize,

    /// Angular momentum of the group's channel.
    l: usize,

    /// Boolean indicating if the group spans a correlated subspace to be
    /// handed to the downstream DMFT engine.
    corr: bool,

    /// The shell sub-basis selected for this group.
    shell: Shell,

    /// Zero-based indices of the group's projectors on the raw projector
    /// axis, of length `2l + 1`.
    projectors: Vec<usize>,

    /// The rectangular transformation reducing the raw channel to the shell
    /// sub-basis, with `shell.ndim()` rows and `2l + 1` columns.
    transformation: Array2<C128>,
}

impl ProjectorGroup {
    /// Constructs a raw, uncorrelated projector group with the full shell of
    /// its channel and an identity transformation.
    ///
    /// # Arguments
    ///
    /// * `site` - A one-based site index.
    /// * `l` - The angular momentum of the channel.
    /// * `projectors` - Zero-based indices into the raw projector axis; there
    ///   must be exactly `2l + 1` of them.
    pub fn new(site: usize, l: usize, projectors: Vec<usize>) -> Result<Self, anyhow::Error> {
        ensure!(site >= 1, "Site indices are one-based, but {site} found.");
        ensure!(
            projectors.len() == 2 * l + 1,
            "A group with l = {l} must hold {} projectors, but holds {}.",
            2 * l + 1,
            projectors.len()
        );
        let shell = Shell::default_for_l(l)?;
        let transformation = shell.transformation();
        Ok(Self {
            site,
            l,
            corr: false,
            shell,
            projectors,
            transformation,
        })
    }

    /// Partitions a flat list of projector traits into raw groups, one per
    /// contiguous `(site, l)` run. The trait list must enumerate projectors
    /// in their order on the raw projector axis.
    pub fn partition(traits: &[ProjectorTrait]) -> Result<Vec<Self>, anyhow::Error> {
        let runs = traits
            .iter()
            .enumerate()
            .group_by(|(_, pt)| (pt.site, pt.l));
        runs.into_iter()
            .map(|((site, l), run)| {
                let projectors = run.map(|(p, _)| p).collect::<Vec<_>>();
                Self::new(site, l, projectors)
            })
            .collect()
    }

    /// Returns the one-based site index.
    pub fn site(&self) -> usize {
        self.site
    }

    /// Returns the angular momentum of the group's channel.
    pub fn l(&self) -> usize {
        self.l
    }

    /// Returns `true` if the group spans a correlated subspace.
    pub fn corr(&self) -> bool {
        self.corr
    }

    /// Returns the shell sub-basis selected for this group.
    pub fn shell(&self) -> Shell {
        self.shell
    }

    /// Returns the dimension of the group's sub-basis.
    pub fn ndim(&self) -> usize {
        self.transformation.nrows()
    }

    /// Returns the zero-based indices of the group's projectors on the raw
    /// projector axis.
    pub fn projectors(&self) -> &[usize] {
        &self.projectors
    }

    /// Returns the transformation reducing the raw channel to the shell
    /// sub-basis.
    pub fn transformation(&self) -> &Array2<C128> {
        &self.transformation
    }
}

// =========
// Functions
// =========

/// Extracts the one-based site index out of a configured atom entry.
///
/// Entries follow the `element : index` convention; the last run of digits in
/// the entry is taken as the index.
fn parse_site_index(entry: &str) -> Result<usize, anyhow::Error> {
    entry
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .last()
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|&site| site >= 1)
        .ok_or_else(|| format_err!("No one-based site index could be parsed out of `{entry}`."))
}

/// Merges the user configuration into a list of raw projector groups.
///
/// For each configured site whose `(site, l)` pair matches a raw group, the
/// group is flagged as correlated and given the configured shell; its
/// transformation is then materialised from the shell. Groups with no
/// configured match keep their full shell and identity transformation and
/// stay uncorrelated.
///
/// # Arguments
///
/// * `groups` - The raw projector groups, mutated in place.
/// * `atoms` - One configured entry per correlated site, each containing a
///   parseable one-based site index.
/// * `shells` - The shell label configured for each entry of `atoms`.
/// * `nsite` - The declared number of correlated sites; must equal the
///   lengths of both `atoms` and `shells`.
///
/// # Returns
///
/// A `Result` indicating if the resolution has been successful. Unknown shell
/// labels and inconsistent configurations are fatal.
pub fn resolve_groups(
    groups: &mut [ProjectorGroup],
    atoms: &[String],
    shells: &[String],
    nsite: usize,
) -> Result<(), anyhow::Error> {
    ensure!(
        nsite == atoms.len() && nsite == shells.len(),
        "Inconsistent configuration: nsite = {nsite}, but {} atom entries and {} shell labels.",
        atoms.len(),
        shells.len()
    );
    let sites = atoms
        .iter()
        .map(|entry| parse_site_index(entry))
        .collect::<Result<Vec<_>, _>>()?;
    let parsed_shells = shells
        .iter()
        .map(|label| Shell::from_str(label))
        .collect::<Result<Vec<_>, _>>()?;

    for group in groups.iter_mut() {
        ensure!(
            group.projectors.len() == 2 * group.l + 1,
            "A group with l = {} must hold {} projectors, but holds {}.",
            group.l,
            2 * group.l + 1,
            group.projectors.len()
        );
        if let Some(i) = sites
            .iter()
            .zip(parsed_shells.iter())
            .position(|(&site, shell)| site == group.site && shell.l() == group.l)
        {
            group.corr = true;
            group.shell = parsed_shells[i];
        }
        group.transformation = group.shell.transformation();
    }
    Ok(())
}
