//! Routines for writing `plodmft` diagnostic check files.
//!
//! The check files are plain text, one scalar or one row per line, with
//! explicit headers, so that downstream DMFT engines and plotting scripts can
//! consume them without any binary dependencies. Formatting is fixed to keep
//! repeated runs bitwise-identical.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{self, format_err};
use ndarray::ArrayView4;

use crate::auxiliary::linalg::C128;
use crate::dos::PartialDos;

pub(crate) mod format;

/// Writes the k-resolved projected Hamiltonian to a `hamk.chk` file.
///
/// The header consists of three lines giving `nproj`, `nkpt` and `nspin`,
/// followed by `nspin · nkpt · nproj · nproj` lines of `Re Im` pairs with
/// spin outermost, then k-point, then matrix column, and the matrix row as
/// the innermost index.
///
/// # Arguments
///
/// * `path` - The path of the file to be written.
/// * `hamk` - The projected Hamiltonian, indexed as `[row, column, k, spin]`.
///
/// # Returns
///
/// A `Result` indicating if the writing process has been successful.
pub fn write_hamk<P: AsRef<Path>>(path: P, hamk: &ArrayView4<C128>) -> Result<(), anyhow::Error> {
    let (nproj, nproj2, nkpt, nspin) = hamk.dim();
    if nproj != nproj2 {
        return Err(format_err!(
            "Shape mismatch: the projected Hamiltonian must be square along its first two axes, \
            but has dimensions {nproj} × {nproj2}."
        ));
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "nproj {nproj}")?;
    writeln!(writer, "nkpt  {nkpt}")?;
    writeln!(writer, "nspin {nspin}")?;
    for s in 0..nspin {
        for k in 0..nkpt {
            for q in 0..nproj {
                for p in 0..nproj {
                    let h = hamk[[p, q, k, s]];
                    writeln!(writer, "{:>20.12E} {:>20.12E}", h.re, h.im)?;
                }
            }
        }
    }
    Ok(())
}

/// Writes the partial density of states of one projector group to a
/// `dos.chk.<g>` file.
///
/// The header consists of three lines giving `nmesh`, `ndim` and `nspin`,
/// followed by `nmesh` lines, each carrying the mesh energy and then
/// `ndim · nspin` density values with spin outer and orbital inner.
///
/// # Arguments
///
/// * `path` - The path of the file to be written (the `<g>` suffix is the
///   caller's responsibility).
/// * `dos` - The partial density of states of the group.
///
/// # Returns
///
/// A `Result` indicating if the writing process has been successful.
pub fn write_dos<P: AsRef<Path>>(path: P, dos: &PartialDos) -> Result<(), anyhow::Error> {
    let (ndim, nspin, nmesh) = dos.values().dim();
    if nmesh != dos.mesh().len() {
        return Err(format_err!(
            "Shape mismatch: {nmesh} density columns but {} mesh points.",
            dos.mesh().len()
        ));
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "nmesh {nmesh}")?;
    writeln!(writer, "ndim  {ndim}")?;
    writeln!(writer, "nspin {nspin}")?;
    for (m, &energy) in dos.mesh().iter().enumerate() {
        write!(writer, "{energy:>16.8E}")?;
        for s in 0..nspin {
            for q in 0..ndim {
                write!(writer, " {:>16.8E}", dos.values()[[q, s, m]])?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}
