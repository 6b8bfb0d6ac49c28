//! Dense linear-algebra primitives for the projection pipeline.

use anyhow::{self, ensure};
use ndarray::{Array2, ArrayViewMut2};
use ndarray_linalg::{eigh::Eigh, UPLO};
use num_complex::Complex;

#[cfg(test)]
#[path = "linalg_tests.rs"]
mod linalg_tests;

/// The complex scalar type used for all projector amplitudes.
pub type C128 = Complex<f64>;

/// Computes the inverse square root $`\mathbf{O}^{-1/2}`$ of a Hermitian
/// positive-definite matrix via its eigendecomposition.
///
/// # Arguments
///
/// * `omat` - A Hermitian matrix. Only its lower triangle is referenced.
///
/// # Returns
///
/// A `Result` containing the inverse square root, or an error if any
/// eigenvalue of `omat` fails to be strictly positive.
pub fn invsqrt_hermitian(omat: &Array2<C128>) -> Result<Array2<C128>, anyhow::Error> {
    let (o_eig, umat) = omat.eigh(UPLO::Lower)?;
    let min_eig = o_eig.iter().copied().fold(f64::INFINITY, f64::min);
    ensure!(
        min_eig > 0.0,
        "Non-positive overlap eigenvalue {min_eig:.3e} encountered; \
        the projectors do not span a linearly independent set in this window."
    );
    let s_diag = Array2::<C128>::from_diag(&o_eig.mapv(|x| C128::new(1.0 / x.sqrt(), 0.0)));
    let umat_h = umat.t().mapv(|x| x.conj());
    Ok(umat.dot(&s_diag).dot(&umat_h))
}

/// Löwdin-orthonormalises the rows of a complex matrix in place.
///
/// The matrix $`\mathbf{M} \in \mathbb{C}^{d \times n}`$ is replaced by
/// $`(\mathbf{M}\mathbf{M}^{\dagger})^{-1/2}\,\mathbf{M}`$, whose rows form an
/// orthonormal set whenever the original rows are linearly independent.
///
/// # Arguments
///
/// * `mat` - A mutable view of the matrix to be orthonormalised.
///
/// # Returns
///
/// A `Result` indicating if the orthonormalisation has been successful. An
/// error is returned when the row overlap of `mat` has a non-positive
/// eigenvalue.
pub fn loewdin(mat: &mut ArrayViewMut2<C128>) -> Result<(), anyhow::Error> {
    let m = mat.view();
    let m_h = m.t().mapv(|x| x.conj());
    let omat = m.dot(&m_h);
    let smat = invsqrt_hermitian(&omat)?;
    let orthonormalised = smat.dot(&m);
    mat.assign(&orthonormalised);
    Ok(())
}
