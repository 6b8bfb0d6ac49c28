use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use super::{invsqrt_hermitian, loewdin, C128};

#[test]
fn test_linalg_invsqrt_hermitian_diagonal() {
    let omat = Array2::from_diag(&array![
        C128::new(4.0, 0.0),
        C128::new(9.0, 0.0),
        C128::new(0.25, 0.0)
    ]);
    let smat = invsqrt_hermitian(&omat).unwrap();
    assert_abs_diff_eq!(smat[[0, 0]].re, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(smat[[1, 1]].re, 1.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(smat[[2, 2]].re, 2.0, epsilon = 1e-12);
    for (i, j) in [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)] {
        assert_abs_diff_eq!(smat[[i, j]].norm(), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_linalg_invsqrt_hermitian_rejects_singular() {
    let omat = array![
        [C128::new(1.0, 0.0), C128::new(1.0, 0.0)],
        [C128::new(1.0, 0.0), C128::new(1.0, 0.0)]
    ];
    assert!(invsqrt_hermitian(&omat).is_err());
}

#[test]
fn test_linalg_loewdin_rows_orthonormal() {
    let mut mat = array![
        [C128::new(1.0, 0.0), C128::new(0.5, 0.2), C128::new(0.0, 0.0)],
        [C128::new(0.1, -0.3), C128::new(1.0, 0.0), C128::new(0.4, 0.0)]
    ];
    loewdin(&mut mat.view_mut()).unwrap();
    let m_h = mat.t().mapv(|x| x.conj());
    let ovlp = mat.dot(&m_h);
    for i in 0..2 {
        for j in 0..2 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(ovlp[[i, j]].re, expected, epsilon = 1e-10);
            assert_abs_diff_eq!(ovlp[[i, j]].im, 0.0, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_linalg_loewdin_preserves_orthonormal_rows() {
    let mut mat = array![
        [C128::new(1.0, 0.0), C128::new(0.0, 0.0), C128::new(0.0, 0.0)],
        [C128::new(0.0, 0.0), C128::new(0.0, 1.0), C128::new(0.0, 0.0)]
    ];
    let reference = mat.clone();
    loewdin(&mut mat.view_mut()).unwrap();
    for (a, b) in mat.iter().zip(reference.iter()) {
        assert_abs_diff_eq!((a - b).norm(), 0.0, epsilon = 1e-12);
    }
}
