use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array3, Array4};

use super::{KohnShamData, TetrahedronMesh};
use crate::auxiliary::linalg::C128;

fn two_band_data() -> KohnShamData {
    let enk = Array3::from_shape_vec((2, 2, 1), vec![-1.0, -0.8, 1.0, 1.2]).unwrap();
    let chipsi = Array4::from_elem((1, 2, 2, 1), C128::new(0.5, 0.0));
    let weight = Array1::from_elem(2, 0.5);
    KohnShamData::builder()
        .enk(enk)
        .chipsi(chipsi)
        .weight(weight)
        .fermi(0.1)
        .build()
        .unwrap()
}

#[test]
fn test_kohn_sham_builder_accepts_consistent_shapes() {
    let data = two_band_data();
    assert_eq!(data.nband(), 2);
    assert_eq!(data.nkpt(), 2);
    assert_eq!(data.nspin(), 1);
    assert_eq!(data.nproj(), 1);
}

#[test]
fn test_kohn_sham_builder_rejects_shape_mismatch() {
    let enk = Array3::<f64>::zeros((2, 2, 1));
    let chipsi = Array4::from_elem((1, 3, 2, 1), C128::new(0.0, 0.0));
    let weight = Array1::from_elem(2, 0.5);
    assert!(KohnShamData::builder()
        .enk(enk)
        .chipsi(chipsi)
        .weight(weight)
        .fermi(0.0)
        .build()
        .is_err());
}

#[test]
fn test_kohn_sham_builder_rejects_unnormalised_weights() {
    let enk = Array3::<f64>::zeros((2, 2, 1));
    let chipsi = Array4::from_elem((1, 2, 2, 1), C128::new(0.0, 0.0));
    let weight = Array1::from_elem(2, 0.7);
    assert!(KohnShamData::builder()
        .enk(enk)
        .chipsi(chipsi)
        .weight(weight)
        .fermi(0.0)
        .build()
        .is_err());
}

#[test]
fn test_kohn_sham_fermi_calibration() {
    let mut data = two_band_data();
    data.calibrate_fermi();
    assert_abs_diff_eq!(data.enk()[[0, 0, 0]], -1.1, epsilon = 1e-14);
    assert_abs_diff_eq!(data.enk()[[1, 1, 0]], 1.1, epsilon = 1e-14);
    assert_abs_diff_eq!(data.fermi(), 0.0, epsilon = 1e-14);
}

#[test]
fn test_kohn_sham_fermi_calibration_idempotent_on_zero() {
    let mut data = two_band_data();
    data.calibrate_fermi();
    let reference = data.enk().clone();
    data.calibrate_fermi();
    for (a, b) in data.enk().iter().zip(reference.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 0.0);
    }
}

#[test]
fn test_tetrahedron_mesh_validation() {
    let itet = array![[1_i64, 0, 0, 1, 1], [2, 0, 1, 1, 0]];
    let mesh = TetrahedronMesh::new(itet, 0.25).unwrap();
    assert_eq!(mesh.ntet(), 2);
    assert_abs_diff_eq!(mesh.total_weight(), 0.75, epsilon = 1e-14);

    let bad = array![[0_i64, 0, 0, 1, 1]];
    assert!(TetrahedronMesh::new(bad, 0.25).is_err());
}
