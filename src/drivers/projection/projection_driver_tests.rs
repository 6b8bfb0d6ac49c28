use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array3, Array4};

use super::{ProjectionDriver, ProjectionParams, SmearingScheme};
use crate::auxiliary::linalg::C128;
use crate::drivers::PlodmftDriver;
use crate::projection::window::WindowBound;
use crate::projection::ProjectorGroup;
use crate::target::kohn_sham::KohnShamData;

fn trivial_kohn_sham(occupy: bool) -> KohnShamData {
    let mut builder = KohnShamData::builder();
    builder
        .enk(Array3::from_elem((1, 1, 1), 0.5))
        .chipsi(Array4::from_elem((1, 1, 1, 1), C128::new(1.0, 0.0)))
        .weight(Array1::from_elem(1, 1.0))
        .fermi(0.5);
    if occupy {
        builder.occupy(Some(Array3::from_elem((1, 1, 1), 1.0)));
    }
    builder.build().unwrap()
}

fn trivial_params() -> ProjectionParams {
    ProjectionParams::builder()
        .atoms(vec![])
        .shells(vec![])
        .nsite(0)
        .window(vec![WindowBound::Index(1), WindowBound::Index(1)])
        .build()
        .unwrap()
}

#[test]
fn test_projection_driver_trivial_run() {
    let params = trivial_params();
    let mut driver = ProjectionDriver::builder()
        .parameters(&params)
        .kohn_sham(trivial_kohn_sham(false))
        .groups(vec![ProjectorGroup::new(1, 0, vec![0]).unwrap()])
        .build()
        .unwrap();
    driver.run().unwrap();

    let result = driver.result().unwrap();
    assert_eq!(result.groups().len(), 1);
    assert_eq!(result.windows()[0].nbnd(), 1);
    let amplitude = result.projectors()[0][[0, 0, 0, 0]];
    assert_abs_diff_eq!(amplitude.re, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(amplitude.im, 0.0, epsilon = 1e-12);
    assert!(result.diagnostics().is_none());
}

#[test]
fn test_projection_driver_requires_groups() {
    let params = trivial_params();
    assert!(ProjectionDriver::builder()
        .parameters(&params)
        .kohn_sham(trivial_kohn_sham(false))
        .groups(vec![])
        .build()
        .is_err());
}

#[test]
fn test_projection_driver_diagnostics_require_occupations() {
    let params = ProjectionParams::builder()
        .atoms(vec![])
        .shells(vec![])
        .nsite(0)
        .window(vec![WindowBound::Index(1), WindowBound::Index(1)])
        .diagnostics(true)
        .build()
        .unwrap();
    assert!(ProjectionDriver::builder()
        .parameters(&params)
        .kohn_sham(trivial_kohn_sham(false))
        .groups(vec![ProjectorGroup::new(1, 0, vec![0]).unwrap()])
        .build()
        .is_err());
}

#[test]
fn test_projection_driver_tetra_smearing_requires_mesh() {
    let params = ProjectionParams::builder()
        .atoms(vec![])
        .shells(vec![])
        .nsite(0)
        .window(vec![WindowBound::Index(1), WindowBound::Index(1)])
        .smear(SmearingScheme::Tetra)
        .diagnostics(true)
        .build()
        .unwrap();
    assert!(ProjectionDriver::builder()
        .parameters(&params)
        .kohn_sham(trivial_kohn_sham(true))
        .groups(vec![ProjectorGroup::new(1, 0, vec![0]).unwrap()])
        .build()
        .is_err());
}

#[test]
fn test_projection_driver_result_unavailable_before_run() {
    let params = trivial_params();
    let driver = ProjectionDriver::builder()
        .parameters(&params)
        .kohn_sham(trivial_kohn_sham(false))
        .groups(vec![ProjectorGroup::new(1, 0, vec![0]).unwrap()])
        .build()
        .unwrap();
    assert!(driver.result().is_err());
}
