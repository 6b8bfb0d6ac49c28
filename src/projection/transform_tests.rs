use approx::assert_abs_diff_eq;
use ndarray::{Array3, Array4};

use super::{filter, rotate};
use crate::auxiliary::linalg::C128;
use crate::projection::window::{resolve_windows, WindowBound};
use crate::projection::{resolve_groups, ProjectorGroup};

#[test]
fn test_transform_identity_rotation() {
    // A full p shell keeps its identity transformation, so rotation is the
    // identity map on the raw amplitudes restricted to the group.
    let groups = vec![ProjectorGroup::new(1, 1, vec![1, 2, 3]).unwrap()];
    let mut chipsi = Array4::<C128>::zeros((5, 2, 2, 1));
    for p in 0..5 {
        for b in 0..2 {
            for k in 0..2 {
                chipsi[[p, b, k, 0]] =
                    C128::new((p + 1) as f64 + 0.1 * b as f64, 0.3 * k as f64);
            }
        }
    }
    let rotated = rotate(&groups, &chipsi).unwrap();
    assert_eq!(rotated.len(), 1);
    assert_eq!(rotated[0].dim(), (3, 2, 2, 1));
    for (q, p) in [(0, 1), (1, 2), (2, 3)] {
        for b in 0..2 {
            for k in 0..2 {
                let diff = rotated[0][[q, b, k, 0]] - chipsi[[p, b, k, 0]];
                assert_abs_diff_eq!(diff.norm(), 0.0, epsilon = 1e-14);
            }
        }
    }
}

#[test]
fn test_transform_t2g_rotation() {
    let mut groups = vec![ProjectorGroup::new(1, 2, (0..5).collect()).unwrap()];
    resolve_groups(
        &mut groups,
        &["V : 1".to_string()],
        &["d_t2g".to_string()],
        1,
    )
    .unwrap();

    let mut chipsi = Array4::<C128>::zeros((5, 3, 1, 1));
    for p in 0..5 {
        chipsi[[p, 0, 0, 0]] = C128::new((p + 1) as f64, 0.0);
    }
    let rotated = rotate(&groups, &chipsi).unwrap();
    assert_eq!(rotated[0].dim(), (3, 3, 1, 1));
    assert_abs_diff_eq!(rotated[0][[0, 0, 0, 0]].re, 1.0, epsilon = 1e-14);
    assert_abs_diff_eq!(rotated[0][[1, 0, 0, 0]].re, 2.0, epsilon = 1e-14);
    assert_abs_diff_eq!(rotated[0][[2, 0, 0, 0]].re, 4.0, epsilon = 1e-14);
}

#[test]
fn test_transform_rotation_requires_enough_bands() {
    let groups = vec![ProjectorGroup::new(1, 1, vec![0, 1, 2]).unwrap()];
    let chipsi = Array4::<C128>::zeros((3, 2, 1, 1));
    assert!(rotate(&groups, &chipsi).is_err());
}

#[test]
fn test_transform_filter_places_windowed_bands() {
    // A k-dependent energy window: the usable slice starts at different
    // bands for the two k-points and the padding stays zero.
    let enk = Array3::from_shape_vec(
        (3, 2, 1),
        vec![-1.5, -0.2, -0.4, 0.3, 0.8, 2.5],
    )
    .unwrap();
    let windows = resolve_windows(
        &[WindowBound::Energy(-0.5), WindowBound::Energy(1.0)],
        1,
        &enk,
    )
    .unwrap();

    let mut rotated = Array4::<C128>::zeros((1, 3, 2, 1));
    for b in 0..3 {
        for k in 0..2 {
            rotated[[0, b, k, 0]] = C128::new(10.0 * (b + 1) as f64 + k as f64, 0.0);
        }
    }
    let filtered = filter(&[rotated.clone()], &windows).unwrap();
    let fchipsi = &filtered[0];
    assert_eq!(fchipsi.dim(), (1, 3, 2, 1));

    // k = 0 window is bands 1..=2.
    assert_abs_diff_eq!(fchipsi[[0, 0, 0, 0]].re, 20.0, epsilon = 1e-14);
    assert_abs_diff_eq!(fchipsi[[0, 1, 0, 0]].re, 30.0, epsilon = 1e-14);
    assert_abs_diff_eq!(fchipsi[[0, 2, 0, 0]].norm(), 0.0, epsilon = 1e-14);

    // k = 1 window is bands 0..=1.
    assert_abs_diff_eq!(fchipsi[[0, 0, 1, 0]].re, 11.0, epsilon = 1e-14);
    assert_abs_diff_eq!(fchipsi[[0, 1, 1, 0]].re, 21.0, epsilon = 1e-14);
    assert_abs_diff_eq!(fchipsi[[0, 2, 1, 0]].norm(), 0.0, epsilon = 1e-14);
}
