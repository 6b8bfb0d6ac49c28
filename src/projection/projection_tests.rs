use std::str::FromStr;

use approx::assert_abs_diff_eq;
use ndarray::array;

use super::{parse_site_index, resolve_groups, ProjectorGroup, ProjectorTrait, Shell};
use crate::auxiliary::linalg::C128;

#[test]
fn test_projection_shell_quantum_numbers() {
    assert_eq!(Shell::S.l(), 0);
    assert_eq!(Shell::P.l(), 1);
    assert_eq!(Shell::D.l(), 2);
    assert_eq!(Shell::F.l(), 3);
    assert_eq!(Shell::Dt2g.l(), 2);
    assert_eq!(Shell::Deg.l(), 2);

    assert_eq!(Shell::S.ndim(), 1);
    assert_eq!(Shell::P.ndim(), 3);
    assert_eq!(Shell::D.ndim(), 5);
    assert_eq!(Shell::F.ndim(), 7);
    assert_eq!(Shell::Dt2g.ndim(), 3);
    assert_eq!(Shell::Deg.ndim(), 2);
}

#[test]
fn test_projection_shell_labels() {
    for label in ["s", "p", "d", "f", "d_t2g", "d_eg"] {
        let shell = Shell::from_str(label).unwrap();
        assert_eq!(shell.to_string(), label);
    }
    assert!(Shell::from_str("g").is_err());
    assert!(Shell::from_str("t2g").is_err());
}

#[test]
fn test_projection_shell_transformations() {
    // The t2g selector picks the (dxy, dyz, dxz) channels out of the raw
    // ordering (dxy, dyz, dz2, dxz, dx2-y2).
    let tmat = Shell::Dt2g.transformation();
    let raw = array![
        C128::new(1.0, 0.0),
        C128::new(2.0, 0.0),
        C128::new(3.0, 0.0),
        C128::new(4.0, 0.0),
        C128::new(5.0, 0.0)
    ];
    let reduced = tmat.dot(&raw);
    assert_abs_diff_eq!(reduced[0].re, 1.0, epsilon = 1e-14);
    assert_abs_diff_eq!(reduced[1].re, 2.0, epsilon = 1e-14);
    assert_abs_diff_eq!(reduced[2].re, 4.0, epsilon = 1e-14);

    // The eg selector picks the (dz2, dx2-y2) channels.
    let tmat = Shell::Deg.transformation();
    let reduced = tmat.dot(&raw);
    assert_abs_diff_eq!(reduced[0].re, 3.0, epsilon = 1e-14);
    assert_abs_diff_eq!(reduced[1].re, 5.0, epsilon = 1e-14);

    let tmat = Shell::P.transformation();
    assert_eq!(tmat.dim(), (3, 3));
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(tmat[[i, j]].re, expected, epsilon = 1e-14);
        }
    }
}

#[test]
fn test_projection_trait_from_label() {
    let pt = ProjectorTrait::new(1, "s").unwrap();
    assert_eq!((pt.l(), pt.m()), (0, 0));

    let pt = ProjectorTrait::new(1, "pz").unwrap();
    assert_eq!((pt.l(), pt.m()), (1, 1));

    let pt = ProjectorTrait::new(2, "dxy").unwrap();
    assert_eq!((pt.l(), pt.m()), (2, 0));
    assert_eq!(pt.site(), 2);
    assert_eq!(pt.desc(), "dxy");

    let pt = ProjectorTrait::new(1, "fz3").unwrap();
    assert_eq!((pt.l(), pt.m()), (3, 3));

    assert!(ProjectorTrait::new(0, "s").is_err());
    assert!(ProjectorTrait::new(1, "dz3").is_err());
}

#[test]
fn test_projection_group_invariants() {
    assert!(ProjectorGroup::new(1, 2, (0..5).collect()).is_ok());
    assert!(ProjectorGroup::new(1, 2, (0..4).collect()).is_err());
    assert!(ProjectorGroup::new(0, 1, (0..3).collect()).is_err());
    assert!(ProjectorGroup::new(1, 4, (0..9).collect()).is_err());
}

#[test]
fn test_projection_group_partition() {
    let labels_site1 = ["dxy", "dyz", "dz2", "dxz", "dx2-y2"];
    let labels_site2 = ["py", "pz", "px"];
    let traits = labels_site1
        .iter()
        .map(|desc| ProjectorTrait::new(1, desc).unwrap())
        .chain(
            labels_site2
                .iter()
                .map(|desc| ProjectorTrait::new(2, desc).unwrap()),
        )
        .collect::<Vec<_>>();
    let groups = ProjectorGroup::partition(&traits).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].site(), 1);
    assert_eq!(groups[0].l(), 2);
    assert_eq!(groups[0].projectors(), &[0, 1, 2, 3, 4]);
    assert_eq!(groups[1].site(), 2);
    assert_eq!(groups[1].l(), 1);
    assert_eq!(groups[1].projectors(), &[5, 6, 7]);
    assert!(groups.iter().all(|group| !group.corr()));
}

#[test]
fn test_projection_parse_site_index() {
    assert_eq!(parse_site_index("V : 1").unwrap(), 1);
    assert_eq!(parse_site_index("Fe : 2").unwrap(), 2);
    assert_eq!(parse_site_index("3").unwrap(), 3);
    assert!(parse_site_index("V").is_err());
    assert!(parse_site_index("V : 0").is_err());
}

#[test]
fn test_projection_resolve_groups() {
    let mut groups = vec![
        ProjectorGroup::new(1, 2, (0..5).collect()).unwrap(),
        ProjectorGroup::new(2, 1, (5..8).collect()).unwrap(),
    ];
    resolve_groups(
        &mut groups,
        &["V : 1".to_string()],
        &["d_t2g".to_string()],
        1,
    )
    .unwrap();

    assert!(groups[0].corr());
    assert_eq!(groups[0].shell(), Shell::Dt2g);
    assert_eq!(groups[0].ndim(), 3);
    assert_eq!(groups[0].transformation().dim(), (3, 5));

    assert!(!groups[1].corr());
    assert_eq!(groups[1].shell(), Shell::P);
    assert_eq!(groups[1].ndim(), 3);
}

#[test]
fn test_projection_resolve_groups_rejects_bad_configs() {
    let mut groups = vec![ProjectorGroup::new(1, 2, (0..5).collect()).unwrap()];
    assert!(resolve_groups(
        &mut groups,
        &["V : 1".to_string()],
        &["d".to_string()],
        2,
    )
    .is_err());
    assert!(resolve_groups(
        &mut groups,
        &["V : 1".to_string()],
        &["t2g".to_string()],
        1,
    )
    .is_err());
}
