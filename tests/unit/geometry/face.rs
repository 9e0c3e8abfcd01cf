use super::*;

#[test]
fn faces_resolve_by_index_letter_and_name() {
    for (i, face) in Face::ALL.into_iter().enumerate() {
        assert_eq!(face.index(), i);
        assert_eq!(Face::from_index(i), Some(face));
        assert_eq!(Face::from_name(&i.to_string()), Some(face));
        assert_eq!(Face::from_name(face.letter()), Some(face));
        assert_eq!(Face::from_name(face.name()), Some(face));
    }
    assert_eq!("u".parse::<Face>().unwrap(), Face::Top);
    assert_eq!("front".parse::<Face>().unwrap(), Face::Front);
    assert_eq!(Face::from_index(6), None);
}

#[test]
fn invalid_face_name_lists_choices() {
    let err = "sideways".parse::<Face>().unwrap_err().to_string();
    assert!(err.contains("invalid face name \"sideways\""));
    assert!(err.contains("b, l, f, r, u, d, back, left, front, right, top, bottom"));
}

#[test]
fn face_centres_point_along_the_invariant_axis() {
    let expected = [
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ];
    for face in Face::ALL {
        let d = face.direction(0.0, 0.0);
        for (c, e) in d.iter().zip(expected[face.index()]) {
            assert_eq!(*c, e, "{face}");
        }
    }
}

#[test]
fn image_top_is_up_on_side_faces() {
    for face in [Face::Back, Face::Left, Face::Front, Face::Right] {
        assert_eq!(face.direction(0.0, -1.0)[2], 1.0, "{face}");
    }
}

#[test]
fn reflection_rules_match_mirrored_directions() {
    for face in Face::ALL {
        for &(a, b) in &[(0.3f32, 0.2f32), (0.9, -0.7), (0.05, 0.5)] {
            let d = face.direction(-a, b);
            let m = face.direction(a, b);
            let theta = d[1].atan2(d[0]);
            let mirrored = m[1].atan2(m[0]);
            let reflected = face.axes().reflect.apply(theta);
            assert!((reflected - mirrored).abs() < 1e-5, "{face} {a} {b}");
        }
    }
}

#[test]
fn side_crop_windows_tile_the_equator() {
    let mut edges: Vec<(f64, f64)> = [Face::Left, Face::Front, Face::Right, Face::Back]
        .into_iter()
        .map(|f| (f.crop_rect().left, f.crop_rect().right))
        .collect();
    edges.sort_by(|x, y| x.0.total_cmp(&y.0));
    assert_eq!(edges[0], (1. / 8., 3. / 8.));
    assert_eq!(edges[3], (7. / 8., 1. / 8.));
}
