use super::*;

#[test]
fn registry_defaults_to_normal() {
    let mut r = BlendModeRegistry::new();
    assert_eq!(r.get(10), BlendMode::Normal);
    r.set(10, BlendMode::Screen);
    assert_eq!(r.get(10), BlendMode::Screen);
    r.set(10, BlendMode::Multiply);
    assert_eq!(r.get(10), BlendMode::Multiply);
    assert_eq!(r.get(-3), BlendMode::Normal);
    r.clear();
    assert_eq!(r.get(10), BlendMode::Normal);
}

#[test]
fn registry_entries_are_sorted() {
    let mut r = BlendModeRegistry::new();
    r.set(20, BlendMode::Add);
    r.set(-1, BlendMode::Darken);
    r.set(5, BlendMode::Lighten);
    let keys: Vec<i32> = r.entries().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![-1, 5, 20]);
    assert!(r.iter().any(|e| e == (5, BlendMode::Lighten)));
    assert_eq!(r.iter().count(), 3);
}

#[test]
fn names_roundtrip_through_from_str() {
    for m in BlendMode::ALL {
        assert_eq!(m.as_str().parse::<BlendMode>().unwrap(), m);
    }
    assert_eq!("Color-Dodge".parse::<BlendMode>().unwrap(), BlendMode::ColorDodge);
    assert!("vivid_light".parse::<BlendMode>().is_err());
}

#[test]
fn over_opaque_source_replaces_destination() {
    assert_eq!(over([1, 2, 3, 255], [9, 8, 7, 255], 1.0), [9, 8, 7, 255]);
    assert_eq!(over([1, 2, 3, 255], [9, 8, 7, 255], 0.0), [1, 2, 3, 255]);
}

#[test]
fn over_transparent_destination_takes_source() {
    let src = [100, 110, 120, 200];
    assert_eq!(over([0, 0, 0, 0], src, 1.0), src);
}

#[test]
fn multiply_with_white_keeps_destination() {
    let dst = [40, 80, 120, 255];
    let out = composite_pixel(BlendMode::Multiply, dst, [255, 255, 255, 255], 1.0);
    assert_eq!(out, dst);
}

#[test]
fn screen_with_black_keeps_destination() {
    let dst = [40, 80, 120, 255];
    let out = composite_pixel(BlendMode::Screen, dst, [0, 0, 0, 255], 1.0);
    assert_eq!(out, dst);
}

#[test]
fn add_saturates() {
    let out = composite_pixel(BlendMode::Add, [200, 10, 0, 255], [100, 10, 0, 255], 1.0);
    assert_eq!(out, [255, 20, 0, 255]);
}

#[test]
fn difference_of_equal_colours_is_black() {
    let px = [90, 60, 30, 255];
    assert_eq!(
        composite_pixel(BlendMode::Difference, px, px, 1.0),
        [0, 0, 0, 255]
    );
}

#[test]
fn blend_over_empty_destination_is_plain_over() {
    let src = [10, 20, 30, 255];
    for m in BlendMode::ALL {
        assert_eq!(composite_pixel(m, [0, 0, 0, 0], src, 1.0), src, "{m}");
    }
}

#[test]
fn channel_blend_stays_in_unit_range() {
    let samples = [0.0f32, 0.1, 0.5, 0.9, 1.0];
    for m in BlendMode::ALL {
        for &d in &samples {
            for &s in &samples {
                let v = m.blend_channel(d, s);
                assert!((0.0..=1.0).contains(&v), "{m} d={d} s={s} -> {v}");
            }
        }
    }
}
