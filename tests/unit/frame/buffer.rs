use super::*;
use crate::frame::pixel_format::{Plane, SourcePixelFormat};

fn raw(format: PixelFormat, planes: Vec<Plane>) -> PixelBuffer {
    let data = planes.iter().map(|p| vec![0u8; p.size()]).collect();
    PixelBuffer::from_planes(
        PixelFormatDesc {
            format,
            planes: planes.into(),
        },
        data,
    )
    .unwrap()
}

#[test]
fn derived_layouts_pass_geometry_check() {
    for src in [
        SourcePixelFormat::Bgra,
        SourcePixelFormat::Abgr,
        SourcePixelFormat::Yuv444p,
        SourcePixelFormat::Yuv420p,
        SourcePixelFormat::Yuv410p,
        SourcePixelFormat::Yuva420p,
    ] {
        for (w, h) in [(1, 1), (7, 3), (64, 36)] {
            let buf = PixelBuffer::new(PixelFormatDesc::for_source(src, w, h));
            assert!(buf.check_geometry().is_ok(), "{src:?} {w}x{h}");
        }
    }
}

#[test]
fn packed_plane_with_narrow_elements_is_rejected() {
    let buf = raw(PixelFormat::Bgra, vec![Plane::new(4, 1, 1)]);
    assert!(matches!(
        buf.check_geometry(),
        Err(PlayoutError::Validation(_))
    ));
}

#[test]
fn short_linesize_is_rejected() {
    let plane = Plane {
        linesize: 8,
        width: 4,
        height: 2,
        depth: 4,
    };
    assert!(raw(PixelFormat::Rgba, vec![plane]).check_geometry().is_err());
}

#[test]
fn small_alpha_plane_is_rejected() {
    let buf = raw(
        PixelFormat::Ycbcra,
        vec![
            Plane::new(4, 4, 1),
            Plane::new(2, 2, 1),
            Plane::new(2, 2, 1),
            Plane::new(2, 2, 1),
        ],
    );
    assert!(buf.check_geometry().is_err());
}

#[test]
fn mismatched_chroma_planes_are_rejected() {
    let buf = raw(
        PixelFormat::Ycbcr,
        vec![Plane::new(4, 4, 1), Plane::new(2, 2, 1), Plane::new(1, 2, 1)],
    );
    assert!(buf.check_geometry().is_err());

    let oversized = raw(
        PixelFormat::Ycbcr,
        vec![Plane::new(4, 4, 1), Plane::new(8, 4, 1), Plane::new(8, 4, 1)],
    );
    assert!(oversized.check_geometry().is_err());
}

#[test]
fn truncated_storage_is_rejected() {
    let mut buf = PixelBuffer::new(PixelFormatDesc::bgra(2, 2));
    buf.planes_mut()[0].truncate(10);
    assert!(buf.check_geometry().is_err());
}

#[test]
fn unconverted_format_is_a_composition_error() {
    let buf = PixelBuffer::new(PixelFormatDesc::for_source(SourcePixelFormat::Nv12, 2, 2));
    assert!(matches!(
        buf.check_geometry(),
        Err(PlayoutError::Composition(_))
    ));
}
