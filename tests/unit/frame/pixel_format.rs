use super::*;

#[test]
fn packed_formats_have_one_plane_of_four_bytes_per_pixel() {
    for src in [
        SourcePixelFormat::Bgra,
        SourcePixelFormat::Argb,
        SourcePixelFormat::Rgba,
        SourcePixelFormat::Abgr,
    ] {
        let d = PixelFormatDesc::for_source(src, 1920, 1080);
        assert!(d.format.is_packed());
        assert_eq!(d.planes.len(), 1);
        assert!(d.planes[0].linesize >= 4 * 1920);
        assert_eq!(d.planes[0].height, 1080);
        assert_eq!(d.planes[0].depth, 4);
    }
}

#[test]
fn yuv420_chroma_is_half_in_both_directions() {
    let d = PixelFormatDesc::for_source(SourcePixelFormat::Yuv420p, 1920, 1080);
    assert_eq!(d.format, PixelFormat::Ycbcr);
    assert_eq!(d.planes.len(), 3);
    assert_eq!(d.planes[0], Plane::new(1920, 1080, 1));
    assert_eq!(d.planes[1], Plane::new(960, 540, 1));
    assert_eq!(d.planes[2], d.planes[1]);
}

#[test]
fn odd_dimensions_round_chroma_up() {
    let d = PixelFormatDesc::for_source(SourcePixelFormat::Yuv420p, 7, 5);
    assert_eq!((d.planes[1].width, d.planes[1].height), (4, 3));
    let d = PixelFormatDesc::for_source(SourcePixelFormat::Yuv410p, 7, 5);
    assert_eq!((d.planes[1].width, d.planes[1].height), (2, 2));
}

#[test]
fn chroma_never_taller_than_luma() {
    for src in [
        SourcePixelFormat::Yuv444p,
        SourcePixelFormat::Yuv422p,
        SourcePixelFormat::Yuv420p,
        SourcePixelFormat::Yuv411p,
        SourcePixelFormat::Yuv410p,
        SourcePixelFormat::Yuva420p,
    ] {
        for (w, h) in [(720, 576), (1, 1), (33, 17)] {
            let d = PixelFormatDesc::for_source(src, w, h);
            assert!(d.planes[1].height <= d.planes[0].height, "{src:?} {w}x{h}");
            assert!(d.planes[2].height <= d.planes[0].height, "{src:?} {w}x{h}");
        }
    }
}

#[test]
fn yuva_adds_full_resolution_alpha_plane() {
    let d = PixelFormatDesc::for_source(SourcePixelFormat::Yuva420p, 64, 32);
    assert_eq!(d.format, PixelFormat::Ycbcra);
    assert_eq!(d.planes.len(), 4);
    assert_eq!(d.planes[3], d.planes[0]);
}

#[test]
fn unsupported_formats_map_to_invalid_without_planes() {
    for src in [
        SourcePixelFormat::Nv12,
        SourcePixelFormat::Yuyv422,
        SourcePixelFormat::Rgb24,
        SourcePixelFormat::Gray8,
    ] {
        let d = PixelFormatDesc::for_source(src, 16, 16);
        assert_eq!(d.format, PixelFormat::Invalid);
        assert!(d.planes.is_empty());
    }
}

#[test]
fn native_planes_match_descriptor_for_consumable_formats() {
    let d = PixelFormatDesc::for_source(SourcePixelFormat::Yuv422p, 10, 4);
    let native = SourcePixelFormat::Yuv422p.native_planes(10, 4);
    assert_eq!(native.len(), d.planes.len());
    for (p, (bytes, rows)) in d.planes.iter().zip(native.iter()) {
        assert_eq!(p.linesize, *bytes);
        assert_eq!(p.height, *rows);
    }
}

#[test]
fn names_parse() {
    assert_eq!(
        SourcePixelFormat::from_name("yuv420p"),
        Some(SourcePixelFormat::Yuv420p)
    );
    assert_eq!(SourcePixelFormat::from_name("p010le"), None);
}
