use super::*;
use crate::frame::pixel_format::PixelFormatDesc;

fn run(pic: &RawPicture) -> PixelBuffer {
    let mut sws = SoftwareScaler::new(pic.format, pic.width, pic.height).unwrap();
    let mut out = PixelBuffer::new(PixelFormatDesc::bgra(pic.width, pic.height));
    sws.convert(pic, &mut out).unwrap();
    out
}

fn px(buf: &PixelBuffer, x: usize, y: usize) -> [u8; 4] {
    let (w, _) = buf.dimensions();
    let p = buf.plane(0).unwrap();
    let i = (y * w + x) * 4;
    [p[i], p[i + 1], p[i + 2], p[i + 3]]
}

#[test]
fn rgb24_and_bgr24_swap_channels() {
    let mut pic = RawPicture::blank(SourcePixelFormat::Rgb24, 2, 1);
    pic.planes[0].copy_from_slice(&[30, 20, 10, 1, 2, 3]);
    let out = run(&pic);
    assert_eq!(px(&out, 0, 0), [10, 20, 30, 255]);
    assert_eq!(px(&out, 1, 0), [3, 2, 1, 255]);

    let mut pic = RawPicture::blank(SourcePixelFormat::Bgr24, 1, 1);
    pic.planes[0].copy_from_slice(&[10, 20, 30]);
    assert_eq!(px(&run(&pic), 0, 0), [10, 20, 30, 255]);
}

#[test]
fn gray_is_full_range() {
    let mut pic = RawPicture::blank(SourcePixelFormat::Gray8, 2, 2);
    pic.planes[0].copy_from_slice(&[0, 64, 128, 255]);
    let out = run(&pic);
    assert_eq!(px(&out, 1, 0), [64, 64, 64, 255]);
    assert_eq!(px(&out, 1, 1), [255, 255, 255, 255]);
}

#[test]
fn nv12_black_and_white() {
    let mut pic = RawPicture::blank(SourcePixelFormat::Nv12, 4, 2);
    pic.planes[0].copy_from_slice(&[16, 16, 235, 235, 16, 16, 235, 235]);
    pic.planes[1].fill(128);
    let out = run(&pic);
    assert_eq!(px(&out, 0, 0), [0, 0, 0, 255]);
    assert_eq!(px(&out, 3, 1), [255, 255, 255, 255]);
}

#[test]
fn yuyv_pairs_share_chroma() {
    let mut pic = RawPicture::blank(SourcePixelFormat::Yuyv422, 2, 1);
    pic.planes[0].copy_from_slice(&[16, 128, 235, 128]);
    let out = run(&pic);
    assert_eq!(px(&out, 0, 0), [0, 0, 0, 255]);
    assert_eq!(px(&out, 1, 0), [255, 255, 255, 255]);
}

#[test]
fn padded_line_sizes_are_honoured() {
    let mut pic = RawPicture::blank(SourcePixelFormat::Gray8, 2, 2);
    pic.linesizes = vec![8];
    pic.planes = vec![vec![0, 0, 9, 9, 9, 9, 9, 9, 50, 50]];
    let out = run(&pic);
    assert_eq!(px(&out, 0, 1), [50, 50, 50, 255]);
}

#[test]
fn mismatched_input_is_rejected() {
    let mut sws = SoftwareScaler::new(SourcePixelFormat::Nv12, 4, 4).unwrap();
    let pic = RawPicture::blank(SourcePixelFormat::Gray8, 4, 4);
    let mut out = PixelBuffer::new(PixelFormatDesc::bgra(4, 4));
    assert!(sws.convert(&pic, &mut out).is_err());

    let mut short = RawPicture::blank(SourcePixelFormat::Nv12, 4, 4);
    short.planes[1].truncate(3);
    assert!(matches!(
        sws.convert(&short, &mut out),
        Err(PlayoutError::Validation(_))
    ));

    assert!(SoftwareScaler::new(SourcePixelFormat::Nv12, 0, 4).is_err());
}
