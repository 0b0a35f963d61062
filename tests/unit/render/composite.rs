use image::{Rgba, RgbaImage};

use super::*;
use crate::surface::Surface;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[test]
fn blt_commits_source_once_then_copies() {
    let src = Surface::decoded("pictures/p", RgbaImage::from_pixel(2, 2, RED));
    let a = Surface::blank("a", 4, 4);
    let b = Surface::blank("b", 4, 4);

    assert!(blt(&a, &src, PixelRect::from_size(2, 2), 1, 1));
    assert!(blt(&b, &src, PixelRect::from_size(2, 2), 0, 0));
    assert_eq!(src.commit_count(), 1);
    assert_eq!(a.pixel(1, 1), Some(RED));
    assert_eq!(a.pixel(0, 0), Some(CLEAR));
    assert_eq!(b.pixel(1, 1), Some(RED));
}

#[test]
fn loading_source_draws_nothing_until_ready() {
    let src = Surface::loading("pictures/p");
    let dst = Surface::blank("dst", 2, 2);
    assert!(!blt_all(&dst, &src, 0, 0));
    assert_eq!(src.commit_count(), 0);
    assert!(!src.is_drawn());

    src.complete_load(RgbaImage::from_pixel(1, 1, RED));
    assert!(!src.is_drawn());
    assert!(blt_all(&dst, &src, 0, 0));
    assert_eq!(src.commit_count(), 1);
    assert_eq!(dst.pixel(0, 0), Some(RED));
}

#[test]
fn source_rect_is_clipped_and_destination_shifted() {
    let mut img = RgbaImage::from_pixel(2, 2, CLEAR);
    img.put_pixel(0, 0, RED);
    let src = Surface::decoded("s", img);
    let dst = Surface::blank("d", 4, 4);

    // Rect starts one pixel left/up of the source; the visible part lands at (2, 2).
    assert!(blt(&dst, &src, PixelRect::new(-1, -1, 3, 3), 1, 1));
    assert_eq!(dst.pixel(2, 2), Some(RED));
    assert_eq!(dst.pixel(1, 1), Some(CLEAR));
}

#[test]
fn offscreen_destination_draws_nothing() {
    let src = Surface::decoded("s", RgbaImage::from_pixel(2, 2, RED));
    let dst = Surface::blank("d", 2, 2);
    assert!(!blt_all(&dst, &src, 5, 5));
    // The source was still committed by the attempt.
    assert!(src.is_drawn());
}

#[test]
fn self_blit_is_allowed() {
    let s = Surface::decoded("s", RgbaImage::from_pixel(2, 1, CLEAR));
    s.commit_if_needed();
    s.fill_rect(PixelRect::new(0, 0, 1, 1), RED);
    assert!(blt(&s, &s, PixelRect::new(0, 0, 1, 1), 1, 0));
    assert_eq!(s.pixel(1, 0), Some(RED));
}

#[test]
fn pending_destination_is_committed_before_drawing() {
    let red = Surface::decoded("red", RgbaImage::from_pixel(1, 1, RED));
    let dst = Surface::decoded("dst", RgbaImage::from_pixel(2, 2, CLEAR));

    assert!(blt_all(&dst, &red, 0, 0));
    assert!(dst.is_drawn());
    assert_eq!(dst.pixel(0, 0), Some(RED));

    // Using dst as a source afterwards must not re-commit over the earlier draw.
    let other = Surface::blank("other", 2, 2);
    assert!(blt_all(&other, &dst, 0, 0));
    assert_eq!(dst.pixel(0, 0), Some(RED));
    assert_eq!(other.pixel(0, 0), Some(RED));
    assert_eq!(dst.commit_count(), 1);
}

#[test]
fn fill_on_pending_surface_survives_commit() {
    let mut img = RgbaImage::from_pixel(2, 1, CLEAR);
    img.put_pixel(1, 0, RED);
    let s = Surface::decoded("s", img);
    s.fill_rect(PixelRect::new(0, 0, 1, 1), Rgba([0, 0, 255, 255]));
    assert!(s.is_drawn());
    assert!(!s.commit_if_needed());
    assert_eq!(s.pixel(0, 0), Some(Rgba([0, 0, 255, 255])));
    assert_eq!(s.pixel(1, 0), Some(RED));
}

#[test]
fn extreme_destination_offsets_do_not_overflow() {
    let src = Surface::decoded("s", RgbaImage::from_pixel(2, 2, RED));
    let dst = Surface::blank("d", 2, 2);
    assert!(!blt(&dst, &src, PixelRect::new(1, 0, 1, 1), i64::MIN, 0));
    assert!(!blt(&dst, &src, PixelRect::new(-1, -1, 2, 2), i64::MAX, i64::MAX));
    assert!(!blt(&dst, &src, PixelRect::new(1, 1, 1, 1), 0, i64::MIN));
}
