use crate::foundation::core::PixelRect;
use crate::surface::Surface;

/// Alpha-blend `src_rect` of `src` onto `dst` with its top-left at `(dx, dy)`.
///
/// Commits `src` and `dst` first if their decoded pixels are still pending, so a later commit
/// never overwrites what was drawn here. Sources that are not ready draw nothing. The source
/// rectangle is clipped to `src`; the clipped-away margin shifts the destination accordingly. `dst` and `src` may be the same surface.
///
/// Returns `true` when any pixels were drawn.
pub fn blt(dst: &Surface, src: &Surface, src_rect: PixelRect, dx: i64, dy: i64) -> bool {
    src.commit_if_needed();
    if !src.is_ready() {
        return false;
    }
    dst.commit_if_needed();
    // The source borrow ends before the destination is mutated.
    let Some((clip, region)) = src.copy_region(src_rect) else {
        return false;
    };
    let x = dx.saturating_add(clip.x.saturating_sub(src_rect.x));
    let y = dy.saturating_add(clip.y.saturating_sub(src_rect.y));
    let placed = clip.translate(x.saturating_sub(clip.x), y.saturating_sub(clip.y));
    if placed.intersect(dst.bounds()).is_empty() {
        return false;
    }
    dst.overlay(&region, x, y);
    true
}

/// Draw the whole of `src` onto `dst` at `(dx, dy)`.
pub fn blt_all(dst: &Surface, src: &Surface, dx: i64, dy: i64) -> bool {
    blt(dst, src, src.bounds(), dx, dy)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
