use std::rc::Rc;

use crate::foundation::core::PixelRect;
use crate::render::composite::{blt, blt_all};
use crate::surface::{Surface, SurfaceHandle};

/// Link between a displayable object and its backing surface.
///
/// The first time the binding observes the surface ready it commits the surface's deferred
/// pixels, whether or not anything is composited that frame.
#[derive(Debug, Default)]
pub struct BitmapBinding {
    bitmap: Option<SurfaceHandle>,
    loaded: bool,
}

impl BitmapBinding {
    pub fn new(bitmap: Option<SurfaceHandle>) -> Self {
        let mut b = Self {
            bitmap: None,
            loaded: false,
        };
        b.set(bitmap);
        b
    }

    /// Replace the backing surface. An already-ready surface is observed immediately.
    pub fn set(&mut self, bitmap: Option<SurfaceHandle>) {
        self.bitmap = bitmap;
        self.loaded = false;
        self.observe();
    }

    pub fn bitmap(&self) -> Option<&SurfaceHandle> {
        self.bitmap.as_ref()
    }

    /// `true` once readiness has been observed for the current surface.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Check the backing surface; returns `true` only on the call that first sees it ready.
    pub fn observe(&mut self) -> bool {
        if self.loaded {
            return false;
        }
        let Some(bitmap) = &self.bitmap else {
            return false;
        };
        if !bitmap.is_ready() {
            return false;
        }
        bitmap.commit_if_needed();
        self.loaded = true;
        true
    }
}

/// A positioned image, optionally showing only a sub-rectangle of its bitmap.
#[derive(Debug)]
pub struct Sprite {
    binding: BitmapBinding,
    frame: Option<PixelRect>,
    x: i64,
    y: i64,
    visible: bool,
}

impl Sprite {
    pub fn new(bitmap: Option<SurfaceHandle>) -> Self {
        Self {
            binding: BitmapBinding::new(bitmap),
            frame: None,
            x: 0,
            y: 0,
            visible: true,
        }
    }

    pub fn set_bitmap(&mut self, bitmap: Option<SurfaceHandle>) {
        self.binding.set(bitmap);
    }

    pub fn bitmap(&self) -> Option<&SurfaceHandle> {
        self.binding.bitmap()
    }

    pub fn is_loaded(&self) -> bool {
        self.binding.is_loaded()
    }

    /// Show only `frame` of the bitmap. `None` shows the whole bitmap.
    pub fn set_frame(&mut self, frame: Option<PixelRect>) {
        self.frame = frame;
    }

    pub fn move_to(&mut self, x: i64, y: i64) {
        self.x = x;
        self.y = y;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Per-frame update. Returns `true` on the frame the bitmap is first seen ready.
    pub fn update(&mut self) -> bool {
        self.binding.observe()
    }

    /// Draw onto `target`. Returns `true` when pixels were drawn.
    pub fn render_onto(&self, target: &Surface) -> bool {
        if !self.visible || !self.binding.is_loaded() {
            return false;
        }
        let Some(bitmap) = self.binding.bitmap() else {
            return false;
        };
        match self.frame {
            Some(frame) => blt(target, bitmap, frame, self.x, self.y),
            None => blt_all(target, bitmap, self.x, self.y),
        }
    }
}

/// A rectangle filled by repeating its bitmap, scrolled by `origin`.
#[derive(Debug)]
pub struct TilingSprite {
    binding: BitmapBinding,
    width: u32,
    height: u32,
    origin: (i64, i64),
    x: i64,
    y: i64,
}

impl TilingSprite {
    pub fn new(bitmap: Option<SurfaceHandle>, width: u32, height: u32) -> Self {
        Self {
            binding: BitmapBinding::new(bitmap),
            width,
            height,
            origin: (0, 0),
            x: 0,
            y: 0,
        }
    }

    pub fn set_bitmap(&mut self, bitmap: Option<SurfaceHandle>) {
        self.binding.set(bitmap);
    }

    pub fn is_loaded(&self) -> bool {
        self.binding.is_loaded()
    }

    /// Scroll offset of the tiled pattern.
    pub fn set_origin(&mut self, ox: i64, oy: i64) {
        self.origin = (ox, oy);
    }

    pub fn move_to(&mut self, x: i64, y: i64) {
        self.x = x;
        self.y = y;
    }

    /// Per-frame update. Returns `true` on the frame the bitmap is first seen ready.
    pub fn update(&mut self) -> bool {
        self.binding.observe()
    }

    /// Tile the bitmap over this sprite's rectangle on `target`.
    pub fn render_onto(&self, target: &Surface) -> bool {
        if !self.binding.is_loaded() || self.width == 0 || self.height == 0 {
            return false;
        }
        let Some(bitmap) = self.binding.bitmap() else {
            return false;
        };
        let (bw, bh) = (i64::from(bitmap.width()), i64::from(bitmap.height()));
        if bw == 0 || bh == 0 {
            return false;
        }

        let area: Rc<Surface> = Surface::blank("tiling", self.width, self.height);
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let mut ty = -self.origin.1.rem_euclid(bh);
        while ty < h {
            let mut tx = -self.origin.0.rem_euclid(bw);
            while tx < w {
                blt_all(&area, bitmap, tx, ty);
                tx += bw;
            }
            ty += bh;
        }
        blt_all(target, &area, self.x, self.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sprite.rs"]
mod tests;
