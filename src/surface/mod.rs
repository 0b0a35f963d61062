//! Fetched visual surfaces: load state, completion listeners and deferred first commit.

pub(crate) mod cache;
pub(crate) mod decode;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::foundation::core::PixelRect;

/// Shared handle to a cache-owned surface.
pub type SurfaceHandle = Rc<Surface>;

type CompletionListener = Box<dyn FnOnce()>;

/// Load status of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// Decode in flight.
    Loading,
    /// Decoded pixels available.
    Ready,
    /// Fetch or decode failed. Settled, never committed.
    Failed,
}

/// A fetched image surface.
///
/// Decode completion and visual commit are separate steps: [`Surface::complete_load`] stores
/// the decoded pixels and leaves the canvas blank; the first composite that sources this
/// surface calls [`Surface::commit_if_needed`], which copies the pixels into the canvas exactly
/// once.
pub struct Surface {
    label: String,
    state: Cell<LoadState>,
    drawn: Cell<bool>,
    commits: Cell<u32>,
    decoded: RefCell<Option<RgbaImage>>,
    canvas: RefCell<RgbaImage>,
    listeners: RefCell<Vec<CompletionListener>>,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("label", &self.label)
            .field("state", &self.state.get())
            .field("drawn", &self.drawn.get())
            .field("commits", &self.commits.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl Surface {
    fn with_state(label: String, state: LoadState, drawn: bool, canvas: RgbaImage) -> Self {
        Self {
            label,
            state: Cell::new(state),
            drawn: Cell::new(drawn),
            commits: Cell::new(0),
            decoded: RefCell::new(None),
            canvas: RefCell::new(canvas),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// A surface whose decode has not finished.
    pub fn loading(label: impl Into<String>) -> SurfaceHandle {
        Rc::new(Self::with_state(
            label.into(),
            LoadState::Loading,
            false,
            RgbaImage::new(0, 0),
        ))
    }

    /// A ready surface holding decoded pixels that have not been committed yet.
    pub fn decoded(label: impl Into<String>, image: RgbaImage) -> SurfaceHandle {
        let (w, h) = image.dimensions();
        let s = Self::with_state(label.into(), LoadState::Ready, false, RgbaImage::new(w, h));
        *s.decoded.borrow_mut() = Some(image);
        Rc::new(s)
    }

    /// A ready, transparent render target with nothing pending to commit.
    pub fn blank(label: impl Into<String>, width: u32, height: u32) -> SurfaceHandle {
        Rc::new(Self::with_state(
            label.into(),
            LoadState::Ready,
            true,
            RgbaImage::new(width, height),
        ))
    }

    /// Diagnostic label (usually `folder/name`).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    /// `true` once decoded pixels are available.
    pub fn is_ready(&self) -> bool {
        self.state.get() == LoadState::Ready
    }

    /// `true` once the surface left [`LoadState::Loading`], successfully or not.
    pub fn is_settled(&self) -> bool {
        self.state.get() != LoadState::Loading
    }

    /// `true` once the decoded pixels were committed to the canvas (or nothing was pending).
    pub fn is_drawn(&self) -> bool {
        self.drawn.get()
    }

    /// How many times decoded pixels were committed. At most one per decode.
    pub fn commit_count(&self) -> u32 {
        self.commits.get()
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.borrow().width()
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.borrow().height()
    }

    /// Full canvas bounds.
    pub fn bounds(&self) -> PixelRect {
        let c = self.canvas.borrow();
        PixelRect::from_size(c.width(), c.height())
    }

    /// Read one committed canvas pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.canvas.borrow().get_pixel_checked(x, y).copied()
    }

    /// Number of listeners waiting for this surface to settle.
    pub fn pending_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Register a one-shot listener fired when the surface settles.
    ///
    /// Fires immediately when the surface is already settled.
    pub fn add_completion_listener(&self, listener: impl FnOnce() + 'static) {
        if self.is_settled() {
            listener();
            return;
        }
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Finish decoding: store pixels, size the canvas, reset the drawn flag and fire listeners.
    ///
    /// Returns `false` (and does nothing) when the surface was already settled.
    pub fn complete_load(&self, image: RgbaImage) -> bool {
        if self.is_settled() {
            return false;
        }
        let (w, h) = image.dimensions();
        *self.canvas.borrow_mut() = RgbaImage::new(w, h);
        *self.decoded.borrow_mut() = Some(image);
        self.drawn.set(false);
        self.state.set(LoadState::Ready);
        self.fire_listeners();
        true
    }

    /// Settle as failed and fire listeners. Returns `false` when already settled.
    pub fn fail_load(&self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.state.set(LoadState::Failed);
        self.fire_listeners();
        true
    }

    /// Commit decoded pixels to the canvas if the surface is ready and not yet drawn.
    ///
    /// Every composite site calls this on its source before reading pixels. Returns `true` when
    /// this call performed the commit.
    pub fn commit_if_needed(&self) -> bool {
        if !self.is_ready() || self.drawn.get() {
            return false;
        }
        let Some(decoded) = self.decoded.borrow_mut().take() else {
            return false;
        };
        image::imageops::replace(&mut *self.canvas.borrow_mut(), &decoded, 0, 0);
        self.drawn.set(true);
        self.commits.set(self.commits.get().saturating_add(1));
        tracing::trace!(surface = %self.label, "surface committed");
        true
    }

    /// Fill a region of the canvas with a solid color, clipped to the canvas. Pending decoded
    /// pixels are committed first.
    pub fn fill_rect(&self, rect: PixelRect, color: Rgba<u8>) {
        self.commit_if_needed();
        let clip = rect.intersect(self.bounds());
        if clip.is_empty() {
            return;
        }
        let mut canvas = self.canvas.borrow_mut();
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Copy a clipped region of the committed canvas.
    pub(crate) fn copy_region(&self, rect: PixelRect) -> Option<(PixelRect, RgbaImage)> {
        let clip = rect.intersect(self.bounds());
        if clip.is_empty() {
            return None;
        }
        let canvas = self.canvas.borrow();
        let region =
            image::imageops::crop_imm(&*canvas, clip.x as u32, clip.y as u32, clip.w, clip.h)
                .to_image();
        Some((clip, region))
    }

    /// Alpha-blend `src` onto the canvas with its top-left at `(x, y)`.
    pub(crate) fn overlay(&self, src: &RgbaImage, x: i64, y: i64) {
        image::imageops::overlay(&mut *self.canvas.borrow_mut(), src, x, y);
    }

    fn fire_listeners(&self) {
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in listeners {
            listener();
        }
    }
}

/// Readiness of a freshly fetched surface.
pub enum Readiness {
    /// Settled at fetch time; usable now.
    ReadyNow,
    /// Still decoding; the registration lets the caller attach a completion listener.
    PendingUntil(CompletionRegistration),
}

/// Deferred listener registration for a pending surface.
pub struct CompletionRegistration {
    surface: SurfaceHandle,
}

impl CompletionRegistration {
    /// Surface being waited on.
    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// Attach a one-shot listener fired when the surface settles.
    pub fn on_complete(self, listener: impl FnOnce() + 'static) {
        self.surface.add_completion_listener(listener);
    }
}

/// Classify a fetched surface as usable now or pending.
pub fn readiness(surface: &SurfaceHandle) -> Readiness {
    if surface.is_settled() {
        Readiness::ReadyNow
    } else {
        Readiness::PendingUntil(CompletionRegistration {
            surface: Rc::clone(surface),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/surface.rs"]
mod tests;
