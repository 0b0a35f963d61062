use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::foundation::error::PreloadResult;
use crate::manifest::{Category, WorkItem};
use crate::schedule::countdown::{Countdown, SharedCountdown};
use crate::surface::cache::SurfaceCache;
use crate::surface::{Readiness, SurfaceHandle, readiness};

/// Fetch primitive for one category: `(name, hue) -> surface`.
pub type FetchFn = Box<dyn FnMut(&str, i32) -> PreloadResult<SurfaceHandle>>;

/// Hue passed to every preload fetch.
const PRELOAD_HUE: i32 = 0;

/// A host image source able to serve every category.
pub trait ImageLoader {
    /// Fetch `name` from `category` with hue rotation `hue`.
    fn load(&mut self, category: Category, name: &str, hue: i32) -> PreloadResult<SurfaceHandle>;
}

impl ImageLoader for SurfaceCache {
    fn load(&mut self, category: Category, name: &str, hue: i32) -> PreloadResult<SurfaceHandle> {
        self.request(category, name, hue)
    }
}

/// How long the dispatcher must wait after a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitSignal {
    /// Nothing was fetched; keep dispatching this tick.
    Immediate,
    /// Wait this many ticks (`0` keeps dispatching this tick).
    AfterTicks(u32),
    /// Wait until the fetched surface's completion listener fires.
    AfterAsyncCompletion,
}

/// Dispatch table from [`Category`] to its fetch primitive.
pub struct FetchRouter {
    slots: [Option<FetchFn>; Category::COUNT],
}

impl Default for FetchRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FetchRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| self.has_primitive(*c))
            .collect();
        f.debug_struct("FetchRouter")
            .field("registered", &registered)
            .finish()
    }
}

impl FetchRouter {
    /// Router with no primitives registered.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Router serving every category from one shared loader.
    pub fn for_loader<L: ImageLoader + 'static>(loader: Rc<RefCell<L>>) -> Self {
        let mut router = Self::new();
        for category in Category::ALL {
            let loader = Rc::clone(&loader);
            router.register(category, move |name, hue| {
                loader.borrow_mut().load(category, name, hue)
            });
        }
        router
    }

    /// Install the primitive for `category`, returning the one it replaces.
    pub fn register(
        &mut self,
        category: Category,
        fetch: impl FnMut(&str, i32) -> PreloadResult<SurfaceHandle> + 'static,
    ) -> Option<FetchFn> {
        self.slots[category.index()].replace(Box::new(fetch))
    }

    /// Builder form of [`FetchRouter::register`].
    pub fn with(
        mut self,
        category: Category,
        fetch: impl FnMut(&str, i32) -> PreloadResult<SurfaceHandle> + 'static,
    ) -> Self {
        self.register(category, fetch);
        self
    }

    /// `true` when `category` has a primitive.
    pub fn has_primitive(&self, category: Category) -> bool {
        self.slots[category.index()].is_some()
    }

    /// Resolve a raw manifest key to its category and primitive.
    pub fn resolve(&mut self, key: &str) -> Option<(Category, &mut FetchFn)> {
        let category = Category::from_key(key)?;
        let slot = self.slots[category.index()].as_mut()?;
        Some((category, slot))
    }

    /// Invoke the primitive for `item`. `Ok(None)` means the category is unroutable and the
    /// item is skipped. Primitive errors are returned untouched.
    pub fn fetch(&mut self, item: &WorkItem) -> PreloadResult<Option<(Category, SurfaceHandle)>> {
        let Some((category, fetch)) = self.resolve(item.category()) else {
            return Ok(None);
        };
        let surface = fetch(item.name(), PRELOAD_HUE)?;
        Ok(Some((category, surface)))
    }
}

/// Turn a fetched surface into a wait signal.
///
/// A settled surface waits `interval` ticks. A pending one blocks `countdown` and registers a
/// one-shot listener that moves it from blocked to `interval`. With `await_decode` off, a
/// pending surface waits `interval` ticks like a settled one.
pub fn bridge_completion(
    surface: &SurfaceHandle,
    interval: u32,
    await_decode: bool,
    countdown: &SharedCountdown,
) -> WaitSignal {
    let reg = match readiness(surface) {
        Readiness::ReadyNow => return WaitSignal::AfterTicks(interval),
        Readiness::PendingUntil(_) if !await_decode => return WaitSignal::AfterTicks(interval),
        Readiness::PendingUntil(reg) => reg,
    };

    countdown.set(Countdown::AwaitingCompletion);
    let wake = countdown.clone();
    let label = reg.surface().label().to_string();
    reg.on_complete(move || {
        if wake.wake(interval) {
            tracing::debug!(surface = %label, interval, "preload resumed after decode");
        }
    });
    WaitSignal::AfterAsyncCompletion
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/router.rs"]
mod tests;
