use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::config::PreloadOpts;
use crate::fetch::FetchRouter;
use crate::foundation::error::PreloadResult;
use crate::manifest::{WorkQueue, load_work_queue};
use crate::schedule::{PreloadStats, Preloader};
use crate::session::frame_loop::FrameStep;
use crate::surface::cache::{DecodeMode, SurfaceCache, settle_all};

/// Folder below the project root holding manifest documents.
pub const DATA_DIR: &str = "data";

/// A preloader wired to a file-backed decode cache.
///
/// Each [`PreloadSession::tick`] first settles finished decodes (firing completion listeners on
/// the frame thread), then runs one dispatcher tick.
pub struct PreloadSession {
    project_root: PathBuf,
    opts: PreloadOpts,
    cache: Rc<RefCell<SurfaceCache>>,
    preloader: Preloader,
}

impl PreloadSession {
    /// Load `<project_root>/data/<manifest>.json` and prepare a session over `project_root`.
    ///
    /// A missing or malformed manifest yields a session that completes on its first tick.
    pub fn open(
        project_root: impl Into<PathBuf>,
        opts: PreloadOpts,
        mode: DecodeMode,
    ) -> PreloadResult<Self> {
        let project_root = project_root.into();
        opts.validate()?;
        let queue = load_work_queue(&opts.manifest_path(project_root.join(DATA_DIR)));
        Self::with_queue(project_root, queue, opts, mode)
    }

    /// Prepare a session over an already-built queue.
    pub fn with_queue(
        project_root: impl Into<PathBuf>,
        queue: WorkQueue,
        opts: PreloadOpts,
        mode: DecodeMode,
    ) -> PreloadResult<Self> {
        opts.validate()?;
        let project_root = project_root.into();
        let cache = Rc::new(RefCell::new(SurfaceCache::new(project_root.clone(), mode)));
        let router = FetchRouter::for_loader(Rc::clone(&cache));
        tracing::debug!(
            root = %project_root.display(),
            items = queue.len(),
            interval = opts.load_interval_ticks,
            "preload session ready"
        );
        let preloader = Preloader::new(queue, router, &opts);
        Ok(Self {
            project_root,
            opts,
            cache,
            preloader,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn opts(&self) -> &PreloadOpts {
        &self.opts
    }

    /// The host cache the preloader fills.
    pub fn cache(&self) -> &Rc<RefCell<SurfaceCache>> {
        &self.cache
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    pub fn is_complete(&self) -> bool {
        self.preloader.is_complete()
    }

    pub fn stats(&self) -> PreloadStats {
        self.preloader.stats()
    }

    /// Settle finished decodes, then run one dispatcher tick.
    ///
    /// Listeners fire after the cache borrow is released, so they may use [`Self::cache`].
    pub fn tick(&mut self) -> PreloadResult<()> {
        let finished = self.cache.borrow_mut().drain_finished();
        let settled = settle_all(finished);
        if settled > 0 {
            tracing::trace!(settled, "decodes settled");
        }
        self.preloader.on_frame_tick()
    }

    /// Block up to `timeout` for a background decode to finish. Returns the number settled.
    pub fn wait_for_io(&self, timeout: Duration) -> usize {
        let finished = self.cache.borrow_mut().wait_finished(timeout);
        settle_all(finished)
    }
}

impl FrameStep for PreloadSession {
    fn update(&mut self) -> PreloadResult<()> {
        self.tick()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/preload_session.rs"]
mod tests;
