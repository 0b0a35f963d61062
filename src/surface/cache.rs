use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use image::RgbaImage;

use crate::foundation::error::{PreloadError, PreloadResult};
use crate::manifest::Category;
use crate::surface::decode::decode_image_file;
use crate::surface::{Surface, SurfaceHandle};

/// Where decodes run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Decode on the calling thread; every request settles before it returns.
    Inline,
    /// Decode on `rayon` workers; results settle on [`SurfaceCache::pump`].
    #[default]
    Background,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub requests: u64,
    pub hits: u64,
    pub decoded: u64,
    pub failed: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    rel_path: String,
    hue: i32,
}

struct DecodeDone {
    job: u64,
    result: PreloadResult<RgbaImage>,
}

/// Host-side image cache keyed by `(path, hue)`.
///
/// Surfaces are owned here and handed out as shared handles; the first request for a key
/// starts a decode, later requests return the same handle whatever its state.
pub struct SurfaceCache {
    root: PathBuf,
    mode: DecodeMode,
    entries: HashMap<CacheKey, SurfaceHandle>,
    pending: HashMap<u64, SurfaceHandle>,
    next_job: u64,
    tx: mpsc::Sender<DecodeDone>,
    rx: mpsc::Receiver<DecodeDone>,
    stats: CacheStats,
}

impl SurfaceCache {
    /// Create a cache reading images below `root` (the project directory holding `img/`).
    pub fn new(root: impl Into<PathBuf>, mode: DecodeMode) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            mode,
            entries: HashMap::new(),
            pending: HashMap::new(),
            next_job: 0,
            tx,
            rx,
            stats: CacheStats::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of decodes not yet settled.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of cached surfaces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a cached surface without starting a decode.
    pub fn get(&self, category: Category, name: &str, hue: i32) -> Option<SurfaceHandle> {
        let rel_path = resource_rel_path(category, name).ok()?;
        self.entries.get(&CacheKey { rel_path, hue }).cloned()
    }

    /// Fetch `name` from `category`'s folder, decoding it on first request.
    ///
    /// Fails only for names that cannot address a file inside the category folder.
    pub fn request(
        &mut self,
        category: Category,
        name: &str,
        hue: i32,
    ) -> PreloadResult<SurfaceHandle> {
        self.stats.requests = self.stats.requests.saturating_add(1);
        let rel_path = resource_rel_path(category, name)?;
        let key = CacheKey {
            rel_path: rel_path.clone(),
            hue,
        };
        if let Some(s) = self.entries.get(&key) {
            self.stats.hits = self.stats.hits.saturating_add(1);
            return Ok(Rc::clone(s));
        }

        let surface = Surface::loading(rel_path.clone());
        self.entries.insert(key, Rc::clone(&surface));
        let path = self.root.join(&rel_path);

        match self.mode {
            DecodeMode::Inline => {
                let result = decode_image_file(&path, hue);
                self.record(Rc::clone(&surface), result).settle();
            }
            DecodeMode::Background => {
                let job = self.next_job;
                self.next_job = self.next_job.wrapping_add(1);
                self.pending.insert(job, Rc::clone(&surface));
                let tx = self.tx.clone();
                rayon::spawn(move || {
                    let result = decode_image_file(&path, hue);
                    // The cache may be gone by now; nothing left to settle then.
                    let _ = tx.send(DecodeDone { job, result });
                });
            }
        }
        Ok(surface)
    }

    /// Settle every finished background decode. Must be called from the frame thread; returns
    /// the number of surfaces settled.
    ///
    /// Listeners fire while `self` is borrowed. Hosts whose listeners reach back into a shared
    /// cache should use [`SurfaceCache::drain_finished`] and settle after releasing the borrow.
    pub fn pump(&mut self) -> usize {
        settle_all(self.drain_finished())
    }

    /// Block up to `timeout` for at least one background decode, then settle everything
    /// finished.
    pub fn pump_wait(&mut self, timeout: Duration) -> usize {
        settle_all(self.wait_finished(timeout))
    }

    /// Collect finished background decodes without settling them.
    pub fn drain_finished(&mut self) -> Vec<FinishedDecode> {
        let mut out = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            out.extend(self.finish(done));
        }
        out
    }

    /// Like [`SurfaceCache::drain_finished`], first blocking up to `timeout` for one decode.
    pub fn wait_finished(&mut self, timeout: Duration) -> Vec<FinishedDecode> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        match self.rx.recv_timeout(timeout) {
            Ok(done) => {
                let mut out: Vec<_> = self.finish(done).into_iter().collect();
                out.extend(self.drain_finished());
                out
            }
            Err(_) => Vec::new(),
        }
    }

    fn finish(&mut self, done: DecodeDone) -> Option<FinishedDecode> {
        let surface = self.pending.remove(&done.job)?;
        Some(self.record(surface, done.result))
    }

    fn record(
        &mut self,
        surface: SurfaceHandle,
        result: PreloadResult<RgbaImage>,
    ) -> FinishedDecode {
        match &result {
            Ok(_) => self.stats.decoded = self.stats.decoded.saturating_add(1),
            Err(_) => self.stats.failed = self.stats.failed.saturating_add(1),
        }
        FinishedDecode { surface, result }
    }
}

/// A decode that finished but whose surface has not been settled yet.
pub struct FinishedDecode {
    surface: SurfaceHandle,
    result: PreloadResult<RgbaImage>,
}

impl FinishedDecode {
    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// Settle the surface as ready or failed, firing its completion listeners.
    pub fn settle(self) {
        match self.result {
            Ok(img) => {
                self.surface.complete_load(img);
            }
            Err(e) => {
                tracing::warn!(surface = %self.surface.label(), error = %e, "image decode failed");
                self.surface.fail_load();
            }
        }
    }
}

pub(crate) fn settle_all(finished: Vec<FinishedDecode>) -> usize {
    let n = finished.len();
    for f in finished {
        f.settle();
    }
    n
}

/// Project-relative image path for `name` in `category`.
///
/// Names use `/` separators and may contain sub-folders, but must stay inside the category
/// folder: absolute names and `..` segments are rejected.
pub fn resource_rel_path(category: Category, name: &str) -> PreloadResult<String> {
    let s = name.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PreloadError::fetch("resource names must be relative"));
    }

    let mut parts = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PreloadError::fetch("resource names must not contain '..'"));
        }
        parts.push(part);
    }
    if parts.is_empty() {
        return Err(PreloadError::fetch("resource name must be non-empty"));
    }

    Ok(format!("{}{}.png", category.folder(), parts.join("/")))
}

#[cfg(test)]
#[path = "../../tests/unit/surface/cache.rs"]
mod tests;
