use crate::config::PreloadOpts;
use crate::fetch::{FetchRouter, WaitSignal, bridge_completion};
use crate::foundation::error::PreloadResult;
use crate::manifest::{WorkItem, WorkQueue};
use crate::schedule::countdown::{Countdown, SharedCountdown};
use crate::surface::SurfaceHandle;

/// Counters describing one preload run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreloadStats {
    /// Ticks on which the dispatcher ran (ticks after completion are not counted).
    pub ticks: u64,
    /// Items handed to a fetch primitive.
    pub dispatched: u64,
    /// Items skipped because their category has no primitive.
    pub skipped: u64,
    /// Dispatches whose surface was settled at fetch time.
    pub ready_now: u64,
    /// Dispatches whose surface was still decoding at fetch time.
    pub pending: u64,
}

/// Frame-throttled preload dispatcher.
///
/// Owns the work queue, the countdown and the completion latch. Call
/// [`Preloader::on_frame_tick`] once per host frame. At most one fetch is outstanding: a
/// pending fetch blocks further dispatch until its completion listener fires, with no timeout.
pub struct Preloader {
    queue: WorkQueue,
    router: FetchRouter,
    countdown: SharedCountdown,
    completed: bool,
    interval: u32,
    await_decode: bool,
    log_dispatches: bool,
    awaiting: Option<SurfaceHandle>,
    stats: PreloadStats,
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("remaining", &self.queue.len())
            .field("countdown", &self.countdown.get())
            .field("completed", &self.completed)
            .field("interval", &self.interval)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Preloader {
    pub fn new(queue: WorkQueue, router: FetchRouter, opts: &PreloadOpts) -> Self {
        Self {
            queue,
            router,
            countdown: SharedCountdown::default(),
            completed: false,
            interval: opts.load_interval_ticks,
            await_decode: opts.await_decode,
            log_dispatches: opts.log_dispatches,
            awaiting: None,
            stats: PreloadStats::default(),
        }
    }

    /// `true` once the queue was observed empty. Never reverts.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Items not yet dispatched.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown.get()
    }

    pub fn stats(&self) -> PreloadStats {
        self.stats
    }

    /// Surface the dispatcher is blocked on, if its decode has not settled yet.
    pub fn awaiting(&self) -> Option<&SurfaceHandle> {
        self.awaiting.as_ref().filter(|s| !s.is_settled())
    }

    /// Run one frame's worth of dispatching.
    ///
    /// Dispatches while the countdown allows it, then advances the countdown by one tick. A
    /// no-op once complete. Fetch primitive errors are returned as-is; the failing item stays
    /// consumed.
    pub fn on_frame_tick(&mut self) -> PreloadResult<()> {
        if self.completed {
            return Ok(());
        }
        self.stats.ticks = self.stats.ticks.saturating_add(1);

        while self.countdown.get().is_elapsed() && !self.completed {
            let Some(item) = self.queue.pop_front() else {
                self.completed = true;
                self.awaiting = None;
                tracing::debug!(
                    dispatched = self.stats.dispatched,
                    skipped = self.stats.skipped,
                    ticks = self.stats.ticks,
                    "preload complete"
                );
                break;
            };
            match self.dispatch(&item)? {
                WaitSignal::Immediate => {}
                WaitSignal::AfterTicks(n) => self.countdown.set(Countdown::Ticks(n)),
                // The bridge already blocked the countdown and registered the wake-up.
                WaitSignal::AfterAsyncCompletion => {}
            }
        }

        self.countdown.tick();
        Ok(())
    }

    /// Fetch one item and translate its readiness into a wait signal.
    fn dispatch(&mut self, item: &WorkItem) -> PreloadResult<WaitSignal> {
        let Some((category, surface)) = self.router.fetch(item)? else {
            self.stats.skipped = self.stats.skipped.saturating_add(1);
            return Ok(WaitSignal::Immediate);
        };
        self.stats.dispatched = self.stats.dispatched.saturating_add(1);
        if self.log_dispatches {
            tracing::info!("Loaded: {category}/{}", item.name());
        }

        if surface.is_settled() {
            self.stats.ready_now = self.stats.ready_now.saturating_add(1);
        } else {
            self.stats.pending = self.stats.pending.saturating_add(1);
        }

        let signal = bridge_completion(&surface, self.interval, self.await_decode, &self.countdown);
        self.awaiting = match signal {
            WaitSignal::AfterAsyncCompletion => Some(surface),
            _ => None,
        };
        Ok(signal)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/dispatcher.rs"]
mod tests;
