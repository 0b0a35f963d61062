use crate::foundation::error::PreloadResult;
use crate::schedule::Preloader;

/// One unit of per-frame work registered with a [`FrameLoop`].
pub trait FrameStep {
    /// Run this step for the current frame.
    fn update(&mut self) -> PreloadResult<()>;
}

impl<F: FnMut() -> PreloadResult<()>> FrameStep for F {
    fn update(&mut self) -> PreloadResult<()> {
        self()
    }
}

impl FrameStep for Preloader {
    fn update(&mut self) -> PreloadResult<()> {
        self.on_frame_tick()
    }
}

/// Ordered list of per-frame steps, run once per [`FrameLoop::tick`].
#[derive(Default)]
pub struct FrameLoop {
    steps: Vec<Box<dyn FrameStep>>,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step; steps run in registration order.
    pub fn add_step(&mut self, step: impl FrameStep + 'static) {
        self.steps.push(Box::new(step));
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Frames ticked so far, including a frame whose step failed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run every step once. The first failing step aborts the rest of this frame.
    pub fn tick(&mut self) -> PreloadResult<()> {
        self.frames = self.frames.saturating_add(1);
        for step in &mut self.steps {
            step.update()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/frame_loop.rs"]
mod tests;
