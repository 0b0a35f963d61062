use std::cell::Cell;
use std::rc::Rc;

/// Ticks left before the dispatcher may dispatch again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Countdown {
    /// Finite wait. `Ticks(0)` means dispatch is allowed now.
    Ticks(u32),
    /// Unbounded wait, lifted only by a completion listener.
    AwaitingCompletion,
}

impl Default for Countdown {
    fn default() -> Self {
        Countdown::Ticks(0)
    }
}

impl Countdown {
    /// `true` when dispatch is allowed.
    pub fn is_elapsed(self) -> bool {
        matches!(self, Countdown::Ticks(0))
    }

    /// One tick later. Saturates at zero; an unbounded wait stays unbounded.
    pub fn decremented(self) -> Self {
        match self {
            Countdown::Ticks(n) => Countdown::Ticks(n.saturating_sub(1)),
            Countdown::AwaitingCompletion => Countdown::AwaitingCompletion,
        }
    }
}

/// Countdown cell shared between the dispatcher and the completion listener it registers.
#[derive(Clone, Debug, Default)]
pub struct SharedCountdown(Rc<Cell<Countdown>>);

impl SharedCountdown {
    pub fn get(&self) -> Countdown {
        self.0.get()
    }

    pub fn set(&self, value: Countdown) {
        self.0.set(value);
    }

    /// Advance by one tick.
    pub fn tick(&self) {
        self.0.set(self.0.get().decremented());
    }

    /// Lift an unbounded wait to `interval` ticks. Returns `false` when nothing was waiting.
    pub fn wake(&self, interval: u32) -> bool {
        if self.0.get() != Countdown::AwaitingCompletion {
            return false;
        }
        self.0.set(Countdown::Ticks(interval));
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/countdown.rs"]
mod tests;
