//! Page cursor state machine: `Idle → Requesting → Settling → Idle`.
//!
//! Timers are not owned here. Every transition takes the current instant, and
//! the re-entrancy guard and spinner visibility are pure functions of state.

use std::time::Duration;

use tokio::time::Instant;

/// Cooldown after a page request resolves before another is accepted.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(800);
/// How long a request must be pending before the loading indicator shows.
pub const DEFAULT_SPINNER_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTiming {
    pub settle_delay: Duration,
    pub spinner_delay: Duration,
}

impl Default for NavigationTiming {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            spinner_delay: DEFAULT_SPINNER_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting { target: u32, since: Instant },
    Settling { until: Instant },
}

/// Why a page request was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    SamePage,
    OutOfRange,
    /// A request is in flight or settling.
    Busy,
}

/// How a page request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Loaded(u32),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted(u32),
    Rejected(Rejection),
}

/// Bounded cursor over `[1, total_pages]`.
#[derive(Debug, Clone)]
pub struct PageCursor {
    /// Page shown in the indicator; optimistic while a request is pending.
    current_page: u32,
    /// Page whose content is actually on screen.
    displayed_page: u32,
    total_pages: u32,
    phase: Phase,
    timing: NavigationTiming,
}

impl PageCursor {
    pub fn new(current_page: u32, total_pages: u32, timing: NavigationTiming) -> Self {
        let total_pages = total_pages.max(1);
        let current_page = current_page.clamp(1, total_pages);
        Self {
            current_page,
            displayed_page: current_page,
            total_pages,
            phase: Phase::Idle,
            timing,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn displayed_page(&self) -> u32 {
        self.displayed_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Phase as of `now`, with an elapsed settle period folded back to idle.
    pub fn phase(&self, now: Instant) -> Phase {
        match self.phase {
            Phase::Settling { until } if now >= until => Phase::Idle,
            phase => phase,
        }
    }

    pub fn is_transitioning(&self, now: Instant) -> bool {
        self.phase(now) != Phase::Idle
    }

    /// The loading indicator shows only once a request has been pending
    /// for the spinner delay.
    pub fn spinner_visible(&self, now: Instant) -> bool {
        match self.phase {
            Phase::Requesting { since, .. } => {
                now.saturating_duration_since(since) >= self.timing.spinner_delay
            }
            _ => false,
        }
    }

    /// Accept or reject a request for page `n`.
    ///
    /// On acceptance the indicator moves to `n` immediately.
    pub fn request_page(&mut self, n: u32, now: Instant) -> Decision {
        if n == self.current_page {
            return Decision::Rejected(Rejection::SamePage);
        }
        if n < 1 || n > self.total_pages {
            return Decision::Rejected(Rejection::OutOfRange);
        }
        if self.is_transitioning(now) {
            return Decision::Rejected(Rejection::Busy);
        }

        self.phase = Phase::Requesting {
            target: n,
            since: now,
        };
        self.current_page = n;
        Decision::Accepted(n)
    }

    /// Record how the pending request ended and start the settle period.
    ///
    /// On failure the indicator returns to the page still on screen.
    pub fn resolve(&mut self, outcome: Outcome, now: Instant) {
        if !matches!(self.phase, Phase::Requesting { .. }) {
            return;
        }
        match outcome {
            Outcome::Loaded(page) => {
                let page = page.clamp(1, self.total_pages);
                self.current_page = page;
                self.displayed_page = page;
            }
            Outcome::Failed => self.current_page = self.displayed_page,
        }
        self.phase = Phase::Settling {
            until: now + self.timing.settle_delay,
        };
    }

    /// Advance timers; returns the phase as of `now`.
    pub fn tick(&mut self, now: Instant) -> Phase {
        self.phase = self.phase(now);
        self.phase
    }

    pub fn previous(&mut self, now: Instant) -> Decision {
        self.request_page(self.previous_target(), now)
    }

    pub fn next(&mut self, now: Instant) -> Decision {
        self.request_page(self.next_target(), now)
    }

    /// Target for the "previous page" control, clamped to the first page.
    pub fn previous_target(&self) -> u32 {
        self.current_page.saturating_sub(1).max(1)
    }

    /// Target for the "next page" control, clamped to the last page.
    pub fn next_target(&self) -> u32 {
        (self.current_page + 1).min(self.total_pages)
    }

    pub fn can_go_previous(&self, now: Instant) -> bool {
        self.current_page > 1 && !self.is_transitioning(now)
    }

    pub fn can_go_next(&self, now: Instant) -> bool {
        self.current_page < self.total_pages && !self.is_transitioning(now)
    }
}
