use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Latest-wins bookkeeping: only the most recently issued token may commit.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
    committed: bool,
}

impl RequestTracker {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        self.committed = false;
        RequestToken(self.latest)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest && !self.committed
    }

    /// Marks `token` committed if it is still the latest. Returns whether it was.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        if !self.is_latest(token) {
            return false;
        }
        self.committed = true;
        true
    }

    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.committed = true;
    }

    pub fn awaiting(&self) -> bool {
        self.latest > 0 && !self.committed
    }
}

/// Trailing-edge debounce: fires once `delay` has passed since the last touch.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    /// Returns `true` exactly once per quiet period.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending_since
            .map(|since| self.delay.saturating_sub(now.saturating_duration_since(since)))
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}
