//! Cancelable-timer abstraction shared by debounce and hover-out scheduling.
//!
//! The engine never reads a clock of its own: the host passes the current
//! time (milliseconds of any monotonic origin) into every call and pumps
//! [`TimerQueue::fire_due`] from its event loop. That keeps all timing
//! deterministic under test and makes every pending timer externally
//! cancelable, which the cancel-before-reschedule rule depends on.

/// Milliseconds since an arbitrary monotonic origin chosen by the host.
pub type Millis = u64;

/// Identifies one scheduled timer. Tokens are never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A deterministic, host-pumped timer queue.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_token: u64,
    pending: Vec<(Millis, TimerToken)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        TimerQueue::default()
    }

    /// Schedule a timer to fire once `delay` has elapsed past `now`.
    pub fn schedule(&mut self, now: Millis, delay: Millis) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending.push((now.saturating_add(delay), token));
        token
    }

    /// Cancel a pending timer. Returns whether it was still pending; a stale
    /// token (already fired or cancelled) is a no-op.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|&(_, t)| t != token);
        self.pending.len() != before
    }

    /// Remove and return every timer whose deadline has passed, in deadline
    /// order.
    pub fn fire_due(&mut self, now: Millis) -> Vec<TimerToken> {
        let mut due: Vec<(Millis, TimerToken)> = Vec::new();
        self.pending.retain(|&(deadline, token)| {
            if deadline <= now {
                due.push((deadline, token));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(deadline, TimerToken(seq))| (deadline, seq));
        due.into_iter().map(|(_, token)| token).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.iter().map(|&(deadline, _)| deadline).min()
    }
}
