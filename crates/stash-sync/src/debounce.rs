//! Owned, cancellable debounce timer.
//!
//! A [`Debouncer`] holds at most one pending value and its deadline. Pushing a new
//! value replaces the old one and restarts the deadline, so a value is only released
//! after a full quiet period. There is no background task: the owner either polls with
//! an explicit instant or awaits [`Debouncer::fired`].

use std::future;

use tokio::time::{sleep_until, Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Buffer `value`, cancelling whatever was pending. Returns true if a pending
    /// value was superseded.
    pub fn push(&mut self, value: T, now: Instant) -> bool {
        let superseded = self.pending.is_some();
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
        superseded
    }

    /// Drop the pending value, if any, without releasing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Release the pending value if its deadline has passed at `now`.
    pub fn poll_expired(&mut self, now: Instant) -> Option<T> {
        let expired = self.pending.as_ref().is_some_and(|p| p.deadline <= now);
        if expired {
            self.pending.take().map(|p| p.value)
        } else {
            None
        }
    }

    /// Wait until the pending value settles and release it. Never resolves while
    /// nothing is pending. Dropping the future leaves the pending value in place.
    pub async fn fired(&mut self) -> T {
        loop {
            match self.deadline() {
                Some(deadline) => {
                    sleep_until(deadline).await;
                    if let Some(value) = self.poll_expired(Instant::now()) {
                        return value;
                    }
                }
                None => future::pending::<()>().await,
            }
        }
    }
}
