//! Timer coordination
//!
//! There is no way to cancel a browser timer once the callback is queued,
//! so coalescing works by tickets: each event takes a new ticket and a
//! fired timer only runs if its ticket is still the latest.

/// Generation counter for trailing-edge debouncing.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    generation: u64,
    fired: u64,
}

/// Handle for one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event; schedule the returned ticket after the quiet period.
    pub fn trigger(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    /// Called when a timer fires. True only for the most recent ticket, and
    /// only once.
    pub fn fire(&mut self, ticket: Ticket) -> bool {
        if ticket.0 != self.generation || self.fired == ticket.0 {
            return false;
        }
        self.fired = ticket.0;
        true
    }
}

/// Fixed-interval retry state while waiting for product entries.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    attempts: u32,
    done: bool,
}

/// What to do after one poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Entries found: run once and stop polling
    Run,
    /// Nothing yet: try again after the interval
    Retry,
    /// Already ran
    Done,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True once a poll found entries.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn step(&mut self, found: usize) -> PollStep {
        if self.done {
            return PollStep::Done;
        }
        self.attempts += 1;
        if found > 0 {
            self.done = true;
            PollStep::Run
        } else {
            PollStep::Retry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_runs_once() {
        let mut debouncer = Debouncer::new();
        let tickets: Vec<_> = (0..5).map(|_| debouncer.trigger()).collect();

        let runs = tickets.iter().filter(|t| debouncer.fire(**t)).count();
        assert_eq!(runs, 1);
        assert!(!debouncer.fire(tickets[4]));
    }

    #[test]
    fn test_separate_bursts_each_run() {
        let mut debouncer = Debouncer::new();
        let first = debouncer.trigger();
        assert!(debouncer.fire(first));
        let second = debouncer.trigger();
        assert!(!debouncer.fire(first));
        assert!(debouncer.fire(second));
    }

    #[test]
    fn test_poller_runs_once_entries_appear() {
        let mut poller = Poller::new();
        assert_eq!(poller.step(0), PollStep::Retry);
        assert_eq!(poller.step(0), PollStep::Retry);
        assert!(!poller.is_done());
        assert_eq!(poller.step(3), PollStep::Run);
        assert!(poller.is_done());
        assert_eq!(poller.step(3), PollStep::Done);
        assert_eq!(poller.attempts(), 3);
    }
}
