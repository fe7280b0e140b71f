//! Redraw-on-demand scheduling
//!
//! A mutation requests a redraw. Requests made while a pass is running are
//! folded into exactly one follow-up pass.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedrawState {
    /// Nothing to draw
    Settled,
    /// A pass is owed
    Requested,
    /// A pass is running; `requested` records mutations made during it
    InPass { requested: bool },
}

/// Finite-state redraw scheduler
#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    state: RedrawState,
}

impl Default for RedrawScheduler {
    /// Starts out owing the initial pass
    fn default() -> Self {
        Self {
            state: RedrawState::Requested,
        }
    }
}

impl RedrawScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for another pass; idempotent
    pub fn request(&mut self) {
        self.state = match self.state {
            RedrawState::Settled | RedrawState::Requested => RedrawState::Requested,
            RedrawState::InPass { .. } => RedrawState::InPass { requested: true },
        };
    }

    /// Enter a pass, consuming any outstanding request
    pub fn begin_pass(&mut self) {
        self.state = RedrawState::InPass { requested: false };
    }

    /// Leave the pass; returns whether another one is owed
    pub fn end_pass(&mut self) -> bool {
        match self.state {
            RedrawState::InPass { requested: true } => {
                self.state = RedrawState::Requested;
                true
            }
            RedrawState::InPass { requested: false } => {
                self.state = RedrawState::Settled;
                false
            }
            RedrawState::Requested => true,
            RedrawState::Settled => false,
        }
    }

    #[must_use]
    pub const fn is_requested(&self) -> bool {
        matches!(
            self.state,
            RedrawState::Requested | RedrawState::InPass { requested: true }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_pass_is_owed() {
        let mut scheduler = RedrawScheduler::new();
        assert!(scheduler.is_requested());

        scheduler.begin_pass();
        assert!(!scheduler.end_pass());
        assert!(!scheduler.is_requested());
    }

    #[test]
    fn test_requests_during_pass_fold_into_one() {
        let mut scheduler = RedrawScheduler::new();
        scheduler.begin_pass();
        scheduler.request();
        scheduler.request();
        scheduler.request();
        assert!(scheduler.end_pass());

        // The follow-up pass makes no request and settles
        scheduler.begin_pass();
        assert!(!scheduler.end_pass());
    }

    #[test]
    fn test_request_between_passes() {
        let mut scheduler = RedrawScheduler::new();
        scheduler.begin_pass();
        scheduler.end_pass();

        scheduler.request();
        scheduler.request();
        assert!(scheduler.is_requested());
    }
}
