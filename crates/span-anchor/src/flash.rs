//! Deferred scroll and flash-clear actions
//!
//! Navigation never sleeps; it hands [`FlashAction`]s to a [`FlashTimers`]
//! implementation. The browser binding backs this with `setTimeout`,
//! [`ManualTimers`] runs them on demand.

use crate::error::AnchorError;
use crate::tree::TextTree;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Work deferred by navigation
#[derive(Debug, Clone, PartialEq)]
pub enum FlashAction<N> {
    ScrollIntoView(N),
    RemoveClass { element: N, class: String },
}

impl<N> FlashAction<N> {
    pub fn apply<T: TextTree<Node = N>>(&self, tree: &mut T) {
        match self {
            FlashAction::ScrollIntoView(element) => tree.scroll_into_view(element),
            FlashAction::RemoveClass { element, class } => {
                if let Err(e) = tree.remove_class(element, class) {
                    debug!(error = %e, "flash class already gone");
                }
            }
        }
    }
}

/// Schedules deferred actions and cancels them by handle
pub trait FlashTimers<N> {
    type Handle: Clone + fmt::Debug;

    fn schedule(
        &mut self,
        delay: Duration,
        action: FlashAction<N>,
    ) -> Result<Self::Handle, AnchorError>;

    /// Cancel a pending action. Cancelling one that already ran is a no-op.
    fn cancel(&mut self, handle: &Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<N> {
    id: TimerId,
    due: Duration,
    action: FlashAction<N>,
}

/// Virtual clock timers, advanced explicitly
#[derive(Debug, Clone)]
pub struct ManualTimers<N> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<N>>,
}

impl<N> Default for ManualTimers<N> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<N: Clone> ManualTimers<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Actions still waiting, soonest first
    pub fn pending_actions(&self) -> Vec<FlashAction<N>> {
        let mut pending: Vec<&Pending<N>> = self.pending.iter().collect();
        pending.sort_by_key(|p| (p.due, p.id));
        pending.into_iter().map(|p| p.action.clone()).collect()
    }

    /// Move the clock forward, running every action that comes due in
    /// schedule order. Returns how many ran.
    pub fn advance<T: TextTree<Node = N>>(&mut self, tree: &mut T, by: Duration) -> usize {
        self.now += by;
        let now = self.now;
        let (mut due, waiting): (Vec<Pending<N>>, Vec<Pending<N>>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        due.sort_by_key(|p| (p.due, p.id));
        for pending in &due {
            pending.action.apply(tree);
        }
        due.len()
    }
}

impl<N: Clone> FlashTimers<N> for ManualTimers<N> {
    type Handle = TimerId;

    fn schedule(&mut self, delay: Duration, action: FlashAction<N>) -> Result<TimerId, AnchorError> {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now + delay,
            action,
        });
        Ok(id)
    }

    fn cancel(&mut self, handle: &TimerId) {
        self.pending.retain(|p| p.id != *handle);
    }
}
