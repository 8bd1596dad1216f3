//! Render-persistent state cells and the update scheduler

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::State;

/// A requested state transition.
pub enum SetStateAction<S> {
    /// Replace the state with a new value
    Replace(S),
    /// Compute the new state from the previous one
    Update(Box<dyn FnOnce(&S) -> S>),
}

impl<S> SetStateAction<S> {
    fn apply(self, previous: &S) -> S {
        match self {
            SetStateAction::Replace(value) => value,
            SetStateAction::Update(f) => f(previous),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for SetStateAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetStateAction::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            SetStateAction::Update(_) => f.write_str("Update(<fn>)"),
        }
    }
}

pub(crate) trait Commit {
    /// Apply pending updates in order. Returns `true` if the value changed.
    fn commit(&self) -> bool;
}

pub(crate) struct StateSlot<S> {
    current: RefCell<Rc<S>>,
    pending: RefCell<Vec<SetStateAction<S>>>,
}

impl<S: State> StateSlot<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            current: RefCell::new(Rc::new(initial)),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn current(&self) -> Rc<S> {
        Rc::clone(&self.current.borrow())
    }
}

impl<S: State> Commit for StateSlot<S> {
    fn commit(&self) -> bool {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if pending.is_empty() {
            return false;
        }
        let previous = self.current();
        let next = pending
            .into_iter()
            .fold((*previous).clone(), |state, action| action.apply(&state));
        if next == *previous {
            return false;
        }
        *self.current.borrow_mut() = Rc::new(next);
        true
    }
}

/// Queue of state cells with uncommitted updates.
#[derive(Default)]
pub(crate) struct Scheduler {
    queue: RefCell<Vec<Rc<dyn Commit>>>,
    unmounted: Cell<bool>,
}

impl Scheduler {
    pub(crate) fn schedule(&self, slot: Rc<dyn Commit>) {
        self.queue.borrow_mut().push(slot);
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Commit everything queued so far, in scheduling order.
    pub(crate) fn commit_all(&self) -> bool {
        let queue = std::mem::take(&mut *self.queue.borrow_mut());
        let mut changed = false;
        for slot in queue {
            changed |= slot.commit();
        }
        changed
    }

    pub(crate) fn mark_unmounted(&self) {
        self.unmounted.set(true);
        self.queue.borrow_mut().clear();
    }

    fn is_unmounted(&self) -> bool {
        self.unmounted.get()
    }
}

/// Setter half of a state cell returned by
/// [`RenderCx::use_state`](crate::host::RenderCx::use_state).
///
/// Updates are scheduled, not applied: the new value becomes visible on the
/// next render after [`Root::flush`](crate::host::Root::flush).
pub struct StateSetter<S> {
    slot: Rc<StateSlot<S>>,
    scheduler: Weak<Scheduler>,
}

impl<S: State> StateSetter<S> {
    pub(crate) fn new(slot: Rc<StateSlot<S>>, scheduler: Weak<Scheduler>) -> Self {
        Self { slot, scheduler }
    }

    pub fn set(&self, value: S) {
        self.dispatch(SetStateAction::Replace(value));
    }

    pub fn update(&self, f: impl FnOnce(&S) -> S + 'static) {
        self.dispatch(SetStateAction::Update(Box::new(f)));
    }

    pub fn dispatch(&self, action: SetStateAction<S>) {
        let Some(scheduler) = self.scheduler.upgrade().filter(|s| !s.is_unmounted()) else {
            tracing::warn!(update = ?action, "state update on an unmounted provider ignored");
            return;
        };
        self.slot.pending.borrow_mut().push(action);
        scheduler.schedule(Rc::clone(&self.slot) as Rc<dyn Commit>);
    }
}

impl<S> Clone for StateSetter<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            scheduler: Weak::clone(&self.scheduler),
        }
    }
}

impl<S> fmt::Debug for StateSetter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_applies_updates_in_order() {
        let scheduler = Rc::new(Scheduler::default());
        let slot = Rc::new(StateSlot::new(1));
        let setter = StateSetter::new(Rc::clone(&slot), Rc::downgrade(&scheduler));

        setter.update(|n| n + 1);
        setter.update(|n| n * 10);
        setter.set(7);
        setter.update(|n| n - 2);
        assert_eq!(*slot.current(), 1);

        assert!(scheduler.commit_all());
        assert_eq!(*slot.current(), 5);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_equal_value_is_not_a_change() {
        let scheduler = Rc::new(Scheduler::default());
        let slot = Rc::new(StateSlot::new("same".to_string()));
        let setter = StateSetter::new(Rc::clone(&slot), Rc::downgrade(&scheduler));

        setter.set("same".to_string());
        assert!(!scheduler.commit_all());
    }

    #[test]
    fn test_updates_after_unmount_are_dropped() {
        let scheduler = Rc::new(Scheduler::default());
        let slot = Rc::new(StateSlot::new(0));
        let setter = StateSetter::new(Rc::clone(&slot), Rc::downgrade(&scheduler));

        scheduler.mark_unmounted();
        setter.set(3);
        assert!(!scheduler.has_pending());

        drop(scheduler);
        setter.set(4);
        assert_eq!(*slot.current(), 0);
    }
}
