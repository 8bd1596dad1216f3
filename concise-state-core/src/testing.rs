//! Test utilities for concise-state stores
//!
//! - [`StoreHarness`]: mounts a provider with a capturing consumer and lets a
//!   test call actions and observe every published state
//! - [`CallRecorder`]: middleware that records every call passing through it
//! - Assertion macros for verifying recorded calls
//!
//! # Example
//!
//! ```ignore
//! use concise_state::testing::{CallRecorder, StoreHarness};
//! use concise_state::{args, assert_called, create_store_context, StoreOptions};
//!
//! let recorder = CallRecorder::new();
//! let (context, provider) = create_store_context(
//!     Counter::default(),
//!     Some(counter_actions()),
//!     StoreOptions::new().middleware(recorder.middleware()),
//! );
//!
//! let mut harness = StoreHarness::mount(&provider)?;
//! harness.call("increment", args![])?;
//! assert_eq!(harness.state().count, 1);
//! assert_called!(recorder, "increment");
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{Element, Root};
use crate::middleware::{Middleware, MiddlewareEntry};
use crate::outcome::Outcome;
use crate::store::{Store, StoreProvider};
use crate::value::Args;
use crate::State;

/// One call observed by a [`CallRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub action: String,
    pub args: Args,
}

/// Middleware recording the name and arguments of every call.
///
/// Clones share the same record, so a test keeps one handle and gives the
/// store another.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    calls: Rc<RefCell<Vec<RecordedCall>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline stage appending to this recorder, then continuing the chain.
    pub fn middleware(&self) -> Middleware {
        let calls = Rc::clone(&self.calls);
        Middleware::new(move |next, args, meta| {
            calls.borrow_mut().push(RecordedCall {
                action: meta.action_name().to_string(),
                args: args.clone(),
            });
            next.run(args)
        })
    }

    /// Snapshot of recorded calls, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Recorded action names, oldest first
    pub fn names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.action.clone())
            .collect()
    }

    /// Take all recorded calls, leaving the record empty
    pub fn drain(&self) -> Vec<RecordedCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}

impl From<&CallRecorder> for MiddlewareEntry {
    fn from(recorder: &CallRecorder) -> Self {
        MiddlewareEntry::Plain(recorder.middleware())
    }
}

/// A mounted provider with one consumer that captures what it reads.
pub struct StoreHarness<S: State> {
    root: Root,
    history: Rc<RefCell<Vec<Store<S>>>>,
}

impl<S: State> StoreHarness<S> {
    /// Mount `provider` with a capturing consumer as its only child.
    pub fn mount(provider: &StoreProvider<S>) -> anyhow::Result<Self> {
        Self::mount_with(provider, |consumer| consumer)
    }

    /// Mount a custom tree. `wrap` receives the capturing consumer, already
    /// wrapped in `provider`, and returns the root of the tree to mount.
    pub fn mount_with(
        provider: &StoreProvider<S>,
        wrap: impl FnOnce(Element) -> Element,
    ) -> anyhow::Result<Self> {
        let history = Rc::new(RefCell::new(Vec::new()));
        let consumer = {
            let context = provider.context().clone();
            let history = Rc::clone(&history);
            Element::consumer(move |cx| {
                let store = cx.use_context(&context);
                history.borrow_mut().push((*store).clone());
                Ok(())
            })
        };
        let root = Root::mount(wrap(provider.wrap([consumer])))?;
        Ok(Self { root, history })
    }

    /// Latest store seen by the consumer
    pub fn store(&self) -> Store<S> {
        // The consumer renders during mount, so history is never empty.
        let history = self.history.borrow();
        history[history.len() - 1].clone()
    }

    /// Latest published state
    pub fn state(&self) -> Rc<S> {
        self.store().state_rc()
    }

    /// Every state the consumer rendered with, oldest first
    pub fn states(&self) -> Vec<S> {
        self.history
            .borrow()
            .iter()
            .map(|store| store.state().clone())
            .collect()
    }

    /// Call an action on the latest store, then flush.
    ///
    /// Updates queued before a failing action are still flushed.
    pub fn call(&mut self, name: &str, args: Args) -> anyhow::Result<Outcome> {
        let result = self.store().call(name, args);
        self.root.flush()?;
        result
    }

    /// Call an action, await its value, then flush.
    pub async fn call_async(&mut self, name: &str, args: Args) -> anyhow::Result<serde_json::Value> {
        let result = match self.store().call(name, args) {
            Ok(outcome) => outcome.resolve().await,
            Err(error) => Err(error),
        };
        self.root.flush()?;
        result
    }

    pub fn flush(&mut self) -> anyhow::Result<usize> {
        self.root.flush()
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Root {
        &mut self.root
    }
}

/// Assert that an action was recorded, optionally with exact arguments.
///
/// # Example
///
/// ```ignore
/// assert_called!(recorder, "addTodo");
/// assert_called!(recorder, "addTodo", args!["write docs"]);
/// ```
#[macro_export]
macro_rules! assert_called {
    ($recorder:expr, $action:expr) => {
        assert!(
            $recorder.calls().iter().any(|c| c.action == $action),
            "Expected action `{}` to be called, but got: {:?}",
            $action,
            $recorder.names()
        );
    };
    ($recorder:expr, $action:expr, $args:expr) => {
        assert!(
            $recorder
                .calls()
                .iter()
                .any(|c| c.action == $action && c.args == $args),
            "Expected action `{}` to be called with {}, but got: {:?}",
            $action,
            $args,
            $recorder.calls()
        );
    };
}

/// Assert that an action was NOT recorded.
///
/// # Example
///
/// ```ignore
/// assert_not_called!(recorder, "removeTodo");
/// ```
#[macro_export]
macro_rules! assert_not_called {
    ($recorder:expr, $action:expr) => {
        assert!(
            !$recorder.calls().iter().any(|c| c.action == $action),
            "Expected action `{}` NOT to be called, but it was: {:?}",
            $action,
            $recorder.names()
        );
    };
}

/// Count recorded calls of an action.
///
/// # Example
///
/// ```ignore
/// assert_eq!(count_called!(recorder, "increment"), 2);
/// ```
#[macro_export]
macro_rules! count_called {
    ($recorder:expr, $action:expr) => {
        $recorder
            .calls()
            .iter()
            .filter(|c| c.action == $action)
            .count()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionFactory, Actions};
    use crate::reference::ContextReference;
    use crate::store::{create_store_context, StoreOptions};
    use crate::args;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Counter {
        count: i64,
    }

    fn counter(recorder: &CallRecorder) -> StoreProvider<Counter> {
        let factory = ActionFactory::new(|r: &ContextReference<Counter>| {
            let (state, set_state) = (Rc::clone(&r.state), r.set_state.clone());
            let (bump_state, bump_set) = (Rc::clone(&state), set_state.clone());
            Actions::builder()
                .action("add", move |_, args| {
                    let by: i64 = args.get(0)?;
                    set_state.set(Counter {
                        count: state.count + by,
                    })?;
                    Ok(())
                })
                .action("bump_then_fail", move |_, _| -> anyhow::Result<()> {
                    bump_set.set(Counter {
                        count: bump_state.count + 1,
                    })?;
                    anyhow::bail!("failed after bump")
                })
                .build()
        });
        let (_, provider) = create_store_context(
            Counter::default(),
            Some(factory),
            StoreOptions::new().middleware(recorder),
        );
        provider
    }

    #[test]
    fn test_recorder_and_harness() {
        let recorder = CallRecorder::new();
        let mut harness = StoreHarness::mount(&counter(&recorder)).unwrap();
        assert!(recorder.is_empty());

        harness.call("add", args![2]).unwrap();
        harness.call("add", args![3]).unwrap();

        assert_eq!(harness.state().count, 5);
        assert_eq!(
            harness.states(),
            vec![Counter { count: 0 }, Counter { count: 2 }, Counter { count: 5 }]
        );
        assert_called!(recorder, "add");
        assert_called!(recorder, "add", args![3]);
        assert_not_called!(recorder, "remove");
        assert_eq!(count_called!(recorder, "add"), 2);
    }

    #[test]
    fn test_call_flushes_when_action_fails() {
        let recorder = CallRecorder::new();
        let mut harness = StoreHarness::mount(&counter(&recorder)).unwrap();

        let err = harness.call("bump_then_fail", args![]).unwrap_err();
        assert_eq!(err.to_string(), "failed after bump");
        assert!(!harness.root().has_pending_updates());
        assert_eq!(harness.state().count, 1);
    }

    #[test]
    fn test_drain_empties_record() {
        let recorder = CallRecorder::new();
        let mut harness = StoreHarness::mount(&counter(&recorder)).unwrap();
        harness.call("add", args![1]).unwrap();

        let calls = recorder.drain();
        assert_eq!(
            calls,
            vec![RecordedCall {
                action: "add".into(),
                args: args![1]
            }]
        );
        assert!(recorder.is_empty());
    }
}
