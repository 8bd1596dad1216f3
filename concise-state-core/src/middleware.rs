//! Middleware pipeline wrapping every dispatched action
//!
//! A middleware receives a [`Next`] continuation, the action arguments and a
//! [`MiddlewareMeta`]. It may inspect or rewrite the arguments, call
//! `next.run(args)` to continue, post-process the outcome, or return without
//! calling `next` to abort the action.
//!
//! ```ignore
//! use concise_state_core::{Middleware, Outcome};
//!
//! let audit = Middleware::new(|next, args, meta| {
//!     tracing::info!(action = %meta.action_name(), %args, "before");
//!     let outcome = next.run(args)?;
//!     outcome.then(|value| {
//!         tracing::info!(%value, "after");
//!         Ok(value)
//!     })
//! });
//! ```
//!
//! Middleware that needs other stores is declared with [`create_middleware`];
//! its contexts are resolved on every render of the provider that uses it.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::action::Actions;
use crate::error::StoreError;
use crate::host::RenderCx;
use crate::outcome::Outcome;
use crate::resolver::{resolve_stores, Contexts, Stores};
use crate::value::{Args, Meta};

type MiddlewareFn = dyn Fn(Next, Args, &MiddlewareMeta) -> anyhow::Result<Outcome>;

/// Metadata visible to every middleware stage of one dispatch.
#[derive(Clone, Debug)]
pub struct MiddlewareMeta {
    action_name: Rc<str>,
    meta: Rc<Meta>,
    stores: Stores,
}

impl MiddlewareMeta {
    pub fn new(action_name: impl Into<Rc<str>>, meta: Rc<Meta>) -> Self {
        Self {
            action_name: action_name.into(),
            meta,
            stores: Stores::default(),
        }
    }

    /// Name of the dispatched action; fixed for the whole chain
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Static metadata of the store
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Shorthand for `meta().get(key)`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Stores resolved for a store-aware middleware; empty for plain middleware
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    fn with_stores(&self, stores: Stores) -> Self {
        Self {
            action_name: Rc::clone(&self.action_name),
            meta: Rc::clone(&self.meta),
            stores,
        }
    }
}

/// A concrete pipeline stage.
#[derive(Clone)]
pub struct Middleware(Rc<MiddlewareFn>);

impl Middleware {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Next, Args, &MiddlewareMeta) -> anyhow::Result<Outcome> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, next: Next, args: Args, meta: &MiddlewareMeta) -> anyhow::Result<Outcome> {
        (self.0)(next, args, meta)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Middleware that depends on other stores.
///
/// Built with [`create_middleware`]. Each render, its contexts are resolved
/// and the resulting [`Stores`] reach `init` through
/// [`MiddlewareMeta::stores`].
#[derive(Clone)]
pub struct MiddlewareCreator {
    contexts: Contexts,
    init: Rc<MiddlewareFn>,
}

impl MiddlewareCreator {
    pub fn contexts(&self) -> &Contexts {
        &self.contexts
    }

    fn bind(&self, stores: Stores) -> Middleware {
        let init = Rc::clone(&self.init);
        Middleware::new(move |next, args, meta| init(next, args, &meta.with_stores(stores.clone())))
    }
}

impl fmt::Debug for MiddlewareCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareCreator")
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

/// Declare a store-aware middleware.
///
/// ```ignore
/// let log_to_store = create_middleware(
///     |next, args, meta| {
///         let logs = meta.stores().store::<Logs>("logs")?;
///         logs.call("write", args![format!("calling {}", meta.action_name())])?;
///         next.run(args)
///     },
///     Contexts::new().with("logs", &logs_context),
/// );
/// ```
pub fn create_middleware<F>(init: F, required_contexts: Contexts) -> MiddlewareCreator
where
    F: Fn(Next, Args, &MiddlewareMeta) -> anyhow::Result<Outcome> + 'static,
{
    MiddlewareCreator {
        contexts: required_contexts,
        init: Rc::new(init),
    }
}

/// One entry of a store's middleware list.
#[derive(Clone, Debug)]
pub enum MiddlewareEntry {
    Plain(Middleware),
    Creator(MiddlewareCreator),
}

impl From<Middleware> for MiddlewareEntry {
    fn from(middleware: Middleware) -> Self {
        MiddlewareEntry::Plain(middleware)
    }
}

impl From<MiddlewareCreator> for MiddlewareEntry {
    fn from(creator: MiddlewareCreator) -> Self {
        MiddlewareEntry::Creator(creator)
    }
}

/// Turn a middleware list into concrete stages, preserving order.
///
/// Creators have their contexts resolved against the current render; plain
/// middleware passes through unchanged.
pub fn resolve_middleware(cx: &mut RenderCx<'_>, entries: &[MiddlewareEntry]) -> Rc<[Middleware]> {
    entries
        .iter()
        .map(|entry| match entry {
            MiddlewareEntry::Plain(middleware) => middleware.clone(),
            MiddlewareEntry::Creator(creator) => creator.bind(resolve_stores(cx, &creator.contexts)),
        })
        .collect()
}

/// Continuation handed to a middleware stage.
///
/// Running it invokes the remaining stages and finally the action itself.
#[derive(Clone)]
pub struct Next {
    chain: Rc<[Middleware]>,
    index: usize,
    actions: Actions,
    meta: MiddlewareMeta,
}

impl Next {
    /// Continue with (possibly rewritten) arguments.
    pub fn run(&self, args: Args) -> anyhow::Result<Outcome> {
        dispatch_from(&self.chain, self.index, &self.actions, args, &self.meta)
    }

    /// Stages left after this continuation, excluding the action
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("action", &self.meta.action_name())
            .field("index", &self.index)
            .field("stages", &self.chain.len())
            .finish()
    }
}

/// Run one action invocation through `chain`.
///
/// Stages run strictly in order. Errors from any stage or from the action
/// propagate to the caller unchanged.
pub fn run_with_middleware(
    chain: &Rc<[Middleware]>,
    actions: &Actions,
    args: Args,
    meta: &MiddlewareMeta,
) -> anyhow::Result<Outcome> {
    dispatch_from(chain, 0, actions, args, meta)
}

fn dispatch_from(
    chain: &Rc<[Middleware]>,
    index: usize,
    actions: &Actions,
    args: Args,
    meta: &MiddlewareMeta,
) -> anyhow::Result<Outcome> {
    match chain.get(index) {
        Some(stage) => {
            tracing::trace!(action = %meta.action_name(), stage = index, "middleware");
            let next = Next {
                chain: Rc::clone(chain),
                index: index + 1,
                actions: actions.clone(),
                meta: meta.clone(),
            };
            stage.call(next, args, meta)
        }
        None => {
            let action = actions
                .get(meta.action_name())
                .ok_or_else(|| StoreError::UnknownAction(meta.action_name().to_string()))?;
            tracing::trace!(action = %meta.action_name(), "executing action");
            action(actions, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::json;
    use std::cell::RefCell;

    type Trace = Rc<RefCell<Vec<String>>>;

    fn recording(label: &'static str, trace: &Trace) -> Middleware {
        let trace = trace.clone();
        Middleware::new(move |next, args, meta| {
            trace
                .borrow_mut()
                .push(format!("{label}:{}:{}", meta.action_name(), args));
            next.run(args)
        })
    }

    fn actions(trace: &Trace) -> Actions {
        let trace = trace.clone();
        Actions::builder()
            .action("z", move |_, args| {
                let n: i64 = args.get(0)?;
                trace.borrow_mut().push(format!("z({n})"));
                Ok(n + 1)
            })
            .build()
    }

    fn meta(name: &str) -> MiddlewareMeta {
        MiddlewareMeta::new(name, Rc::new(Meta::new().with("store", "test")))
    }

    #[test]
    fn test_empty_chain_runs_action() {
        let trace = Trace::default();
        let chain: Rc<[Middleware]> = Rc::from(Vec::new());
        let outcome = run_with_middleware(&chain, &actions(&trace), args![1], &meta("z")).unwrap();
        assert_eq!(outcome.into_ready().unwrap(), json!(2));
        assert_eq!(*trace.borrow(), vec!["z(1)"]);
    }

    #[test]
    fn test_stages_run_in_order() {
        let trace = Trace::default();
        let chain: Rc<[Middleware]> = vec![recording("a", &trace), recording("b", &trace)].into();
        let outcome =
            run_with_middleware(&chain, &actions(&trace), args![42], &meta("z")).unwrap();
        assert_eq!(outcome.into_ready().unwrap(), json!(43));
        assert_eq!(*trace.borrow(), vec!["a:z:[42]", "b:z:[42]", "z(42)"]);
    }

    #[test]
    fn test_stage_can_rewrite_args() {
        let trace = Trace::default();
        let doubler = Middleware::new(|next, args, _| {
            let n: i64 = args.get(0)?;
            next.run(args![n * 2])
        });
        let chain: Rc<[Middleware]> = vec![doubler, recording("after", &trace)].into();
        let outcome = run_with_middleware(&chain, &actions(&trace), args![5], &meta("z")).unwrap();
        assert_eq!(outcome.into_ready().unwrap(), json!(11));
        assert_eq!(*trace.borrow(), vec!["after:z:[10]", "z(10)"]);
    }

    #[test]
    fn test_short_circuit_skips_rest() {
        let trace = Trace::default();
        let gate = Middleware::new(|_, _, _| Ok(Outcome::from(json!("blocked"))));
        let chain: Rc<[Middleware]> = vec![recording("a", &trace), gate, recording("c", &trace)].into();
        let outcome = run_with_middleware(&chain, &actions(&trace), args![1], &meta("z")).unwrap();
        assert_eq!(outcome.into_ready().unwrap(), json!("blocked"));
        assert_eq!(*trace.borrow(), vec!["a:z:[1]"]);
    }

    #[test]
    fn test_errors_propagate_through_stages() {
        let trace = Trace::default();
        let chain: Rc<[Middleware]> = vec![recording("a", &trace)].into();
        let err = run_with_middleware(&chain, &actions(&trace), args!["nan"], &meta("z"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidArgument { index: 0, .. })
        ));
    }

    #[test]
    fn test_meta_is_visible_to_stages() {
        let seen = Rc::new(RefCell::new(None));
        let probe = {
            let seen = seen.clone();
            Middleware::new(move |next, args, meta| {
                *seen.borrow_mut() = meta.get("store").cloned();
                assert!(meta.stores().is_empty());
                next.run(args)
            })
        };
        let chain: Rc<[Middleware]> = vec![probe].into();
        run_with_middleware(&chain, &actions(&Trace::default()), args![0], &meta("z")).unwrap();
        assert_eq!(*seen.borrow(), Some(json!("test")));
    }

    #[test]
    fn test_unknown_action_after_chain() {
        let chain: Rc<[Middleware]> = Rc::from(Vec::new());
        let err = run_with_middleware(&chain, &Actions::default(), args![], &meta("nope"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::UnknownAction(name)) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn test_async_stage_makes_dispatch_pending() {
        let trace = Trace::default();
        let deferred = Middleware::new(|next, args, _| {
            Ok(Outcome::pending(async move {
                tokio::task::yield_now().await;
                next.run(args)?.resolve().await
            }))
        });
        let chain: Rc<[Middleware]> = vec![deferred, recording("b", &trace)].into();
        let outcome = run_with_middleware(&chain, &actions(&trace), args![1], &meta("z")).unwrap();
        assert!(outcome.is_pending());
        assert!(trace.borrow().is_empty());
        assert_eq!(outcome.resolve().await.unwrap(), json!(2));
        assert_eq!(*trace.borrow(), vec!["b:z:[1]", "z(1)"]);
    }
}
