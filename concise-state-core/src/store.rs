//! Store contexts and their providers
//!
//! [`create_store_context`] returns a context handle and a provider. Readers
//! of the context see the store published by the nearest mounted provider;
//! without one they see the default store, whose actions always fail with
//! [`NoProviderError`](crate::NoProviderError).

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::action::ActionFactory;
use crate::host::{Component, Context, Element, RenderCx};
use crate::mapping::{map_default, map_dispatch, ActionTable, BoundAction};
use crate::middleware::{resolve_middleware, MiddlewareEntry};
use crate::outcome::Outcome;
use crate::reference::{ContextReference, SetState};
use crate::resolver::{resolve_stores, Contexts};
use crate::value::{Args, Meta};
use crate::State;

/// Published value of a store: current state plus its actions.
///
/// Dereferences to the state, so fields read as `store.count`.
pub struct Store<S> {
    state: Rc<S>,
    actions: ActionTable,
}

impl<S> Store<S> {
    pub fn new(state: Rc<S>, actions: ActionTable) -> Self {
        Self { state, actions }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Shared handle to the state snapshot
    pub fn state_rc(&self) -> Rc<S> {
        Rc::clone(&self.state)
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Invoke an action by name.
    pub fn call(&self, name: &str, args: Args) -> anyhow::Result<Outcome> {
        self.actions.call(name, args)
    }

    pub fn action(&self, name: &str) -> Option<BoundAction> {
        self.actions.get(name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains(name)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.names()
    }
}

impl<S> Deref for Store<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            actions: self.actions.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("actions", &self.actions)
            .finish()
    }
}

/// Context handle broadcasting a [`Store`]
pub type StoreContext<S> = Context<Store<S>>;

/// Optional inputs of [`create_store_context`].
#[derive(Clone, Debug, Default)]
pub struct StoreOptions {
    /// Other contexts injected into `ContextReference::stores`
    pub contexts: Contexts,
    /// Middleware, outermost first
    pub middleware: Vec<MiddlewareEntry>,
    /// Static metadata shared with actions and middleware
    pub meta: Meta,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject another context under `name`.
    pub fn context<T: 'static>(mut self, name: impl Into<String>, context: &Context<T>) -> Self {
        self.contexts.insert(name, context);
        self
    }

    pub fn contexts(mut self, contexts: Contexts) -> Self {
        self.contexts = contexts;
        self
    }

    /// Append a middleware (plain or store-aware).
    pub fn middleware(mut self, middleware: impl Into<MiddlewareEntry>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }
}

/// Contexts passed positionally, as older callers did.
impl From<Contexts> for StoreOptions {
    fn from(contexts: Contexts) -> Self {
        Self {
            contexts,
            ..Self::default()
        }
    }
}

struct ProviderSpec<S: 'static> {
    context: StoreContext<S>,
    initial_state: S,
    factory: Option<ActionFactory<S>>,
    contexts: Contexts,
    middleware: Vec<MiddlewareEntry>,
    meta: Rc<Meta>,
}

/// Component owning one live state cell and publishing its store.
///
/// Every instance placed in a tree owns its own state. The provider adds
/// nothing of its own to the tree: its children render unchanged beneath
/// it.
pub struct StoreProvider<S: 'static> {
    spec: Rc<ProviderSpec<S>>,
}

impl<S: State> StoreProvider<S> {
    /// The context this provider publishes to
    pub fn context(&self) -> &StoreContext<S> {
        &self.spec.context
    }

    /// A fresh provider element with no children yet.
    pub fn element(&self) -> Element {
        Element::new(self.clone())
    }

    /// A provider element wrapping `children`.
    pub fn wrap(&self, children: impl IntoIterator<Item = Element>) -> Element {
        self.element().children(children)
    }
}

impl<S: 'static> Clone for StoreProvider<S> {
    fn clone(&self) -> Self {
        Self {
            spec: Rc::clone(&self.spec),
        }
    }
}

impl<S: 'static> fmt::Debug for StoreProvider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreProvider")
            .field("context", &self.spec.context)
            .field("contexts", &self.spec.contexts)
            .field("middleware", &self.spec.middleware.len())
            .finish_non_exhaustive()
    }
}

impl<S: State> Component for StoreProvider<S> {
    fn render(&self, cx: &mut RenderCx<'_>) -> anyhow::Result<()> {
        let spec = &self.spec;
        let (state, setter) = cx.use_state(|| spec.initial_state.clone());
        let stores = resolve_stores(cx, &spec.contexts);
        let middleware = resolve_middleware(cx, &spec.middleware);

        let reference = ContextReference {
            state: Rc::clone(&state),
            set_state: SetState::live(setter),
            stores,
            meta: Rc::clone(&spec.meta),
        };
        let actions = map_dispatch(&reference, spec.factory.as_ref(), middleware);
        tracing::trace!(
            path = ?cx.path(),
            actions = actions.len(),
            "publishing store"
        );
        cx.provide(&spec.context, Store::new(state, actions));
        Ok(())
    }

    fn name(&self) -> &str {
        "store-provider"
    }
}

/// Create a store context and its provider.
///
/// The context starts out holding the default store: `initial_state` plus
/// actions that fail with [`NoProviderError`](crate::NoProviderError).
/// Mounting the provider gives its descendants a live store instead.
///
/// # Example
/// ```
/// use concise_state_core::host::{Element, Root};
/// use concise_state_core::{
///     args, create_store_context, ActionFactory, Actions, ContextReference, StoreOptions,
/// };
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Counter {
///     count: i32,
/// }
///
/// let (context, provider) = create_store_context(
///     Counter { count: 0 },
///     Some(ActionFactory::new(|r: &ContextReference<Counter>| {
///         let (state, set_state) = (r.state.clone(), r.set_state.clone());
///         Actions::builder()
///             .action("inc", move |_, _| {
///                 set_state.set(Counter { count: state.count + 1 })?;
///                 Ok(())
///             })
///             .build()
///     })),
///     StoreOptions::default(),
/// );
///
/// // Without a provider the store is readable but its actions fail.
/// assert_eq!(context.default_value().count, 0);
/// assert!(context.default_value().call("inc", args![]).is_err());
///
/// let seen = Rc::new(Cell::new(0));
/// let consumer = {
///     let (context, seen) = (context.clone(), seen.clone());
///     Element::consumer(move |cx| {
///         let store = cx.use_context(&context);
///         seen.set(store.count);
///         if store.count < 2 {
///             store.call("inc", args![])?;
///         }
///         Ok(())
///     })
/// };
/// let _root = Root::mount(provider.wrap([consumer])).unwrap();
/// assert_eq!(seen.get(), 2);
/// ```
pub fn create_store_context<S: State>(
    initial_state: S,
    actions: Option<ActionFactory<S>>,
    options: StoreOptions,
) -> (StoreContext<S>, StoreProvider<S>) {
    let StoreOptions {
        contexts,
        middleware,
        meta,
    } = options;
    let meta = Rc::new(meta);

    let default_actions = map_default(&initial_state, &meta, actions.as_ref());
    let default_store = Store::new(Rc::new(initial_state.clone()), default_actions);
    let context = Context::new(default_store);

    tracing::debug!(
        state = std::any::type_name::<S>(),
        contexts = contexts.len(),
        middleware = middleware.len(),
        "created store context"
    );

    let provider = StoreProvider {
        spec: Rc::new(ProviderSpec {
            context: context.clone(),
            initial_state,
            factory: actions,
            contexts,
            middleware,
            meta,
        }),
    };
    (context, provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Actions;
    use crate::error::NoProviderError;
    use crate::host::Root;
    use crate::args;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        count: i32,
    }

    fn counter_actions() -> ActionFactory<Counter> {
        ActionFactory::new(|r: &ContextReference<Counter>| {
            let (state, set_state) = (Rc::clone(&r.state), r.set_state.clone());
            Actions::builder()
                .action("inc", move |_, _| {
                    set_state.set(Counter {
                        count: state.count + 1,
                    })?;
                    Ok(())
                })
                .build()
        })
    }

    #[test]
    fn test_returns_context_and_provider() {
        let (context, provider) = create_store_context(5u8, None, StoreOptions::default());
        assert_eq!(**context.default_value(), 5);
        assert_eq!(provider.context().id(), context.id());
        assert!(context.default_value().actions().is_empty());
    }

    #[test]
    fn test_default_store_without_provider() {
        let (context, _provider) =
            create_store_context(Counter { count: 0 }, Some(counter_actions()), StoreOptions::new());
        let store = context.default_value();
        assert!(store.has_action("inc"));
        let err = store.call("inc", args![]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NoProviderError>(),
            Some(&NoProviderError::Action {
                action: "inc".into()
            })
        );
    }

    #[test]
    fn test_sequential_updates_publish_in_order() {
        let (context, provider) =
            create_store_context(Counter { count: 0 }, Some(counter_actions()), StoreOptions::new());
        let latest = Rc::new(RefCell::new(None));
        let history = Rc::new(RefCell::new(Vec::new()));

        let consumer = {
            let (context, latest, history) = (context.clone(), latest.clone(), history.clone());
            Element::consumer(move |cx| {
                let store = cx.use_context(&context);
                history.borrow_mut().push(store.count);
                *latest.borrow_mut() = Some(store);
                Ok(())
            })
        };

        let mut root = Root::mount(provider.wrap([consumer])).unwrap();
        for _ in 0..2 {
            let store = latest.borrow().clone().unwrap();
            store.call("inc", args![]).unwrap();
            root.flush().unwrap();
        }
        assert_eq!(*history.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_providers_own_separate_state() {
        let (context, provider) =
            create_store_context(Counter { count: 0 }, Some(counter_actions()), StoreOptions::new());
        let stores = Rc::new(RefCell::new(Vec::new()));

        let reader = |slot: usize| {
            let (context, stores) = (context.clone(), stores.clone());
            Element::consumer(move |cx| {
                let store = cx.use_context(&context);
                let mut stores = stores.borrow_mut();
                if stores.len() <= slot {
                    stores.resize(slot + 1, None);
                }
                stores[slot] = Some(store);
                Ok(())
            })
        };

        let tree = Element::consumer(|_| Ok(()))
            .child(provider.wrap([reader(0)]))
            .child(provider.wrap([reader(1)]));
        let mut root = Root::mount(tree).unwrap();

        let first = stores.borrow()[0].clone().unwrap();
        first.call("inc", args![]).unwrap();
        root.flush().unwrap();

        let stores = stores.borrow();
        assert_eq!(stores[0].as_ref().unwrap().count, 1);
        assert_eq!(stores[1].as_ref().unwrap().count, 0);
    }
}
