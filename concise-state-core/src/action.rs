//! Action tables and the factories that produce them

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use serde::Serialize;

use crate::error::StoreError;
use crate::outcome::Outcome;
use crate::reference::ContextReference;
use crate::value::Args;

/// Implementation of a single action.
///
/// The first parameter is the table the action belongs to, so an action can
/// call its siblings by name.
pub type ActionFn = dyn Fn(&Actions, Args) -> anyhow::Result<Outcome>;

/// Raw, name-keyed table of action implementations produced by a factory.
///
/// Calls made through this table bypass middleware; the store's published
/// [`ActionTable`](crate::ActionTable) is the middleware-aware surface.
#[derive(Clone, Default)]
pub struct Actions {
    entries: Rc<BTreeMap<String, Rc<ActionFn>>>,
}

impl Actions {
    pub fn builder() -> ActionsBuilder {
        ActionsBuilder::default()
    }

    /// Invoke a sibling action directly.
    pub fn call(&self, name: &str, args: Args) -> anyhow::Result<Outcome> {
        let action = self
            .get(name)
            .ok_or_else(|| StoreError::UnknownAction(name.to_string()))?;
        action(self, args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<ActionFn>> {
        self.entries.get(name).cloned()
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Builder for [`Actions`].
///
/// # Example
/// ```
/// use concise_state_core::{args, Actions};
///
/// let actions = Actions::builder()
///     .action("double", |_, args| Ok(args.get::<i64>(0)? * 2))
///     .action("quadruple", |this, args| {
///         let twice: i64 = this.call("double", args)?.ready_as()?;
///         Ok(twice * 2)
///     })
///     .build();
///
/// let result = actions.call("quadruple", args![3]).unwrap();
/// assert_eq!(result.ready_as::<i64>().unwrap(), 12);
/// ```
#[derive(Default)]
pub struct ActionsBuilder {
    entries: BTreeMap<String, Rc<ActionFn>>,
}

impl ActionsBuilder {
    /// Add a synchronous action whose result is serialized into the outcome.
    pub fn action<F, R>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Actions, Args) -> anyhow::Result<R> + 'static,
        R: Serialize,
    {
        self.raw(name, move |this, args| Outcome::from_serialize(f(this, args)?))
    }

    /// Add an asynchronous action. Its outcome is always pending.
    pub fn action_async<F, Fut, R>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Actions, Args) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
        R: Serialize,
    {
        self.raw(name, move |this, args| {
            let future = f(this, args);
            Ok(Outcome::pending(async move {
                Ok::<_, anyhow::Error>(serde_json::to_value(future.await?)?)
            }))
        })
    }

    /// Add an action that builds its [`Outcome`] itself.
    pub fn raw<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Actions, Args) -> anyhow::Result<Outcome> + 'static,
    {
        let name = name.into();
        if self.entries.insert(name.clone(), Rc::new(f)).is_some() {
            tracing::warn!(action = %name, "duplicate action name; keeping the last definition");
        }
        self
    }

    pub fn build(self) -> Actions {
        Actions {
            entries: Rc::new(self.entries),
        }
    }
}

type DynamicFactory<S> = dyn Fn(&ContextReference<S>) -> Actions;

/// Source of a store's actions.
///
/// A dynamic factory runs once per render with a fresh
/// [`ContextReference`]; a static table is shared as is.
pub enum ActionFactory<S> {
    Dynamic(Rc<DynamicFactory<S>>),
    Static(Actions),
}

impl<S> ActionFactory<S> {
    /// Factory closing over the per-render context reference.
    ///
    /// # Example
    /// ```ignore
    /// let factory = ActionFactory::new(|reference: &ContextReference<Counter>| {
    ///     let ContextReference { state, set_state, .. } = reference.clone();
    ///     Actions::builder()
    ///         .action("increment", move |_, _| {
    ///             set_state.set(Counter { count: state.count + 1 })?;
    ///             Ok(())
    ///         })
    ///         .build()
    /// });
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ContextReference<S>) -> Actions + 'static,
    {
        ActionFactory::Dynamic(Rc::new(f))
    }

    pub(crate) fn produce(&self, reference: &ContextReference<S>) -> Actions {
        match self {
            ActionFactory::Dynamic(f) => f(reference),
            ActionFactory::Static(actions) => actions.clone(),
        }
    }
}

impl<S> Clone for ActionFactory<S> {
    fn clone(&self) -> Self {
        match self {
            ActionFactory::Dynamic(f) => ActionFactory::Dynamic(Rc::clone(f)),
            ActionFactory::Static(actions) => ActionFactory::Static(actions.clone()),
        }
    }
}

impl<S> From<Actions> for ActionFactory<S> {
    fn from(actions: Actions) -> Self {
        ActionFactory::Static(actions)
    }
}

impl<S> fmt::Debug for ActionFactory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFactory::Dynamic(_) => f.write_str("ActionFactory::Dynamic"),
            ActionFactory::Static(actions) => {
                f.debug_tuple("ActionFactory::Static").field(actions).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::json;

    #[test]
    fn test_call_unknown_action() {
        let actions = Actions::builder().build();
        let err = actions.call("missing", args![]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::UnknownAction(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_name_keeps_last() {
        let actions = Actions::builder()
            .action("answer", |_, _| Ok(1))
            .action("answer", |_, _| Ok(42))
            .build();
        assert_eq!(actions.len(), 1);
        let value = actions.call("answer", args![]).unwrap().into_ready().unwrap();
        assert_eq!(value, json!(42));
    }

    #[test]
    fn test_names_are_sorted() {
        let actions = Actions::builder()
            .action("b", |_, _| Ok(()))
            .action("a", |_, _| Ok(()))
            .build();
        assert_eq!(actions.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(actions.contains("a"));
        assert!(!actions.contains("c"));
    }

    #[test]
    fn test_user_error_passes_through() {
        #[derive(Debug, thiserror::Error)]
        #[error("out of stock")]
        struct OutOfStock;

        let actions = Actions::builder()
            .action("buy", |_, _| -> anyhow::Result<()> { Err(OutOfStock.into()) })
            .build();
        let err = actions.call("buy", args![]).unwrap_err();
        assert!(err.downcast_ref::<OutOfStock>().is_some());
    }

    #[tokio::test]
    async fn test_async_action_is_pending() {
        let actions = Actions::builder()
            .action_async("fetch", |_, args| async move {
                let id: u32 = args.get(0)?;
                Ok::<_, anyhow::Error>(format!("item-{id}"))
            })
            .build();
        let outcome = actions.call("fetch", args![7]).unwrap();
        assert!(outcome.is_pending());
        assert_eq!(outcome.resolve_as::<String>().await.unwrap(), "item-7");
    }
}
