//! Mapping action factories onto callable store tables
//!
//! Two paths exist. The default path runs once per context, before any
//! provider exists, and produces actions that always fail with
//! [`NoProviderError`]. The dispatch path runs on every provider render with
//! the live [`ContextReference`] and routes each call through the
//! middleware pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::action::{ActionFactory, Actions};
use crate::error::{NoProviderError, StoreError};
use crate::middleware::{run_with_middleware, Middleware, MiddlewareMeta};
use crate::outcome::Outcome;
use crate::reference::{ContextReference, SetState};
use crate::resolver::Stores;
use crate::value::{Args, Meta};
use crate::State;

type BoundFn = dyn Fn(Args) -> anyhow::Result<Outcome>;

/// Callable surface of a published store, keyed by action name.
#[derive(Clone, Default)]
pub struct ActionTable {
    entries: Rc<BTreeMap<String, Rc<BoundFn>>>,
}

impl ActionTable {
    /// Invoke an action by name.
    pub fn call(&self, name: &str, args: Args) -> anyhow::Result<Outcome> {
        let action = self
            .entries
            .get(name)
            .ok_or_else(|| StoreError::UnknownAction(name.to_string()))?;
        action(args)
    }

    /// Handle to a single action, if defined
    pub fn get(&self, name: &str) -> Option<BoundAction> {
        self.entries
            .get_key_value(name)
            .map(|(name, f)| BoundAction {
                name: Rc::from(name.as_str()),
                f: Rc::clone(f),
            })
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
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// A single store action, detached from its table.
#[derive(Clone)]
pub struct BoundAction {
    name: Rc<str>,
    f: Rc<BoundFn>,
}

impl BoundAction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Args) -> anyhow::Result<Outcome> {
        (self.f)(args)
    }
}

impl fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundAction").field(&self.name).finish()
    }
}

/// Build the action table of the default store.
///
/// The factory runs once against a reference whose setter is detached.
/// Every produced action is wrapped so that nothing runs until it is
/// called, and calling it fails with [`NoProviderError::Action`]. Listing
/// the names never fails.
pub fn map_default<S: State>(
    initial_state: &S,
    meta: &Rc<Meta>,
    factory: Option<&ActionFactory<S>>,
) -> ActionTable {
    let Some(factory) = factory else {
        return ActionTable::default();
    };
    let reference = ContextReference {
        state: Rc::new(initial_state.clone()),
        set_state: SetState::detached(),
        stores: Stores::default(),
        meta: Rc::clone(meta),
    };
    let actions = factory.produce(&reference);

    let entries = actions
        .names()
        .map(|name| {
            let action = name.to_string();
            let f: Rc<BoundFn> = Rc::new(move |_args: Args| -> anyhow::Result<Outcome> {
                tracing::debug!(action = %action, "action invoked without a provider");
                Err(NoProviderError::Action {
                    action: action.clone(),
                }
                .into())
            });
            (name.to_string(), f)
        })
        .collect();

    ActionTable {
        entries: Rc::new(entries),
    }
}

/// Build the live action table for one provider render.
///
/// The raw table is produced in full first; every bound callable then
/// shares it, so actions can reach their siblings by name through the
/// first parameter. Each call enters the middleware pipeline with the
/// action's name and the store's static meta.
pub fn map_dispatch<S: State>(
    reference: &ContextReference<S>,
    factory: Option<&ActionFactory<S>>,
    middleware: Rc<[Middleware]>,
) -> ActionTable {
    let Some(factory) = factory else {
        return ActionTable::default();
    };
    let actions = factory.produce(reference);

    let entries = actions
        .names()
        .map(|name| {
            let meta = MiddlewareMeta::new(name, Rc::clone(&reference.meta));
            let chain = Rc::clone(&middleware);
            let table: Actions = actions.clone();
            let f: Rc<BoundFn> =
                Rc::new(move |args: Args| run_with_middleware(&chain, &table, args, &meta));
            (name.to_string(), f)
        })
        .collect();

    ActionTable {
        entries: Rc::new(entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        count: i32,
    }

    fn counter_factory() -> ActionFactory<Counter> {
        ActionFactory::new(|reference: &ContextReference<Counter>| {
            let state = Rc::clone(&reference.state);
            let set_state = reference.set_state.clone();
            Actions::builder()
                .action("increment", move |_, _| {
                    set_state.set(Counter {
                        count: state.count + 1,
                    })?;
                    Ok(())
                })
                .action("peek", |_, _| Ok("peeked"))
                .build()
        })
    }

    #[test]
    fn test_absent_factory_maps_to_empty_table() {
        let meta = Rc::new(Meta::new());
        let table = map_default(&Counter { count: 0 }, &meta, None);
        assert!(table.is_empty());
        assert!(table.get("increment").is_none());
    }

    #[test]
    fn test_default_actions_are_named_but_fail() {
        let meta = Rc::new(Meta::new());
        let factory = counter_factory();
        let table = map_default(&Counter { count: 0 }, &meta, Some(&factory));

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["increment", "peek"]);
        for name in ["increment", "peek"] {
            let err = table.call(name, args![]).unwrap_err();
            assert_eq!(
                err.downcast_ref::<NoProviderError>(),
                Some(&NoProviderError::Action {
                    action: name.to_string()
                })
            );
        }
    }

    #[test]
    fn test_default_factory_sees_meta() {
        let meta = Rc::new(Meta::new().with("store", "counter"));
        let seen = Rc::new(std::cell::RefCell::new(None));
        let factory = {
            let seen = seen.clone();
            ActionFactory::new(move |reference: &ContextReference<Counter>| {
                *seen.borrow_mut() = reference.meta.get("store").cloned();
                assert!(!reference.set_state.is_live());
                Actions::default()
            })
        };
        map_default(&Counter { count: 0 }, &meta, Some(&factory));
        assert_eq!(*seen.borrow(), Some(json!("counter")));
    }

    #[test]
    fn test_static_actions_dispatch() {
        let actions = Actions::builder()
            .action("greet", |_, args| Ok(format!("hi {}", args.get::<String>(0)?)))
            .build();
        let factory = ActionFactory::from(actions);
        let reference = ContextReference {
            state: Rc::new(Counter { count: 0 }),
            set_state: SetState::detached(),
            stores: Stores::default(),
            meta: Rc::new(Meta::new()),
        };
        let table = map_dispatch(&reference, Some(&factory), Rc::from(Vec::new()));
        let greet = table.get("greet").unwrap();
        assert_eq!(greet.name(), "greet");
        assert_eq!(
            greet.call(args!["bob"]).unwrap().into_ready().unwrap(),
            json!("hi bob")
        );
    }
}
