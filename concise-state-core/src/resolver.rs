//! Resolving injected contexts into their current values

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::StoreError;
use crate::host::{Context, RenderCx};
use crate::store::Store;
use crate::State;

trait ErasedContext {
    fn read(&self, cx: &mut RenderCx<'_>) -> Rc<dyn Any>;
    fn value_type(&self) -> &'static str;
}

impl<T: 'static> ErasedContext for Context<T> {
    fn read(&self, cx: &mut RenderCx<'_>) -> Rc<dyn Any> {
        let value: Rc<T> = cx.use_context(self);
        value
    }

    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Named external context handles to inject into a store or middleware.
///
/// Each entry may hold a context of a different type; its value is recovered
/// with [`Stores::get`] or [`Stores::store`].
#[derive(Clone, Default)]
pub struct Contexts {
    entries: Vec<(String, Rc<dyn ErasedContext>)>,
}

impl Contexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the context injected under `name`.
    pub fn with<T: 'static>(mut self, name: impl Into<String>, context: &Context<T>) -> Self {
        self.insert(name, context);
        self
    }

    pub fn insert<T: 'static>(&mut self, name: impl Into<String>, context: &Context<T>) {
        let name = name.into();
        let context: Rc<dyn ErasedContext> = Rc::new(context.clone());
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = context,
            None => self.entries.push((name, context)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Contexts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, context)| (name, context.value_type())),
            )
            .finish()
    }
}

/// Current values of a set of injected contexts.
#[derive(Clone, Default)]
pub struct Stores {
    values: Rc<BTreeMap<String, Rc<dyn Any>>>,
}

impl Stores {
    /// Value injected under `name`.
    pub fn get<T: 'static>(&self, name: &str) -> Result<Rc<T>, StoreError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| StoreError::UnknownStore(name.to_string()))?;
        Rc::clone(value)
            .downcast::<T>()
            .map_err(|_| StoreError::StoreTypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Store injected under `name`.
    ///
    /// Shorthand for `get::<Store<S>>(name)`.
    pub fn store<S: State>(&self, name: &str) -> Result<Rc<Store<S>>, StoreError> {
        self.get::<Store<S>>(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Read the current value of every context in `contexts`.
///
/// Must run during the render of the component that injects them: each
/// read subscribes that render to the context. Results are never cached, so
/// every render sees live values.
pub fn resolve_stores(cx: &mut RenderCx<'_>, contexts: &Contexts) -> Stores {
    if contexts.is_empty() {
        return Stores::default();
    }
    let values = contexts
        .entries
        .iter()
        .map(|(name, context)| (name.clone(), context.read(cx)))
        .collect();
    Stores {
        values: Rc::new(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Element, Root};
    use std::cell::RefCell;

    #[test]
    fn test_resolves_defaults_and_provided_values() {
        let name = Context::new("anonymous".to_string());
        let level = Context::new(1u8);
        let contexts = Contexts::new().with("name", &name).with("level", &level);
        assert_eq!(contexts.names().collect::<Vec<_>>(), vec!["name", "level"]);

        let resolved = Rc::new(RefCell::new(None));
        let reader = {
            let resolved = resolved.clone();
            Element::consumer(move |cx| {
                *resolved.borrow_mut() = Some(resolve_stores(cx, &contexts));
                Ok(())
            })
        };
        let provider = {
            let level = level.clone();
            Element::consumer(move |cx| {
                cx.provide(&level, 9);
                Ok(())
            })
        };

        let _root = Root::mount(provider.child(reader)).unwrap();
        let stores = resolved.borrow().clone().unwrap();
        assert_eq!(*stores.get::<String>("name").unwrap(), "anonymous");
        assert_eq!(*stores.get::<u8>("level").unwrap(), 9);
        assert_eq!(stores.len(), 2);
    }

    #[test]
    fn test_lookup_errors() {
        let stores = Stores::default();
        assert!(matches!(
            stores.get::<u8>("missing"),
            Err(StoreError::UnknownStore(name)) if name == "missing"
        ));

        let mut values: BTreeMap<String, Rc<dyn Any>> = BTreeMap::new();
        values.insert("count".into(), Rc::new(3u32));
        let stores = Stores {
            values: Rc::new(values),
        };
        assert!(matches!(
            stores.get::<String>("count"),
            Err(StoreError::StoreTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let a = Context::new(1);
        let b = Context::new(2);
        let mut contexts = Contexts::new().with("x", &a);
        contexts.insert("x", &b);
        assert_eq!(contexts.len(), 1);
    }
}
