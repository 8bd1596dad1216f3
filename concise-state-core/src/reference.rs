//! The per-render bundle handed to action factories

use std::fmt;
use std::rc::Rc;

use crate::error::NoProviderError;
use crate::host::{SetStateAction, StateSetter};
use crate::resolver::Stores;
use crate::value::Meta;
use crate::State;

/// What an action factory sees when it builds a store's actions.
///
/// `state` is the snapshot taken when the reference was created. Calling
/// `set_state` schedules an update; it does not change `state`, so an action
/// that sets state and then reads `state` still sees the old value.
pub struct ContextReference<S> {
    pub state: Rc<S>,
    pub set_state: SetState<S>,
    pub stores: Stores,
    pub meta: Rc<Meta>,
}

impl<S> Clone for ContextReference<S> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            set_state: self.set_state.clone(),
            stores: self.stores.clone(),
            meta: Rc::clone(&self.meta),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ContextReference<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextReference")
            .field("state", &self.state)
            .field("set_state", &self.set_state)
            .field("stores", &self.stores)
            .field("meta", &self.meta)
            .finish()
    }
}

/// State setter handed to actions.
///
/// Live setters belong to a mounted provider and always succeed. Detached
/// setters back the default store and fail with
/// [`NoProviderError::SetState`].
pub struct SetState<S> {
    live: Option<StateSetter<S>>,
}

impl<S: State> SetState<S> {
    pub(crate) fn live(setter: StateSetter<S>) -> Self {
        Self { live: Some(setter) }
    }

    pub(crate) fn detached() -> Self {
        Self { live: None }
    }

    /// Schedule replacement of the state.
    pub fn set(&self, value: S) -> Result<(), NoProviderError> {
        self.dispatch(SetStateAction::Replace(value))
    }

    /// Schedule a transition computed from the previous state.
    ///
    /// Several updates scheduled before the next render are applied left to
    /// right, each seeing the result of the one before.
    pub fn update(&self, f: impl FnOnce(&S) -> S + 'static) -> Result<(), NoProviderError> {
        self.dispatch(SetStateAction::Update(Box::new(f)))
    }

    pub fn dispatch(&self, action: SetStateAction<S>) -> Result<(), NoProviderError> {
        let Some(setter) = &self.live else {
            let attempted = match &action {
                SetStateAction::Replace(value) => format!("{value:?}"),
                SetStateAction::Update(_) => "an update function".to_string(),
            };
            tracing::debug!(%attempted, "set_state without a provider");
            return Err(NoProviderError::SetState { attempted });
        };
        setter.dispatch(action);
        Ok(())
    }

    /// Whether this setter belongs to a mounted provider
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }
}

impl<S> Clone for SetState<S> {
    fn clone(&self) -> Self {
        Self {
            live: self.live.clone(),
        }
    }
}

impl<S> fmt::Debug for SetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("live", &self.live.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        count: i32,
    }

    #[test]
    fn test_detached_set_names_value() {
        let set_state = SetState::<Counter>::detached();
        let err = set_state.set(Counter { count: 3 }).unwrap_err();
        assert_eq!(
            err,
            NoProviderError::SetState {
                attempted: "Counter { count: 3 }".into()
            }
        );
        assert!(!set_state.is_live());
    }

    #[test]
    fn test_detached_update_fails() {
        let set_state = SetState::<Counter>::detached();
        let err = set_state
            .update(|c| Counter { count: c.count + 1 })
            .unwrap_err();
        assert!(err.to_string().contains("an update function"));
    }
}
