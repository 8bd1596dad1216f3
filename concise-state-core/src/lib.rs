//! Core types for concise-state
//!
//! This crate provides context-scoped state stores: a piece of state plus
//! the named actions that change it, published to a component subtree by a
//! provider.
//!
//! # Core Concepts
//!
//! - **Store context**: created by [`create_store_context`]; readable anywhere,
//!   live only beneath a mounted [`StoreProvider`]
//! - **Actions**: produced by an [`ActionFactory`] from a [`ContextReference`]
//!   (state snapshot, setter, injected stores, metadata)
//! - **Injected stores**: other contexts resolved on every render and exposed
//!   through [`Stores`]
//! - **Middleware**: an ordered pipeline wrapping every action call
//!
//! # Basic Example
//!
//! ```
//! use concise_state_core::host::{Element, Root};
//! use concise_state_core::{
//!     args, create_store_context, ActionFactory, Actions, ContextReference, StoreOptions,
//! };
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! let (context, provider) = create_store_context(
//!     Counter { count: 0 },
//!     Some(ActionFactory::new(|reference: &ContextReference<Counter>| {
//!         let set_state = reference.set_state.clone();
//!         Actions::builder()
//!             .action("increment", move |_, _| {
//!                 set_state.update(|c: &Counter| Counter { count: c.count + 1 })?;
//!                 Ok(())
//!             })
//!             .build()
//!     })),
//!     StoreOptions::default(),
//! );
//!
//! let latest = Rc::new(RefCell::new(None));
//! let consumer = {
//!     let latest = latest.clone();
//!     Element::consumer(move |cx| {
//!         *latest.borrow_mut() = Some(cx.use_context(&context));
//!         Ok(())
//!     })
//! };
//! let mut root = Root::mount(provider.wrap([consumer])).unwrap();
//!
//! let store = latest.borrow().clone().unwrap();
//! store.call("increment", args![]).unwrap();
//! root.flush().unwrap();
//! assert_eq!(latest.borrow().as_ref().unwrap().count, 1);
//! ```
//!
//! # Async Actions
//!
//! Actions may return a pending [`Outcome`]; callers await it with
//! [`Outcome::resolve`]. Middleware sees the outcome as well and can wrap it
//! with [`Outcome::then`] to inspect the value once it settles.
//!
//! ```ignore
//! let actions = Actions::builder()
//!     .action_async("load", move |_, args| {
//!         let set_state = set_state.clone();
//!         async move {
//!             let id: u64 = args.get(0)?;
//!             let item = fetch(id).await?;
//!             set_state.set(Loaded(item))?;
//!             Ok(id)
//!         }
//!     })
//!     .build();
//!
//! let id: u64 = store.call("load", args![7])?.resolve_as().await?;
//! ```

pub mod action;
pub mod error;
pub mod host;
pub mod logger;
pub mod mapping;
pub mod middleware;
pub mod outcome;
pub mod reference;
pub mod resolver;
pub mod store;
pub mod testing;
pub mod value;

use std::fmt::Debug;

/// Requirements on a store's state type.
///
/// State is cloned to seed each provider, compared to skip no-op updates,
/// and formatted in diagnostics.
pub trait State: Clone + PartialEq + Debug + 'static {}

impl<T: Clone + PartialEq + Debug + 'static> State for T {}

// Core exports
pub use action::{ActionFactory, ActionFn, Actions, ActionsBuilder};
pub use error::{NoProviderError, StoreError};
pub use outcome::{Outcome, PendingValue};
pub use reference::{ContextReference, SetState};
pub use value::{decode, Args, Meta};

// Store exports
pub use mapping::{map_default, map_dispatch, ActionTable, BoundAction};
pub use resolver::{resolve_stores, Contexts, Stores};
pub use store::{create_store_context, Store, StoreContext, StoreOptions, StoreProvider};

// Middleware exports
pub use logger::{
    ActionLog, ActionLogConfig, ActionLogEntry, ActionLoggerConfig, ActionLoggerMiddleware,
};
pub use middleware::{
    create_middleware, resolve_middleware, run_with_middleware, Middleware, MiddlewareCreator,
    MiddlewareEntry, MiddlewareMeta, Next,
};

// Testing exports
pub use testing::{CallRecorder, RecordedCall, StoreHarness};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{ActionFactory, Actions};
    pub use crate::args;
    pub use crate::error::{NoProviderError, StoreError};
    pub use crate::host::{Component, Context, Element, RenderCx, Root};
    pub use crate::middleware::{create_middleware, Middleware, MiddlewareMeta, Next};
    pub use crate::outcome::Outcome;
    pub use crate::reference::ContextReference;
    pub use crate::resolver::{Contexts, Stores};
    pub use crate::store::{create_store_context, Store, StoreContext, StoreOptions, StoreProvider};
    pub use crate::value::{Args, Meta};
    pub use crate::State;
}
