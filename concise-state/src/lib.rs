//! concise-state: context-scoped stores with actions and middleware
//!
//! A store is a piece of state plus the named actions that change it. It is
//! published to a subtree by a provider; everything below reads the same live
//! state, and actions may read other stores injected by name.
//!
//! # Example
//! ```ignore
//! use concise_state::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Todos {
//!     items: Vec<String>,
//! }
//!
//! let (todos, todos_provider) = create_store_context(
//!     Todos::default(),
//!     Some(ActionFactory::new(|r: &ContextReference<Todos>| {
//!         let set_state = r.set_state.clone();
//!         Actions::builder()
//!             .action("add", move |_, args| {
//!                 let text: String = args.get(0)?;
//!                 set_state.update(move |t| {
//!                     let mut items = t.items.clone();
//!                     items.push(text);
//!                     Todos { items }
//!                 })?;
//!                 Ok(())
//!             })
//!             .build()
//!     })),
//!     StoreOptions::new().middleware(ActionLoggerMiddleware::log_all()),
//! );
//! ```

// Re-export everything from core
pub use concise_state_core::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use concise_state_core::prelude::*;

    // Logging
    pub use concise_state_core::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};

    // Testing
    pub use concise_state_core::{assert_called, assert_not_called, count_called};
    pub use concise_state_core::{CallRecorder, StoreHarness};
}
