//! Minimal component host
//!
//! Stores are framework-agnostic in spirit, but they need four capabilities
//! from whatever renders them:
//!
//! - create a shareable cell seeded with a default value ([`Context::new`])
//! - read a cell and subscribe the current render to it ([`RenderCx::use_context`])
//! - allocate a render-persistent state cell with a setter ([`RenderCx::use_state`])
//! - render a component's children unchanged beneath it ([`Element`])
//!
//! This module provides exactly those. The tree is static once mounted;
//! every committed state change re-renders the whole tree, so any reader of
//! a changed context re-runs.
//!
//! ```ignore
//! use concise_state_core::host::{Element, Root};
//!
//! let tree = provider.element().child(Element::consumer(move |cx| {
//!     let store = cx.use_context(&context);
//!     println!("{:?}", store.state());
//!     Ok(())
//! }));
//! let mut root = Root::mount(tree)?;
//! root.flush()?;
//! ```

mod context;
mod element;
mod root;
mod state;

pub use context::{Context, ContextId};
pub use element::{Component, Element, RenderCx};
pub use root::{HostConfig, Root};
pub use state::{SetStateAction, StateSetter};
